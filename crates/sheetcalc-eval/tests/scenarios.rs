//! End-to-end scenarios over the public registry surface: grid-backed
//! reference reads, aggregation codes, date math, modern text, and the
//! logical dispatch family.

use sheetcalc_common::{ErrorKind, Value, date_to_serial};
use sheetcalc_eval::registry::invoke;
use sheetcalc_eval::test_grid::TestGrid;

fn n(x: f64) -> Value {
    Value::Number(x)
}

fn t(s: &str) -> Value {
    Value::text(s)
}

fn date(y: i32, m: u32, d: u32) -> Value {
    Value::Number(date_to_serial(
        chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap(),
    ))
}

fn num_of(v: Value) -> f64 {
    match v {
        Value::Number(x) => x,
        other => panic!("expected number, got {other:?}"),
    }
}

#[test]
fn offset_reads_through_the_grid() {
    let mut g = TestGrid::new();
    g.set_a1("D3", n(43.0));
    assert_eq!(invoke("OFFSET", &g, &[t("A1"), n(2.0), n(3.0)]), n(43.0));
}

#[test]
fn offset_past_the_sheet_is_ref() {
    let g = TestGrid::new();
    assert_eq!(
        invoke("OFFSET", &g, &[t("A1"), n(1_048_576.0), n(0.0)]),
        Value::Error(ErrorKind::Ref)
    );
}

#[test]
fn indirect_relative_r1c1() {
    let mut g = TestGrid::new();
    g.set_a1("B2", n(21.0));
    let g = g.with_current_cell(3, 3);
    assert_eq!(
        invoke("INDIRECT", &g, &[t("R[-1]C[-1]"), Value::Boolean(false)]),
        n(21.0)
    );
}

#[test]
fn subtotal_codes_and_validation() {
    let g = TestGrid::new();
    assert_eq!(
        invoke("SUBTOTAL", &g, &[n(9.0), n(10.0), n(20.0), n(30.0)]),
        n(60.0)
    );
    assert_eq!(
        invoke("SUBTOTAL", &g, &[n(99.0), n(10.0)]),
        Value::Error(ErrorKind::Value)
    );
}

#[test]
fn aggregate_error_filtering_option() {
    let g = TestGrid::new();
    let div = Value::Error(ErrorKind::Div);
    assert_eq!(
        invoke("AGGREGATE", &g, &[n(9.0), n(2.0), n(10.0), div.clone(), n(20.0)]),
        n(30.0)
    );
    assert_eq!(
        invoke("AGGREGATE", &g, &[n(9.0), n(0.0), n(10.0), div, n(20.0)]),
        Value::Error(ErrorKind::Div)
    );
}

#[test]
fn datedif_year_unit_and_direction() {
    let g = TestGrid::new();
    assert_eq!(
        invoke("DATEDIF", &g, &[date(2023, 1, 1), date(2024, 1, 1), t("Y")]),
        n(1.0)
    );
    assert_eq!(
        invoke("DATEDIF", &g, &[date(2024, 1, 1), date(2023, 1, 1), t("Y")]),
        Value::Error(ErrorKind::Num)
    );
}

#[test]
fn yearfrac_nasd_full_year() {
    let g = TestGrid::new();
    let f = num_of(invoke(
        "YEARFRAC",
        &g,
        &[date(2024, 1, 1), date(2024, 12, 31), n(0.0)],
    ));
    assert!((f - 1.0).abs() < 1e-5);
}

#[test]
fn textbefore_and_after_instances() {
    let g = TestGrid::new();
    assert_eq!(
        invoke("TEXTBEFORE", &g, &[t("one-two-three"), t("-"), n(2.0)]),
        t("one-two")
    );
    assert_eq!(
        invoke("TEXTAFTER", &g, &[t("one-two-three"), t("-"), n(2.0)]),
        t("three")
    );
}

#[test]
fn switch_default_and_miss() {
    let g = TestGrid::new();
    assert_eq!(
        invoke(
            "SWITCH",
            &g,
            &[n(5.0), n(1.0), t("One"), n(2.0), t("Two"), t("Other")]
        ),
        t("Other")
    );
    assert_eq!(
        invoke("SWITCH", &g, &[n(5.0), n(1.0), t("One"), n(2.0), t("Two")]),
        Value::Error(ErrorKind::Na)
    );
}

#[test]
fn ifs_with_no_truthy_condition() {
    let g = TestGrid::new();
    assert_eq!(
        invoke(
            "IFS",
            &g,
            &[Value::Boolean(false), t("A"), Value::Boolean(false), t("B")]
        ),
        Value::Error(ErrorKind::Na)
    );
}

#[test]
fn address_with_quoted_sheet() {
    let g = TestGrid::new();
    assert_eq!(
        invoke(
            "ADDRESS",
            &g,
            &[n(2.0), n(3.0), n(1.0), Value::Boolean(true), t("My Sheet")]
        ),
        t("'My Sheet'!$C$2")
    );
}

#[test]
fn factdouble_anchors() {
    let g = TestGrid::new();
    assert_eq!(invoke("FACTDOUBLE", &g, &[n(7.0)]), n(105.0));
    assert_eq!(invoke("FACTDOUBLE", &g, &[n(6.0)]), n(48.0));
}

#[test]
fn registry_surface() {
    use sheetcalc_eval::Registry;
    let reg = Registry::global();
    // Case-insensitive lookup resolves to the same implementation.
    assert_eq!(reg.lookup("SuBtOtAl"), reg.lookup("SUBTOTAL"));
    assert!(reg.lookup("definitely-not-a-function").is_none());
    assert!(reg.len() > 240, "registry holds {} functions", reg.len());

    let id = reg.lookup("sum").unwrap();
    let g = TestGrid::new();
    assert_eq!(reg.get(id).execute(&g, &[n(2.0), n(3.0)]), n(5.0));
}

#[test]
fn volatile_functions_consume_the_context() {
    let g = TestGrid::new().with_now(45_292.5);
    assert_eq!(invoke("TODAY", &g, &[]), n(45_292.0));
    let r = num_of(invoke("RAND", &g, &[]));
    assert!((0.0..1.0).contains(&r));
}
