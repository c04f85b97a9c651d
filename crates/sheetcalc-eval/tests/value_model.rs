//! The uniform value surface: coercion matrix, error strings, and the
//! dispatch contract observed from outside.

use sheetcalc_common::{ErrorKind, Value};
use sheetcalc_eval::registry::invoke;
use sheetcalc_eval::test_grid::TestGrid;

fn n(x: f64) -> Value {
    Value::Number(x)
}

fn t(s: &str) -> Value {
    Value::text(s)
}

#[test]
fn error_strings_render_exactly() {
    let expected = [
        (ErrorKind::Null, "#NULL!"),
        (ErrorKind::Div, "#DIV/0!"),
        (ErrorKind::Value, "#VALUE!"),
        (ErrorKind::Ref, "#REF!"),
        (ErrorKind::Name, "#NAME?"),
        (ErrorKind::Num, "#NUM!"),
        (ErrorKind::Na, "#N/A"),
        (ErrorKind::Calc, "#CALC!"),
    ];
    for (kind, s) in expected {
        assert_eq!(Value::Error(kind).to_string(), s);
    }
}

#[test]
fn numeric_coercion_through_functions() {
    let g = TestGrid::new();
    // Booleans fold as 1/0, numeric text parses, empty is 0.
    assert_eq!(
        invoke("SUM", &g, &[Value::Boolean(true), t("2.5"), Value::Empty]),
        n(3.5)
    );
    assert_eq!(
        invoke("SUM", &g, &[t("not a number")]),
        Value::Error(ErrorKind::Value)
    );
}

#[test]
fn text_coercion_strips_trailing_zeros() {
    let g = TestGrid::new();
    assert_eq!(invoke("CONCAT", &g, &[n(3.0)]), t("3"));
    assert_eq!(invoke("CONCAT", &g, &[n(0.25)]), t("0.25"));
    assert_eq!(invoke("CONCAT", &g, &[Value::Boolean(true)]), t("TRUE"));
    assert_eq!(invoke("CONCAT", &g, &[Value::Empty]), t(""));
}

#[test]
fn boolean_coercion_rules() {
    let g = TestGrid::new();
    assert_eq!(invoke("NOT", &g, &[t("TRUE")]), Value::Boolean(false));
    assert_eq!(invoke("NOT", &g, &[n(0.0)]), Value::Boolean(true));
    assert_eq!(invoke("NOT", &g, &[Value::Empty]), Value::Boolean(true));
    assert_eq!(
        invoke("NOT", &g, &[t("yes")]),
        Value::Error(ErrorKind::Value)
    );
}

#[test]
fn arity_violations_are_value_errors() {
    let g = TestGrid::new();
    assert_eq!(invoke("ABS", &g, &[]), Value::Error(ErrorKind::Value));
    assert_eq!(
        invoke("ABS", &g, &[n(1.0), n(2.0)]),
        Value::Error(ErrorKind::Value)
    );
    assert_eq!(
        invoke("MOD", &g, &[n(1.0)]),
        Value::Error(ErrorKind::Value)
    );
}

#[test]
fn error_scan_runs_before_the_handler() {
    let g = TestGrid::new();
    // ABS would reject text, but the positional scan fires first.
    assert_eq!(
        invoke("ABS", &g, &[Value::Error(ErrorKind::Ref)]),
        Value::Error(ErrorKind::Ref)
    );
    // Error-aware functions receive the error value itself.
    assert_eq!(
        invoke("TYPE", &g, &[Value::Error(ErrorKind::Ref)]),
        n(16.0)
    );
}
