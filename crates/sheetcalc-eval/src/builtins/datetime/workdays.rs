//! WORKDAY and NETWORKDAYS with the .INTL weekend grammar: a code 1..17
//! or a 7-character 0/1 mask starting Monday.

use chrono::{Datelike, Duration, NaiveDate};
use sheetcalc_common::{ErrorKind, Value, date_to_serial};

use super::date_arg;
use crate::builtins::utils::{int_arg, ok_num};
use crate::context::CellContext;
use crate::function::{FnCaps, FunctionDef};
use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("WORKDAY", 2, None, FnCaps::PURE, workday),
        FunctionDef::new("WORKDAY.INTL", 2, None, FnCaps::PURE, workday_intl),
        FunctionDef::new("NETWORKDAYS", 2, None, FnCaps::PURE, networkdays),
        FunctionDef::new("NETWORKDAYS.INTL", 2, None, FnCaps::PURE, networkdays_intl),
    ] {
        reg.insert(def);
    }
}

/// Weekend mask indexed by Monday-based weekday; true = non-working.
fn weekend_from_code(code: i64) -> Result<[bool; 7], ErrorKind> {
    let mut mask = [false; 7];
    match code {
        1..=7 => {
            // 1 = Sat+Sun, 2 = Sun+Mon, … 7 = Fri+Sat.
            let first = (code as usize + 4) % 7;
            mask[first] = true;
            mask[(first + 1) % 7] = true;
        }
        11..=17 => {
            // Single-day weekends, 11 = Sunday … 17 = Saturday.
            mask[(code as usize - 5) % 7] = true;
        }
        _ => return Err(ErrorKind::Num),
    }
    Ok(mask)
}

fn weekend_from_mask(s: &str) -> Result<[bool; 7], ErrorKind> {
    if s.chars().count() != 7 || !s.chars().all(|c| c == '0' || c == '1') {
        return Err(ErrorKind::Value);
    }
    let mut mask = [false; 7];
    for (i, c) in s.chars().enumerate() {
        mask[i] = c == '1';
    }
    if mask.iter().all(|&w| w) {
        return Err(ErrorKind::Value);
    }
    Ok(mask)
}

fn weekend_arg(v: Option<&Value>) -> Result<[bool; 7], ErrorKind> {
    match v {
        None | Some(Value::Empty) => weekend_from_code(1),
        Some(Value::Text(s)) => weekend_from_mask(s),
        Some(Value::Number(n)) => weekend_from_code(n.trunc() as i64),
        Some(Value::Boolean(_)) => Err(ErrorKind::Value),
        Some(Value::Error(e)) => Err(*e),
    }
}

fn holidays_of(args: &[Value]) -> Result<Vec<NaiveDate>, ErrorKind> {
    let mut out = Vec::with_capacity(args.len());
    for v in args {
        if v.is_empty() {
            continue;
        }
        out.push(date_arg(v)?);
    }
    Ok(out)
}

fn is_working(date: NaiveDate, weekend: &[bool; 7], holidays: &[NaiveDate]) -> bool {
    !weekend[date.weekday().num_days_from_monday() as usize] && !holidays.contains(&date)
}

fn workday_core(
    start: NaiveDate,
    days: i64,
    weekend: [bool; 7],
    holidays: &[NaiveDate],
) -> Result<Value, ErrorKind> {
    // The serial range is under 3M days; anything bigger walks off it.
    if days.abs() > 5_000_000 {
        return Err(ErrorKind::Num);
    }
    let step = if days < 0 { -1 } else { 1 };
    let mut remaining = days.abs();
    let mut date = start;
    while remaining > 0 {
        date = date
            .checked_add_signed(Duration::days(step))
            .ok_or(ErrorKind::Num)?;
        if is_working(date, &weekend, holidays) {
            remaining -= 1;
        }
    }
    let serial = date_to_serial(date);
    if serial < 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(serial)
}

fn networkdays_core(
    start: NaiveDate,
    end: NaiveDate,
    weekend: [bool; 7],
    holidays: &[NaiveDate],
) -> Result<Value, ErrorKind> {
    let (lo, hi, sign) = if start <= end { (start, end, 1.0) } else { (end, start, -1.0) };
    let mut count = 0i64;
    let mut date = lo;
    while date <= hi {
        if is_working(date, &weekend, holidays) {
            count += 1;
        }
        date += Duration::days(1);
    }
    ok_num(sign * count as f64)
}

fn workday(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let start = date_arg(&args[0])?;
    let days = int_arg(args, 1)?;
    let holidays = holidays_of(&args[2..])?;
    workday_core(start, days, weekend_from_code(1)?, &holidays)
}

fn workday_intl(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let start = date_arg(&args[0])?;
    let days = int_arg(args, 1)?;
    let weekend = weekend_arg(args.get(2))?;
    let holidays = holidays_of(args.get(3..).unwrap_or(&[]))?;
    workday_core(start, days, weekend, &holidays)
}

fn networkdays(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let start = date_arg(&args[0])?;
    let end = date_arg(&args[1])?;
    let holidays = holidays_of(&args[2..])?;
    networkdays_core(start, end, weekend_from_code(1)?, &holidays)
}

fn networkdays_intl(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let start = date_arg(&args[0])?;
    let end = date_arg(&args[1])?;
    let weekend = weekend_arg(args.get(2))?;
    let holidays = holidays_of(args.get(3..).unwrap_or(&[]))?;
    networkdays_core(start, end, weekend, &holidays)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::invoke;
    use crate::test_grid::TestGrid;

    fn n(x: f64) -> Value {
        Value::Number(x)
    }

    fn s(y: i32, m: u32, d: u32) -> Value {
        Value::Number(date_to_serial(NaiveDate::from_ymd_opt(y, m, d).unwrap()))
    }

    #[test]
    fn weekend_codes() {
        // Code 1 is Saturday+Sunday.
        assert_eq!(
            weekend_from_code(1).unwrap(),
            [false, false, false, false, false, true, true]
        );
        // Code 2 is Sunday+Monday.
        assert_eq!(
            weekend_from_code(2).unwrap(),
            [true, false, false, false, false, false, true]
        );
        // Code 11 is Sunday only, 17 Saturday only.
        assert_eq!(
            weekend_from_code(11).unwrap(),
            [false, false, false, false, false, false, true]
        );
        assert_eq!(
            weekend_from_code(17).unwrap(),
            [false, false, false, false, false, true, false]
        );
        assert_eq!(weekend_from_code(8).unwrap_err(), ErrorKind::Num);
        assert_eq!(weekend_from_code(0).unwrap_err(), ErrorKind::Num);
    }

    #[test]
    fn weekend_masks() {
        assert_eq!(
            weekend_from_mask("0000011").unwrap(),
            weekend_from_code(1).unwrap()
        );
        assert_eq!(weekend_from_mask("000001").unwrap_err(), ErrorKind::Value);
        assert_eq!(weekend_from_mask("00000x1").unwrap_err(), ErrorKind::Value);
        assert_eq!(weekend_from_mask("1111111").unwrap_err(), ErrorKind::Value);
    }

    #[test]
    fn workday_skips_weekends_and_holidays() {
        let g = TestGrid::new();
        // Friday 2024-03-15 + 1 workday = Monday 2024-03-18.
        assert_eq!(
            invoke("WORKDAY", &g, &[s(2024, 3, 15), n(1.0)]),
            s(2024, 3, 18)
        );
        // With the Monday a holiday, Tuesday.
        assert_eq!(
            invoke("WORKDAY", &g, &[s(2024, 3, 15), n(1.0), s(2024, 3, 18)]),
            s(2024, 3, 19)
        );
        // Negative direction.
        assert_eq!(
            invoke("WORKDAY", &g, &[s(2024, 3, 18), n(-1.0)]),
            s(2024, 3, 15)
        );
        // Sunday-only weekends via mask: Saturday counts.
        assert_eq!(
            invoke(
                "WORKDAY.INTL",
                &g,
                &[s(2024, 3, 15), n(1.0), Value::text("0000001")]
            ),
            s(2024, 3, 16)
        );
        assert_eq!(
            invoke("WORKDAY.INTL", &g, &[s(2024, 3, 15), n(1.0), n(8.0)]),
            Value::Error(ErrorKind::Num)
        );
        assert_eq!(
            invoke(
                "WORKDAY.INTL",
                &g,
                &[s(2024, 3, 15), n(1.0), Value::text("11")]
            ),
            Value::Error(ErrorKind::Value)
        );
    }

    #[test]
    fn networkdays_counts_inclusive() {
        let g = TestGrid::new();
        // Mon 2024-03-11 .. Fri 2024-03-15 = 5 working days.
        assert_eq!(
            invoke("NETWORKDAYS", &g, &[s(2024, 3, 11), s(2024, 3, 15)]),
            n(5.0)
        );
        // Spanning a weekend.
        assert_eq!(
            invoke("NETWORKDAYS", &g, &[s(2024, 3, 11), s(2024, 3, 18)]),
            n(6.0)
        );
        // Reversed order is negative.
        assert_eq!(
            invoke("NETWORKDAYS", &g, &[s(2024, 3, 15), s(2024, 3, 11)]),
            n(-5.0)
        );
        // Holiday removal.
        assert_eq!(
            invoke(
                "NETWORKDAYS",
                &g,
                &[s(2024, 3, 11), s(2024, 3, 15), s(2024, 3, 13)]
            ),
            n(4.0)
        );
    }
}
