//! Component extractors: YEAR/MONTH/DAY, HOUR/MINUTE/SECOND, and the
//! week-numbering family.

use chrono::Datelike;
use sheetcalc_common::{ErrorKind, Value};

use super::date_arg;
use crate::builtins::utils::{ok_num, opt_int_arg};
use crate::coercion::to_date_serial_clamped;
use crate::context::CellContext;
use crate::function::{FnCaps, FunctionDef};
use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("YEAR", 1, Some(1), FnCaps::PURE, year),
        FunctionDef::new("MONTH", 1, Some(1), FnCaps::PURE, month),
        FunctionDef::new("DAY", 1, Some(1), FnCaps::PURE, day),
        FunctionDef::new("HOUR", 1, Some(1), FnCaps::PURE, hour),
        FunctionDef::new("MINUTE", 1, Some(1), FnCaps::PURE, minute),
        FunctionDef::new("SECOND", 1, Some(1), FnCaps::PURE, second),
        FunctionDef::new("WEEKDAY", 1, Some(2), FnCaps::PURE, weekday),
        FunctionDef::new("WEEKNUM", 1, Some(2), FnCaps::PURE, weeknum),
        FunctionDef::new("ISOWEEKNUM", 1, Some(1), FnCaps::PURE, isoweeknum),
    ] {
        reg.insert(def);
    }
}

fn year(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(date_arg(&args[0])?.year() as f64)
}

fn month(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(date_arg(&args[0])?.month() as f64)
}

fn day(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(date_arg(&args[0])?.day() as f64)
}

fn clock_seconds(v: &Value) -> Result<i64, ErrorKind> {
    let serial = to_date_serial_clamped(v)?;
    // Rounding up to exactly midnight stays within the same day.
    Ok(((serial.fract() * 86_400.0).round() as i64).min(86_399))
}

fn hour(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num((clock_seconds(&args[0])? / 3600) as f64)
}

fn minute(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num((clock_seconds(&args[0])? / 60 % 60) as f64)
}

fn second(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num((clock_seconds(&args[0])? % 60) as f64)
}

/// Monday-based day index 0..6 used by the return-type tables.
fn monday0(date: chrono::NaiveDate) -> u32 {
    date.weekday().num_days_from_monday()
}

fn weekday(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let date = date_arg(&args[0])?;
    let kind = opt_int_arg(args, 1, 1)?;
    let m0 = monday0(date);
    let out = match kind {
        1 => (m0 + 1) % 7 + 1, // 1 = Sunday
        2 => m0 + 1,           // 1 = Monday
        3 => m0,               // 0 = Monday
        11..=17 => {
            // 11 starts Monday, 12 Tuesday, … 17 Sunday.
            let start = (kind - 11) as u32;
            (m0 + 7 - start) % 7 + 1
        }
        _ => return Err(ErrorKind::Num),
    };
    ok_num(out as f64)
}

fn weeknum(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let date = date_arg(&args[0])?;
    let kind = opt_int_arg(args, 1, 1)?;
    if kind == 21 {
        return ok_num(date.iso_week().week() as f64);
    }
    // Week 1 contains January 1; `start` is the weekday the week begins on.
    let start = match kind {
        1 => 6u32, // Sunday, as Monday-based index
        2 | 11 => 0,
        12..=16 => (kind - 11) as u32,
        17 => 6,
        _ => return Err(ErrorKind::Num),
    };
    let jan1 = chrono::NaiveDate::from_ymd_opt(date.year(), 1, 1).ok_or(ErrorKind::Num)?;
    let offset = (monday0(jan1) + 7 - start) % 7;
    let doy = date.ordinal0() as i64;
    ok_num(((doy + offset as i64) / 7 + 1) as f64)
}

fn isoweeknum(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(date_arg(&args[0])?.iso_week().week() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::invoke;
    use crate::test_grid::TestGrid;
    use chrono::NaiveDate;
    use sheetcalc_common::date_to_serial;

    fn n(x: f64) -> Value {
        Value::Number(x)
    }

    fn serial_of(y: i32, m: u32, d: u32) -> f64 {
        date_to_serial(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn extracts_components() {
        let g = TestGrid::new();
        let s = serial_of(2024, 3, 15) + 0.75; // 18:00
        assert_eq!(invoke("YEAR", &g, &[n(s)]), n(2024.0));
        assert_eq!(invoke("MONTH", &g, &[n(s)]), n(3.0));
        assert_eq!(invoke("DAY", &g, &[n(s)]), n(15.0));
        assert_eq!(invoke("HOUR", &g, &[n(s)]), n(18.0));
        assert_eq!(invoke("MINUTE", &g, &[n(s)]), n(0.0));
        assert_eq!(invoke("SECOND", &g, &[n(s)]), n(0.0));
        assert_eq!(
            invoke("YEAR", &g, &[Value::Boolean(true)]),
            Value::Error(ErrorKind::Value)
        );
    }

    #[test]
    fn weekday_types() {
        let g = TestGrid::new();
        // 2024-03-15 is a Friday.
        let s = serial_of(2024, 3, 15);
        assert_eq!(invoke("WEEKDAY", &g, &[n(s)]), n(6.0));
        assert_eq!(invoke("WEEKDAY", &g, &[n(s), n(2.0)]), n(5.0));
        assert_eq!(invoke("WEEKDAY", &g, &[n(s), n(3.0)]), n(4.0));
        assert_eq!(invoke("WEEKDAY", &g, &[n(s), n(11.0)]), n(5.0));
        assert_eq!(invoke("WEEKDAY", &g, &[n(s), n(16.0)]), n(7.0)); // week starts Saturday
        assert_eq!(
            invoke("WEEKDAY", &g, &[n(s), n(4.0)]),
            Value::Error(ErrorKind::Num)
        );
    }

    #[test]
    fn week_numbers() {
        let g = TestGrid::new();
        // 2024-01-01 is a Monday.
        assert_eq!(invoke("WEEKNUM", &g, &[n(serial_of(2024, 1, 1))]), n(1.0));
        assert_eq!(invoke("WEEKNUM", &g, &[n(serial_of(2024, 1, 7))]), n(2.0));
        assert_eq!(
            invoke("WEEKNUM", &g, &[n(serial_of(2024, 1, 7)), n(2.0)]),
            n(1.0)
        );
        assert_eq!(invoke("ISOWEEKNUM", &g, &[n(serial_of(2024, 1, 1))]), n(1.0));
        assert_eq!(invoke("ISOWEEKNUM", &g, &[n(serial_of(2023, 1, 1))]), n(52.0));
    }
}
