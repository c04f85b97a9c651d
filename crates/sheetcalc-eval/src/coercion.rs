//! Uniform conversions between value variants, per the Excel contract.
//!
//! Every builtin funnels through these helpers so the coercion rules live
//! in one place: lenient numeric coercion (text parsed in the invariant
//! locale), text/boolean conversions, the date-serial reading of a value,
//! and the NaN/∞ → `#NUM!` normalization applied to numeric results.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use sheetcalc_common::{ErrorKind, Value, date_to_serial, datetime_to_serial};

/// Number → identity; Boolean → 1/0; Empty → 0; Text → invariant parse
/// (`#VALUE!` on failure); Error → propagate.
pub fn to_number_lenient(v: &Value) -> Result<f64, ErrorKind> {
    v.as_number_coerced()
}

/// Numbers only; anything else is `#VALUE!`.
pub fn to_number_strict(v: &Value) -> Result<f64, ErrorKind> {
    match v {
        Value::Number(n) => Ok(*n),
        Value::Error(e) => Err(*e),
        _ => Err(ErrorKind::Value),
    }
}

/// Lenient coercion followed by truncation toward zero (Excel's integer
/// argument convention).
pub fn to_integer(v: &Value) -> Result<i64, ErrorKind> {
    let n = to_number_lenient(v)?;
    if !n.is_finite() || n.abs() >= 9.0e18 {
        return Err(ErrorKind::Num);
    }
    Ok(n.trunc() as i64)
}

pub fn to_text(v: &Value) -> Result<String, ErrorKind> {
    v.as_text()
}

pub fn to_boolean_lenient(v: &Value) -> Result<bool, ErrorKind> {
    v.as_boolean_coerced()
}

/// NaN and ±∞ intermediates surface as `#NUM!`, never as a finite lie.
pub fn sanitize_numeric(n: f64) -> Result<f64, ErrorKind> {
    if n.is_finite() { Ok(n) } else { Err(ErrorKind::Num) }
}

/// Read a value as a date serial: numbers pass through, text is parsed
/// (ISO-8601, invariant slash/hyphen dates, `h:mm[:ss] [AM/PM]` times),
/// booleans are `#VALUE!`.
pub fn to_date_serial(v: &Value) -> Result<f64, ErrorKind> {
    match v {
        Value::Number(n) => Ok(*n),
        Value::Empty => Ok(0.0),
        Value::Text(s) => parse_datetime_text(s).ok_or(ErrorKind::Value),
        Value::Boolean(_) => Err(ErrorKind::Value),
        Value::Error(e) => Err(*e),
    }
}

/// Serial for a date argument that must land on a real calendar day.
pub fn to_date_serial_clamped(v: &Value) -> Result<f64, ErrorKind> {
    let s = to_date_serial(v)?;
    if !(0.0..=sheetcalc_common::SERIAL_MAX).contains(&s) {
        return Err(ErrorKind::Num);
    }
    Ok(s)
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d-%b-%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M:%S %p", "%I:%M %p", "%I %p"];

/// Invariant-locale date/time text → serial. Pure times yield the day
/// fraction alone.
pub fn parse_datetime_text(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(datetime_to_serial(&dt));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(t, fmt) {
            return Some(date_to_serial(d));
        }
    }
    let upper = t.to_ascii_uppercase();
    for fmt in TIME_FORMATS {
        if let Ok(tm) = NaiveTime::parse_from_str(&upper, fmt) {
            return Some(tm.num_seconds_from_midnight() as f64 / 86_400.0);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_text_forms() {
        let iso = parse_datetime_text("2024-03-15").unwrap();
        assert_eq!(iso, parse_datetime_text("3/15/2024").unwrap());
        assert_eq!(iso, parse_datetime_text(" 2024/03/15 ").unwrap());

        let with_time = parse_datetime_text("2024-03-15T06:00:00").unwrap();
        assert!((with_time - (iso + 0.25)).abs() < 1e-9);

        let noon = parse_datetime_text("12:00").unwrap();
        assert!((noon - 0.5).abs() < 1e-9);
        let pm = parse_datetime_text("3:30 PM").unwrap();
        assert!((pm - (15.5 / 24.0)).abs() < 1e-9);

        assert_eq!(parse_datetime_text("not a date"), None);
    }

    #[test]
    fn date_serial_coercions() {
        assert_eq!(to_date_serial(&Value::Number(45000.0)), Ok(45000.0));
        assert_eq!(to_date_serial(&Value::Boolean(true)), Err(ErrorKind::Value));
        assert_eq!(to_date_serial(&Value::text("junk")), Err(ErrorKind::Value));
        assert_eq!(
            to_date_serial(&Value::Error(ErrorKind::Div)),
            Err(ErrorKind::Div)
        );
    }

    #[test]
    fn sanitize() {
        assert_eq!(sanitize_numeric(1.5), Ok(1.5));
        assert_eq!(sanitize_numeric(f64::NAN), Err(ErrorKind::Num));
        assert_eq!(sanitize_numeric(f64::INFINITY), Err(ErrorKind::Num));
    }
}
