//! Date and time builtins over the serial-date model (days since
//! 1899-12-30, fractional day = time of day).

pub mod construct;
pub mod parts;
pub mod spans;
pub mod workdays;

use chrono::{Datelike, NaiveDate};
use sheetcalc_common::{ErrorKind, Value, serial_to_date};

use crate::coercion::to_date_serial_clamped;
use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    construct::register_builtins(reg);
    parts::register_builtins(reg);
    spans::register_builtins(reg);
    workdays::register_builtins(reg);
}

/// Read an argument as a calendar date (whole-day part of its serial).
pub(crate) fn date_arg(v: &Value) -> Result<NaiveDate, ErrorKind> {
    let serial = to_date_serial_clamped(v)?;
    serial_to_date(serial).ok_or(ErrorKind::Num)
}

pub(crate) fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub(crate) fn days_in_year(year: i32) -> f64 {
    if is_leap_year(year) { 366.0 } else { 365.0 }
}

pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

/// Shift a date by whole months, clamping the day to the target month's
/// length (the EDATE rule).
pub(crate) fn add_months(date: NaiveDate, months: i64) -> Result<NaiveDate, ErrorKind> {
    let total = date.year() as i64 * 12 + date.month0() as i64 + months;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    let year = i32::try_from(year).map_err(|_| ErrorKind::Num)?;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).ok_or(ErrorKind::Num)
}
