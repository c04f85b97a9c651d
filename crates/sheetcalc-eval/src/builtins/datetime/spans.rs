//! Date spans: DAYS, DAYS360, EDATE, EOMONTH, YEARFRAC, DATEDIF.
//!
//! The day-count basis engine lives here and is shared with the securities
//! functions: 0 = 30/360 US (NASD), 1 = actual/actual, 2 = actual/360,
//! 3 = actual/365, 4 = 30/360 European.

use chrono::{Datelike, NaiveDate};
use sheetcalc_common::{ErrorKind, Value, date_to_serial};

use super::{add_months, date_arg, days_in_month, days_in_year};
use crate::builtins::utils::{int_arg, ok_num, opt_bool_arg, text_arg};
use crate::coercion::to_date_serial_clamped;
use crate::context::CellContext;
use crate::function::{FnCaps, FunctionDef};
use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("DAYS", 2, Some(2), FnCaps::PURE, days),
        FunctionDef::new("DAYS360", 2, Some(3), FnCaps::PURE, days360_fn),
        FunctionDef::new("EDATE", 2, Some(2), FnCaps::PURE, edate),
        FunctionDef::new("EOMONTH", 2, Some(2), FnCaps::PURE, eomonth),
        FunctionDef::new("YEARFRAC", 2, Some(3), FnCaps::PURE, yearfrac),
        FunctionDef::new("DATEDIF", 3, Some(3), FnCaps::PURE, datedif),
    ] {
        reg.insert(def);
    }
}

fn is_last_of_february(d: NaiveDate) -> bool {
    d.month() == 2 && d.day() == days_in_month(d.year(), 2)
}

/// 30/360 day count. US (NASD) rules unless `european`, which simply
/// clamps both day numbers to 30.
pub(crate) fn days_360(start: NaiveDate, end: NaiveDate, european: bool) -> i64 {
    let (mut d1, mut d2) = (start.day() as i64, end.day() as i64);
    if european {
        d1 = d1.min(30);
        d2 = d2.min(30);
    } else {
        if is_last_of_february(start) && is_last_of_february(end) {
            d2 = 30;
        }
        if is_last_of_february(start) {
            d1 = 30;
        }
        if d2 == 31 && d1 >= 30 {
            d2 = 30;
        }
        if d1 == 31 {
            d1 = 30;
        }
    }
    (end.year() as i64 - start.year() as i64) * 360
        + (end.month() as i64 - start.month() as i64) * 30
        + (d2 - d1)
}

/// Fraction of a year between two dates under the given basis. Callers
/// guarantee start ≤ end.
pub(crate) fn year_frac_dates(
    start: NaiveDate,
    end: NaiveDate,
    basis: i64,
) -> Result<f64, ErrorKind> {
    let actual_days = (end - start).num_days() as f64;
    Ok(match basis {
        0 => days_360(start, end, false) as f64 / 360.0,
        1 => {
            // Average year length across the calendar years touched.
            let (y1, y2) = (start.year(), end.year());
            let denom: f64 =
                (y1..=y2).map(days_in_year).sum::<f64>() / (y2 - y1 + 1) as f64;
            actual_days / denom
        }
        2 => actual_days / 360.0,
        3 => actual_days / 365.0,
        4 => days_360(start, end, true) as f64 / 360.0,
        _ => return Err(ErrorKind::Num),
    })
}

fn days(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let end = to_date_serial_clamped(&args[0])?;
    let start = to_date_serial_clamped(&args[1])?;
    ok_num(end.trunc() - start.trunc())
}

fn days360_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let start = date_arg(&args[0])?;
    let end = date_arg(&args[1])?;
    let european = opt_bool_arg(args, 2, false)?;
    if european {
        return ok_num(days_360(start, end, true) as f64);
    }
    // The US DAYS360 variant differs from the NASD yearfrac rule on
    // month-end handling of the second date.
    let (mut d1, mut d2) = (start.day() as i64, end.day() as i64);
    let mut extra_months = 0i64;
    if is_last_of_february(start) {
        d1 = 30;
    }
    if d1 == 31 {
        d1 = 30;
    }
    if d2 == 31 {
        if d1 < 30 {
            d2 = 1;
            extra_months = 1;
        } else {
            d2 = 30;
        }
    }
    let total = (end.year() as i64 - start.year() as i64) * 360
        + (end.month() as i64 + extra_months - start.month() as i64) * 30
        + (d2 - d1);
    ok_num(total as f64)
}

fn edate(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let start = date_arg(&args[0])?;
    let months = int_arg(args, 1)?;
    let shifted = add_months(start, months)?;
    let serial = date_to_serial(shifted);
    if serial < 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(serial)
}

fn eomonth(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let start = date_arg(&args[0])?;
    let months = int_arg(args, 1)?;
    let shifted = add_months(start, months)?;
    let last = NaiveDate::from_ymd_opt(
        shifted.year(),
        shifted.month(),
        days_in_month(shifted.year(), shifted.month()),
    )
    .ok_or(ErrorKind::Num)?;
    let serial = date_to_serial(last);
    if serial < 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(serial)
}

fn yearfrac(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let start = date_arg(&args[0])?;
    let end = date_arg(&args[1])?;
    let basis = match args.get(2) {
        None | Some(Value::Empty) => 0,
        Some(v) => crate::coercion::to_integer(v)?,
    };
    if end < start {
        return Err(ErrorKind::Num);
    }
    ok_num(year_frac_dates(start, end, basis)?)
}

fn datedif(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let start = date_arg(&args[0])?;
    let end = date_arg(&args[1])?;
    if end < start {
        return Err(ErrorKind::Num);
    }
    let unit = text_arg(args, 2)?.to_ascii_uppercase();

    let whole_months = {
        let mut m = (end.year() as i64 - start.year() as i64) * 12
            + (end.month() as i64 - start.month() as i64);
        if end.day() < start.day() {
            m -= 1;
        }
        m
    };

    ok_num(match unit.as_str() {
        "Y" => (whole_months / 12) as f64,
        "M" => whole_months as f64,
        "D" => (end - start).num_days() as f64,
        "YM" => (whole_months % 12) as f64,
        "YD" => {
            // Days since the last anniversary of `start` on or before `end`.
            let years = whole_months / 12;
            let anniversary = add_months(start, years * 12)?;
            (end - anniversary).num_days() as f64
        }
        "MD" => {
            let anchor = add_months(start, whole_months)?;
            (end - anchor).num_days() as f64
        }
        _ => return Err(ErrorKind::Num),
    })
}
