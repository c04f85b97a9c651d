//! DATE, TIME, DATEVALUE, TIMEVALUE, TODAY, NOW.

use chrono::NaiveDate;
use sheetcalc_common::{ErrorKind, Value, date_to_serial};

use crate::builtins::utils::{int_arg, ok_num};
use crate::coercion::parse_datetime_text;
use crate::context::CellContext;
use crate::function::{FnCaps, FunctionDef};
use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("DATE", 3, Some(3), FnCaps::PURE, date),
        FunctionDef::new("TIME", 3, Some(3), FnCaps::PURE, time),
        FunctionDef::new("DATEVALUE", 1, Some(1), FnCaps::PURE, datevalue),
        FunctionDef::new("TIMEVALUE", 1, Some(1), FnCaps::PURE, timevalue),
        FunctionDef::new("TODAY", 0, Some(0), FnCaps::VOLATILE, today),
        FunctionDef::new("NOW", 0, Some(0), FnCaps::VOLATILE, now),
    ] {
        reg.insert(def);
    }
}

// Out-of-range month/day roll over into adjacent months, Excel style:
// DATE(2024, 13, 1) is 2025-01-01 and DATE(2024, 1, 0) is 2023-12-31.
fn date(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let year = int_arg(args, 0)?;
    let month = int_arg(args, 1)?;
    let day = int_arg(args, 2)?;

    // Two-digit era shorthand: 0..=1899 shifts into the 1900s.
    let year = if (0..=1899).contains(&year) { year + 1900 } else { year };
    if !(1899..=9999).contains(&year) {
        return Err(ErrorKind::Num);
    }

    let total_months = year * 12 + (month - 1);
    let y = i32::try_from(total_months.div_euclid(12)).map_err(|_| ErrorKind::Num)?;
    let m = total_months.rem_euclid(12) as u32 + 1;
    let first = NaiveDate::from_ymd_opt(y, m, 1).ok_or(ErrorKind::Num)?;
    let d = first
        .checked_add_signed(chrono::Duration::days(day - 1))
        .ok_or(ErrorKind::Num)?;

    let serial = date_to_serial(d);
    if serial < 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(serial)
}

fn time(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let h = int_arg(args, 0)?;
    let m = int_arg(args, 1)?;
    let s = int_arg(args, 2)?;
    if h < 0 || m < 0 || s < 0 {
        return Err(ErrorKind::Num);
    }
    let total = (h * 3600 + m * 60 + s).rem_euclid(86_400);
    ok_num(total as f64 / 86_400.0)
}

fn datevalue(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let Value::Text(s) = &args[0] else {
        return Err(ErrorKind::Value);
    };
    let serial = parse_datetime_text(s).ok_or(ErrorKind::Value)?;
    ok_num(serial.trunc())
}

fn timevalue(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let Value::Text(s) = &args[0] else {
        return Err(ErrorKind::Value);
    };
    let serial = parse_datetime_text(s).ok_or(ErrorKind::Value)?;
    ok_num(serial.fract())
}

fn today(ctx: &dyn CellContext, _: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(ctx.now().trunc())
}

fn now(ctx: &dyn CellContext, _: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(ctx.now())
}
