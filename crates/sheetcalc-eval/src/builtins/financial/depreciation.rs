//! Depreciation schedules: straight-line, sum-of-years, declining
//! balance in its fixed / double / variable forms, and the French
//! AMORDEGRC / AMORLINC pair.

use sheetcalc_common::{ErrorKind, Value};

use crate::builtins::datetime::{date_arg, spans::year_frac_dates};
use crate::builtins::utils::{number_arg, ok_num, opt_bool_arg, opt_number_arg};
use crate::context::CellContext;
use crate::function::{FnCaps, FunctionDef};
use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("SLN", 3, Some(3), FnCaps::PURE, sln),
        FunctionDef::new("SYD", 4, Some(4), FnCaps::PURE, syd),
        FunctionDef::new("DB", 4, Some(5), FnCaps::PURE, db),
        FunctionDef::new("DDB", 4, Some(5), FnCaps::PURE, ddb),
        FunctionDef::new("VDB", 5, Some(7), FnCaps::PURE, vdb),
        FunctionDef::new("AMORDEGRC", 6, Some(7), FnCaps::PURE, amordegrc),
        FunctionDef::new("AMORLINC", 6, Some(7), FnCaps::PURE, amorlinc),
    ] {
        reg.insert(def);
    }
}

fn sln(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let cost = number_arg(args, 0)?;
    let salvage = number_arg(args, 1)?;
    let life = number_arg(args, 2)?;
    if life == 0.0 {
        return Err(ErrorKind::Div);
    }
    ok_num((cost - salvage) / life)
}

fn syd(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let cost = number_arg(args, 0)?;
    let salvage = number_arg(args, 1)?;
    let life = number_arg(args, 2)?;
    let per = number_arg(args, 3)?;
    if life <= 0.0 || per < 1.0 || per > life {
        return Err(ErrorKind::Num);
    }
    ok_num((cost - salvage) * (life - per + 1.0) * 2.0 / (life * (life + 1.0)))
}

// Fixed-declining balance with the documented 3-decimal rate rounding.
fn db(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let cost = number_arg(args, 0)?;
    let salvage = number_arg(args, 1)?;
    let life = number_arg(args, 2)?;
    let period = number_arg(args, 3)?.trunc();
    let month = opt_number_arg(args, 4, 12.0)?.trunc();
    if cost < 0.0 || salvage < 0.0 || life <= 0.0 || !(1.0..=12.0).contains(&month) {
        return Err(ErrorKind::Num);
    }
    if period < 1.0 || period > life + 1.0 {
        return Err(ErrorKind::Num);
    }
    if cost == 0.0 {
        return ok_num(0.0);
    }
    let rate = (1.0 - (salvage / cost).powf(1.0 / life)).min(1.0);
    let rate = (rate * 1000.0).round() / 1000.0;

    let mut accumulated = 0.0;
    let mut dep = cost * rate * month / 12.0;
    for p in 2..=(period as i64) {
        accumulated += dep;
        dep = if p as f64 == life + 1.0 {
            (cost - accumulated) * rate * (12.0 - month) / 12.0
        } else {
            (cost - accumulated) * rate
        };
    }
    ok_num(dep)
}

fn ddb_period(
    cost: f64,
    salvage: f64,
    life: f64,
    period: f64,
    factor: f64,
) -> f64 {
    let rate = (factor / life).min(1.0);
    let mut balance = cost;
    let mut dep = 0.0;
    for _ in 0..(period as i64) {
        dep = (balance * rate).min((balance - salvage).max(0.0));
        balance -= dep;
    }
    dep
}

fn ddb(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let cost = number_arg(args, 0)?;
    let salvage = number_arg(args, 1)?;
    let life = number_arg(args, 2)?;
    let period = number_arg(args, 3)?.trunc();
    let factor = opt_number_arg(args, 4, 2.0)?;
    if cost < 0.0 || salvage < 0.0 || life <= 0.0 || factor <= 0.0 {
        return Err(ErrorKind::Num);
    }
    if period < 1.0 || period > life.ceil() {
        return Err(ErrorKind::Num);
    }
    ok_num(ddb_period(cost, salvage, life, period, factor))
}

// Declining balance over [start, end] with an optional switch to
// straight-line when that depreciates faster.
fn vdb(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let cost = number_arg(args, 0)?;
    let salvage = number_arg(args, 1)?;
    let life = number_arg(args, 2)?;
    let start = number_arg(args, 3)?;
    let end = number_arg(args, 4)?;
    let factor = opt_number_arg(args, 5, 2.0)?;
    let no_switch = opt_bool_arg(args, 6, false)?;
    if cost < 0.0 || salvage < 0.0 || life <= 0.0 || factor <= 0.0 {
        return Err(ErrorKind::Num);
    }
    if start < 0.0 || end < start || end > life {
        return Err(ErrorKind::Num);
    }

    let rate = (factor / life).min(1.0);
    let mut balance = cost;
    let mut total = 0.0;
    let mut straight_line = false;
    let mut sl_dep = 0.0;
    let whole = life.ceil() as i64;
    for p in 0..whole {
        let remaining_life = life - p as f64;
        let decl = (balance * rate).min((balance - salvage).max(0.0));
        let sl = if remaining_life > 0.0 {
            ((balance - salvage) / remaining_life).max(0.0)
        } else {
            0.0
        };
        if !no_switch && !straight_line && sl > decl {
            straight_line = true;
            sl_dep = sl;
        }
        let dep = if straight_line { sl_dep.min((balance - salvage).max(0.0)) } else { decl };

        // Portion of this period inside [start, end].
        let lo = (p as f64).max(start);
        let hi = ((p + 1) as f64).min(end);
        if hi > lo {
            total += dep * (hi - lo);
        }
        balance -= dep;
    }
    ok_num(total)
}

/// French straight-line with a prorated first period.
fn amorlinc(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let cost = number_arg(args, 0)?;
    let purchased = date_arg(&args[1])?;
    let first_period = date_arg(&args[2])?;
    let salvage = number_arg(args, 3)?;
    let period = number_arg(args, 4)?.trunc();
    let rate = number_arg(args, 5)?;
    let basis = match args.get(6) {
        None | Some(Value::Empty) => 0,
        Some(v) => crate::coercion::to_integer(v)?,
    };
    if cost <= 0.0 || salvage < 0.0 || rate <= 0.0 || period < 0.0 || first_period < purchased {
        return Err(ErrorKind::Num);
    }

    let annual = cost * rate;
    let first = annual * year_frac_dates(purchased, first_period, basis)?;
    let full_periods = ((cost - salvage - first) / annual).floor();

    let p = period;
    ok_num(if p == 0.0 {
        first
    } else if p <= full_periods {
        annual
    } else if p == full_periods + 1.0 {
        cost - salvage - first - annual * full_periods
    } else {
        0.0
    })
}

/// Accelerated French depreciation; the coefficient scales with life.
fn amordegrc(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let cost = number_arg(args, 0)?;
    let purchased = date_arg(&args[1])?;
    let first_period = date_arg(&args[2])?;
    let salvage = number_arg(args, 3)?;
    let period = number_arg(args, 4)?.trunc();
    let rate = number_arg(args, 5)?;
    let basis = match args.get(6) {
        None | Some(Value::Empty) => 0,
        Some(v) => crate::coercion::to_integer(v)?,
    };
    if cost <= 0.0 || salvage < 0.0 || rate <= 0.0 || period < 0.0 || first_period < purchased {
        return Err(ErrorKind::Num);
    }

    let life = 1.0 / rate;
    if life < 3.0 {
        return Err(ErrorKind::Num);
    }
    let coeff = if life < 5.0 {
        1.5
    } else if life <= 6.0 {
        2.0
    } else {
        2.5
    };

    let used_rate = rate * coeff;
    let mut balance = cost;
    let mut dep = (balance * used_rate * year_frac_dates(purchased, first_period, basis)?).round();
    let last_full = (life.ceil() as i64) - 2;
    for p in 1..=(period as i64) {
        balance -= dep;
        dep = if p == last_full {
            // Penultimate period splits the remainder evenly.
            (balance * 0.5).round()
        } else if p == last_full + 1 {
            (balance - (balance * 0.5).round()).round().max(0.0)
        } else if p > last_full + 1 {
            0.0
        } else {
            (balance * used_rate).round()
        };
    }
    ok_num(dep)
}
