//! SUBTOTAL and AGGREGATE: function-code driven reductions.
//!
//! Codes 101..111 collapse onto 1..11 — the core carries no row-visibility
//! information, so the "ignore hidden rows" half of the contract is the
//! caller's concern. AGGREGATE's option bit 2 filters errors from the data
//! before the fold; without it the first error propagates.

use sheetcalc_common::{ErrorKind, Value};

use crate::builtins::stats::rank::{large_k, percentile_exc, percentile_inc, small_k};
use crate::builtins::utils::{numeric_samples, ok_num};
use crate::coercion::{to_integer, to_number_lenient};
use crate::context::CellContext;
use crate::function::{FnCaps, FunctionDef};
use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    reg.insert(FunctionDef::new("SUBTOTAL", 2, None, FnCaps::PURE, subtotal));
    reg.insert(FunctionDef::new(
        "AGGREGATE",
        3,
        None,
        FnCaps::ERROR_AWARE,
        aggregate,
    ));
}

/// The shared 1..13 function-code dispatch (12/13 are AGGREGATE-only).
/// GROUPBY/PIVOTBY reuse the same codes for their aggregations.
pub(crate) fn apply_code(code: i64, xs: &[f64]) -> Result<f64, ErrorKind> {
    let n = xs.len() as f64;
    let mean = || xs.iter().sum::<f64>() / n;
    let ssd = || {
        let m = xs.iter().sum::<f64>() / n;
        xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>()
    };
    Ok(match code {
        1 => {
            if xs.is_empty() {
                return Err(ErrorKind::Div);
            }
            mean()
        }
        2 => n,
        3 => n, // COUNTA over the numeric sample the caller assembled
        4 => xs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        5 => xs.iter().copied().fold(f64::INFINITY, f64::min),
        6 => xs.iter().product(),
        7 => {
            if xs.len() < 2 {
                return Err(ErrorKind::Div);
            }
            (ssd() / (n - 1.0)).sqrt()
        }
        8 => {
            if xs.is_empty() {
                return Err(ErrorKind::Div);
            }
            (ssd() / n).sqrt()
        }
        9 => xs.iter().sum(),
        10 => {
            if xs.len() < 2 {
                return Err(ErrorKind::Div);
            }
            ssd() / (n - 1.0)
        }
        11 => {
            if xs.is_empty() {
                return Err(ErrorKind::Div);
            }
            ssd() / n
        }
        12 => {
            if xs.is_empty() {
                return Err(ErrorKind::Div);
            }
            let mut s = xs.to_vec();
            s.sort_by(f64::total_cmp);
            let mid = s.len() / 2;
            if s.len() % 2 == 1 { s[mid] } else { (s[mid - 1] + s[mid]) / 2.0 }
        }
        13 => {
            if xs.is_empty() {
                return Err(ErrorKind::Div);
            }
            let mut best: Option<(f64, usize)> = None;
            for &x in xs {
                let c = xs.iter().filter(|&&y| y == x).count();
                if best.is_none_or(|(_, bc)| c > bc) {
                    best = Some((x, c));
                }
            }
            match best {
                Some((x, c)) if c >= 2 => x,
                _ => return Err(ErrorKind::Na),
            }
        }
        _ => return Err(ErrorKind::Value),
    })
}

fn subtotal(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let code = to_integer(&args[0])?;
    let code = match code {
        1..=11 => code,
        101..=111 => code - 100,
        _ => return Err(ErrorKind::Value),
    };
    let xs = numeric_samples(&args[1..]);
    // COUNTA counts every non-empty value, not just numbers.
    if code == 3 {
        return ok_num(args[1..].iter().filter(|v| !v.is_empty()).count() as f64);
    }
    // MIN/MAX of an empty sample are 0, matching the plain reductions.
    if xs.is_empty() && matches!(code, 4 | 5 | 9) {
        return ok_num(0.0);
    }
    ok_num(apply_code(code, &xs)?)
}

fn aggregate(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let func = to_integer(&args[0])?;
    let opt = to_integer(&args[1])?;
    if !(1..=19).contains(&func) || !(0..=7).contains(&opt) {
        return Err(ErrorKind::Value);
    }
    // Option bit 2: filter errors from the data before folding.
    let ignore_errors = matches!(opt, 2 | 3 | 6 | 7);

    let (data, param) = if func >= 14 {
        if args.len() < 4 {
            return Err(ErrorKind::Value);
        }
        (&args[2..args.len() - 1], Some(&args[args.len() - 1]))
    } else {
        (&args[2..], None)
    };

    if !ignore_errors {
        if let Some(e) = data.iter().find_map(Value::error_kind) {
            return Err(e);
        }
    }
    let clean: Vec<Value> = data.iter().filter(|v| !v.is_error()).cloned().collect();
    let xs = numeric_samples(&clean);

    match func {
        1..=13 => {
            if func == 3 {
                return ok_num(clean.iter().filter(|v| !v.is_empty()).count() as f64);
            }
            if xs.is_empty() && matches!(func, 4 | 5 | 9) {
                return ok_num(0.0);
            }
            ok_num(apply_code(func, &xs)?)
        }
        14 | 15 => {
            let k = to_integer(param.unwrap())?;
            ok_num(if func == 14 { large_k(&xs, k)? } else { small_k(&xs, k)? })
        }
        16..=19 => {
            let p = match func {
                16 | 18 => to_number_lenient(param.unwrap())?,
                _ => {
                    let q = to_integer(param.unwrap())?;
                    if !(0..=4).contains(&q) {
                        return Err(ErrorKind::Num);
                    }
                    q as f64 / 4.0
                }
            };
            ok_num(match func {
                16 | 17 => percentile_inc(&xs, p)?,
                _ => percentile_exc(&xs, p)?,
            })
        }
        _ => Err(ErrorKind::Value),
    }
}
