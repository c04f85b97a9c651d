//! Reductions: SUM/PRODUCT folds, counting, order statistics of the
//! plain kind (MIN/MAX/MEDIAN/MODE), and the variance family.
//!
//! SUM-style folds coerce every argument (non-numeric text is `#VALUE!`,
//! empties skipped); the statistical reductions skip text and booleans
//! silently, and their `*A` variants count text as 0 and booleans as 1/0.

use sheetcalc_common::{ErrorKind, Value};

use crate::builtins::utils::{fold_numbers, numeric_samples, numeric_samples_a, ok_num};
use crate::context::CellContext;
use crate::function::{FnCaps, FunctionDef};
use crate::registry::Registry;
use crate::shape::{ArrayResult, ArrayView};

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("SUM", 0, None, FnCaps::PURE, sum),
        FunctionDef::new("PRODUCT", 1, None, FnCaps::PURE, product),
        FunctionDef::new("SUMPRODUCT", 1, None, FnCaps::PURE, sumproduct),
        FunctionDef::new("SUMSQ", 1, None, FnCaps::PURE, sumsq),
        FunctionDef::new("AVERAGE", 1, None, FnCaps::PURE, average),
        FunctionDef::new("AVERAGEA", 1, None, FnCaps::PURE, averagea),
        FunctionDef::new("MIN", 1, None, FnCaps::PURE, min),
        FunctionDef::new("MINA", 1, None, FnCaps::PURE, mina),
        FunctionDef::new("MAX", 1, None, FnCaps::PURE, max),
        FunctionDef::new("MAXA", 1, None, FnCaps::PURE, maxa),
        FunctionDef::new("COUNT", 1, None, FnCaps::PURE, count),
        FunctionDef::new("COUNTA", 1, None, FnCaps::ERROR_AWARE, counta),
        FunctionDef::new("COUNTBLANK", 1, None, FnCaps::ERROR_AWARE, countblank),
        FunctionDef::new("MEDIAN", 1, None, FnCaps::PURE, median),
        FunctionDef::new("MODE", 1, None, FnCaps::PURE, mode_sngl),
        FunctionDef::new("MODE.SNGL", 1, None, FnCaps::PURE, mode_sngl),
        FunctionDef::new("MODE.MULT", 1, None, FnCaps::PURE | FnCaps::ARRAY, mode_mult),
        FunctionDef::new("STDEV", 1, None, FnCaps::PURE, stdev_s),
        FunctionDef::new("STDEV.S", 1, None, FnCaps::PURE, stdev_s),
        FunctionDef::new("STDEVP", 1, None, FnCaps::PURE, stdev_p),
        FunctionDef::new("STDEV.P", 1, None, FnCaps::PURE, stdev_p),
        FunctionDef::new("STDEVA", 1, None, FnCaps::PURE, stdeva),
        FunctionDef::new("STDEVPA", 1, None, FnCaps::PURE, stdevpa),
        FunctionDef::new("VAR", 1, None, FnCaps::PURE, var_s),
        FunctionDef::new("VAR.S", 1, None, FnCaps::PURE, var_s),
        FunctionDef::new("VARP", 1, None, FnCaps::PURE, var_p),
        FunctionDef::new("VAR.P", 1, None, FnCaps::PURE, var_p),
        FunctionDef::new("VARA", 1, None, FnCaps::PURE, vara),
        FunctionDef::new("VARPA", 1, None, FnCaps::PURE, varpa),
    ] {
        reg.insert(def);
    }
}

fn sum(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(fold_numbers(args)?.iter().sum())
}

fn product(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let xs = fold_numbers(args)?;
    if xs.is_empty() {
        return ok_num(0.0);
    }
    ok_num(xs.iter().product())
}

// Flat convention: a single flattened array, so the elementwise product
// degenerates to SUM. `sumproduct_views` is the shape-aware general form.
fn sumproduct(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(fold_numbers(args)?.iter().sum())
}

/// Elementwise product across equally-shaped views, summed.
pub fn sumproduct_views(views: &[ArrayView]) -> Result<f64, ErrorKind> {
    let Some(first) = views.first() else {
        return Err(ErrorKind::Value);
    };
    if views.iter().any(|v| v.shape() != first.shape()) {
        return Err(ErrorKind::Value);
    }
    let mut total = 0.0;
    for i in 0..first.shape().len() {
        let mut prod = 1.0;
        for v in views {
            let cell = &v.values()[i];
            if let Value::Error(e) = cell {
                return Err(*e);
            }
            // Non-numeric entries count as zero, like Excel's SUMPRODUCT.
            prod *= cell.as_number_strict().unwrap_or(0.0);
        }
        total += prod;
    }
    Ok(total)
}

fn sumsq(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(fold_numbers(args)?.iter().map(|n| n * n).sum())
}

fn average(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let xs = numeric_samples(args);
    if xs.is_empty() {
        return Err(ErrorKind::Div);
    }
    ok_num(xs.iter().sum::<f64>() / xs.len() as f64)
}

fn averagea(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let xs = numeric_samples_a(args);
    if xs.is_empty() {
        return Err(ErrorKind::Div);
    }
    ok_num(xs.iter().sum::<f64>() / xs.len() as f64)
}

fn fold_min(xs: &[f64]) -> f64 {
    xs.iter().copied().fold(f64::INFINITY, f64::min)
}

fn fold_max(xs: &[f64]) -> f64 {
    xs.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn min(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let xs = numeric_samples(args);
    ok_num(if xs.is_empty() { 0.0 } else { fold_min(&xs) })
}

fn mina(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let xs = numeric_samples_a(args);
    ok_num(if xs.is_empty() { 0.0 } else { fold_min(&xs) })
}

fn max(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let xs = numeric_samples(args);
    ok_num(if xs.is_empty() { 0.0 } else { fold_max(&xs) })
}

fn maxa(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let xs = numeric_samples_a(args);
    ok_num(if xs.is_empty() { 0.0 } else { fold_max(&xs) })
}

fn count(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(args.iter().filter(|v| v.is_number()).count() as f64)
}

fn counta(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(args.iter().filter(|v| !v.is_empty()).count() as f64)
}

fn countblank(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let blanks = args
        .iter()
        .filter(|v| v.is_empty() || matches!(v, Value::Text(s) if s.is_empty()))
        .count();
    ok_num(blanks as f64)
}

fn median(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let mut xs = numeric_samples(args);
    if xs.is_empty() {
        return Err(ErrorKind::Div);
    }
    xs.sort_by(f64::total_cmp);
    let mid = xs.len() / 2;
    ok_num(if xs.len() % 2 == 1 { xs[mid] } else { (xs[mid - 1] + xs[mid]) / 2.0 })
}

/// All modes of the sample, ordered by first appearance. Empty when no
/// value repeats.
fn modes_of(xs: &[f64]) -> Vec<f64> {
    let mut distinct: Vec<(f64, usize)> = Vec::new();
    for &x in xs {
        match distinct.iter_mut().find(|(v, _)| *v == x) {
            Some((_, c)) => *c += 1,
            None => distinct.push((x, 1)),
        }
    }
    let best = distinct.iter().map(|&(_, c)| c).max().unwrap_or(0);
    if best < 2 {
        return Vec::new();
    }
    distinct
        .into_iter()
        .filter_map(|(v, c)| (c == best).then_some(v))
        .collect()
}

fn mode_sngl(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let xs = numeric_samples(args);
    if xs.is_empty() {
        return Err(ErrorKind::Div);
    }
    match modes_of(&xs).first() {
        Some(&m) => ok_num(m),
        None => Err(ErrorKind::Na),
    }
}

fn mode_mult(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let xs = numeric_samples(args);
    if xs.is_empty() {
        return Err(ErrorKind::Div);
    }
    let modes = modes_of(&xs);
    if modes.is_empty() {
        return Err(ErrorKind::Na);
    }
    Ok(ArrayResult::column(modes.into_iter().map(Value::Number).collect()).anchor())
}

/// Σ(x−x̄)² with the mean subtracted in one pass over the sample.
fn sum_sq_dev(xs: &[f64]) -> f64 {
    let mean = xs.iter().sum::<f64>() / xs.len() as f64;
    xs.iter().map(|x| (x - mean) * (x - mean)).sum()
}

fn variance(xs: &[f64], sample: bool) -> Result<f64, ErrorKind> {
    let n = xs.len();
    if n < 2 && sample || n == 0 {
        return Err(ErrorKind::Div);
    }
    Ok(sum_sq_dev(xs) / (n - usize::from(sample)) as f64)
}

fn var_s(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(variance(&numeric_samples(args), true)?)
}

fn var_p(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(variance(&numeric_samples(args), false)?)
}

fn vara(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(variance(&numeric_samples_a(args), true)?)
}

fn varpa(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(variance(&numeric_samples_a(args), false)?)
}

fn stdev_s(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(variance(&numeric_samples(args), true)?.sqrt())
}

fn stdev_p(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(variance(&numeric_samples(args), false)?.sqrt())
}

fn stdeva(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(variance(&numeric_samples_a(args), true)?.sqrt())
}

fn stdevpa(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(variance(&numeric_samples_a(args), false)?.sqrt())
}
