//! Higher moments and mean variants: AVEDEV, DEVSQ, GEOMEAN, HARMEAN,
//! SKEW, KURT, STANDARDIZE.

use sheetcalc_common::{ErrorKind, Value};

use crate::builtins::utils::{number_arg, numeric_samples, ok_num};
use crate::context::CellContext;
use crate::function::{FnCaps, FunctionDef};
use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("AVEDEV", 1, None, FnCaps::PURE, avedev),
        FunctionDef::new("DEVSQ", 1, None, FnCaps::PURE, devsq),
        FunctionDef::new("GEOMEAN", 1, None, FnCaps::PURE, geomean),
        FunctionDef::new("HARMEAN", 1, None, FnCaps::PURE, harmean),
        FunctionDef::new("SKEW", 1, None, FnCaps::PURE, skew),
        FunctionDef::new("KURT", 1, None, FnCaps::PURE, kurt),
        FunctionDef::new("STANDARDIZE", 3, Some(3), FnCaps::PURE, standardize),
    ] {
        reg.insert(def);
    }
}

fn mean_of(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn avedev(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let xs = numeric_samples(args);
    if xs.is_empty() {
        return Err(ErrorKind::Div);
    }
    let m = mean_of(&xs);
    ok_num(xs.iter().map(|x| (x - m).abs()).sum::<f64>() / xs.len() as f64)
}

fn devsq(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let xs = numeric_samples(args);
    if xs.is_empty() {
        return Err(ErrorKind::Div);
    }
    let m = mean_of(&xs);
    ok_num(xs.iter().map(|x| (x - m) * (x - m)).sum())
}

// exp(mean(ln x)) keeps the product from overflowing.
fn geomean(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let xs = numeric_samples(args);
    if xs.is_empty() {
        return Err(ErrorKind::Div);
    }
    if xs.iter().any(|&x| x <= 0.0) {
        return Err(ErrorKind::Num);
    }
    ok_num((xs.iter().map(|x| x.ln()).sum::<f64>() / xs.len() as f64).exp())
}

fn harmean(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let xs = numeric_samples(args);
    if xs.is_empty() {
        return Err(ErrorKind::Div);
    }
    if xs.iter().any(|&x| x <= 0.0) {
        return Err(ErrorKind::Num);
    }
    ok_num(xs.len() as f64 / xs.iter().map(|x| 1.0 / x).sum::<f64>())
}

/// Sample skewness, Excel's bias-corrected form.
fn skew(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let xs = numeric_samples(args);
    let n = xs.len() as f64;
    if xs.len() < 3 {
        return Err(ErrorKind::Div);
    }
    let m = mean_of(&xs);
    let s = (xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / (n - 1.0)).sqrt();
    if s == 0.0 {
        return Err(ErrorKind::Div);
    }
    let cubed: f64 = xs.iter().map(|x| ((x - m) / s).powi(3)).sum();
    ok_num(n / ((n - 1.0) * (n - 2.0)) * cubed)
}

/// Sample excess kurtosis (normal ⇒ 0), Excel's bias-corrected form.
fn kurt(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let xs = numeric_samples(args);
    let n = xs.len() as f64;
    if xs.len() < 4 {
        return Err(ErrorKind::Div);
    }
    let m = mean_of(&xs);
    let s = (xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / (n - 1.0)).sqrt();
    if s == 0.0 {
        return Err(ErrorKind::Div);
    }
    let fourth: f64 = xs.iter().map(|x| ((x - m) / s).powi(4)).sum();
    let lead = n * (n + 1.0) / ((n - 1.0) * (n - 2.0) * (n - 3.0));
    let tail = 3.0 * (n - 1.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0));
    ok_num(lead * fourth - tail)
}

fn standardize(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let x = number_arg(args, 0)?;
    let mean = number_arg(args, 1)?;
    let sd = number_arg(args, 2)?;
    if sd <= 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num((x - mean) / sd)
}
