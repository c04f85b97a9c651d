//! Paired-array statistics: slope/intercept, correlation, covariance,
//! and the linear FORECAST pair.
//!
//! The flat convention carries the two arrays as one argument list split
//! in half (y-half first, x-half second, matching Excel's known_y /
//! known_x order). Pairs where either side is non-numeric are dropped
//! before fitting.

use sheetcalc_common::{ErrorKind, Value};

use crate::builtins::utils::{number_arg, ok_num};
use crate::context::CellContext;
use crate::function::{FnCaps, FunctionDef};
use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("SLOPE", 2, None, FnCaps::PURE, slope),
        FunctionDef::new("INTERCEPT", 2, None, FnCaps::PURE, intercept),
        FunctionDef::new("CORREL", 2, None, FnCaps::PURE, correl),
        FunctionDef::new("PEARSON", 2, None, FnCaps::PURE, correl),
        FunctionDef::new("RSQ", 2, None, FnCaps::PURE, rsq),
        FunctionDef::new("STEYX", 2, None, FnCaps::PURE, steyx),
        FunctionDef::new("COVARIANCE.P", 2, None, FnCaps::PURE, covariance_p),
        FunctionDef::new("COVAR", 2, None, FnCaps::PURE, covariance_p),
        FunctionDef::new("COVARIANCE.S", 2, None, FnCaps::PURE, covariance_s),
        FunctionDef::new("FORECAST", 3, None, FnCaps::PURE, forecast_linear),
        FunctionDef::new("FORECAST.LINEAR", 3, None, FnCaps::PURE, forecast_linear),
    ] {
        reg.insert(def);
    }
}

/// Split the flat argument list into numeric (y, x) pairs.
fn paired(args: &[Value]) -> Result<(Vec<f64>, Vec<f64>), ErrorKind> {
    if args.len() % 2 != 0 {
        return Err(ErrorKind::Value);
    }
    let half = args.len() / 2;
    let mut ys = Vec::with_capacity(half);
    let mut xs = Vec::with_capacity(half);
    for i in 0..half {
        if let (Some(y), Some(x)) =
            (args[i].as_number_strict(), args[half + i].as_number_strict())
        {
            ys.push(y);
            xs.push(x);
        }
    }
    Ok((ys, xs))
}

struct Fit {
    n: f64,
    mean_x: f64,
    mean_y: f64,
    ss_xx: f64,
    ss_yy: f64,
    ss_xy: f64,
}

fn fit(ys: &[f64], xs: &[f64], min_pairs: usize) -> Result<Fit, ErrorKind> {
    if ys.len() < min_pairs {
        return Err(ErrorKind::Div);
    }
    let n = ys.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let mut ss_xx = 0.0;
    let mut ss_yy = 0.0;
    let mut ss_xy = 0.0;
    for (&y, &x) in ys.iter().zip(xs) {
        ss_xx += (x - mean_x) * (x - mean_x);
        ss_yy += (y - mean_y) * (y - mean_y);
        ss_xy += (x - mean_x) * (y - mean_y);
    }
    Ok(Fit { n, mean_x, mean_y, ss_xx, ss_yy, ss_xy })
}

fn slope_of(f: &Fit) -> Result<f64, ErrorKind> {
    if f.ss_xx == 0.0 {
        return Err(ErrorKind::Div);
    }
    Ok(f.ss_xy / f.ss_xx)
}

fn slope(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (ys, xs) = paired(args)?;
    ok_num(slope_of(&fit(&ys, &xs, 2)?)?)
}

fn intercept(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (ys, xs) = paired(args)?;
    let f = fit(&ys, &xs, 2)?;
    ok_num(f.mean_y - slope_of(&f)? * f.mean_x)
}

fn correl(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (ys, xs) = paired(args)?;
    let f = fit(&ys, &xs, 2)?;
    let denom = (f.ss_xx * f.ss_yy).sqrt();
    if denom == 0.0 {
        return Err(ErrorKind::Div);
    }
    ok_num(f.ss_xy / denom)
}

fn rsq(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (ys, xs) = paired(args)?;
    let f = fit(&ys, &xs, 2)?;
    let denom = f.ss_xx * f.ss_yy;
    if denom == 0.0 {
        return Err(ErrorKind::Div);
    }
    ok_num(f.ss_xy * f.ss_xy / denom)
}

fn steyx(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (ys, xs) = paired(args)?;
    let f = fit(&ys, &xs, 3)?;
    if f.ss_xx == 0.0 {
        return Err(ErrorKind::Div);
    }
    let resid = f.ss_yy - f.ss_xy * f.ss_xy / f.ss_xx;
    ok_num((resid / (f.n - 2.0)).sqrt())
}

fn covariance_p(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (ys, xs) = paired(args)?;
    let f = fit(&ys, &xs, 1)?;
    ok_num(f.ss_xy / f.n)
}

fn covariance_s(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (ys, xs) = paired(args)?;
    let f = fit(&ys, &xs, 2)?;
    ok_num(f.ss_xy / (f.n - 1.0))
}

// FORECAST(x, known_y…, known_x…)
fn forecast_linear(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let x = number_arg(args, 0)?;
    let (ys, xs) = paired(&args[1..])?;
    let f = fit(&ys, &xs, 2)?;
    let b = slope_of(&f)?;
    ok_num(f.mean_y + b * (x - f.mean_x))
}
