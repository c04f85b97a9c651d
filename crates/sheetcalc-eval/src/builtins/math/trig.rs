//! Trigonometric and hyperbolic functions plus the angle-unit helpers.

use sheetcalc_common::{ErrorKind, Value};

use crate::builtins::utils::{number_arg, ok_num};
use crate::context::CellContext;
use crate::function::{FnCaps, FunctionDef};
use crate::registry::Registry;

/// Near-zero denominator guard for the reciprocal trig functions.
const EPSILON_NEAR_ZERO: f64 = 1e-12;

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("PI", 0, Some(0), FnCaps::PURE, pi),
        FunctionDef::new("DEGREES", 1, Some(1), FnCaps::PURE, degrees),
        FunctionDef::new("RADIANS", 1, Some(1), FnCaps::PURE, radians),
        FunctionDef::new("SIN", 1, Some(1), FnCaps::PURE, sin),
        FunctionDef::new("COS", 1, Some(1), FnCaps::PURE, cos),
        FunctionDef::new("TAN", 1, Some(1), FnCaps::PURE, tan),
        FunctionDef::new("ASIN", 1, Some(1), FnCaps::PURE, asin),
        FunctionDef::new("ACOS", 1, Some(1), FnCaps::PURE, acos),
        FunctionDef::new("ATAN", 1, Some(1), FnCaps::PURE, atan),
        FunctionDef::new("ATAN2", 2, Some(2), FnCaps::PURE, atan2),
        FunctionDef::new("SINH", 1, Some(1), FnCaps::PURE, sinh),
        FunctionDef::new("COSH", 1, Some(1), FnCaps::PURE, cosh),
        FunctionDef::new("TANH", 1, Some(1), FnCaps::PURE, tanh),
        FunctionDef::new("ASINH", 1, Some(1), FnCaps::PURE, asinh),
        FunctionDef::new("ACOSH", 1, Some(1), FnCaps::PURE, acosh),
        FunctionDef::new("ATANH", 1, Some(1), FnCaps::PURE, atanh),
        FunctionDef::new("COT", 1, Some(1), FnCaps::PURE, cot),
        FunctionDef::new("SEC", 1, Some(1), FnCaps::PURE, sec),
        FunctionDef::new("CSC", 1, Some(1), FnCaps::PURE, csc),
    ] {
        reg.insert(def);
    }
}

fn pi(_: &dyn CellContext, _: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(std::f64::consts::PI)
}

fn degrees(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(number_arg(args, 0)?.to_degrees())
}

fn radians(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(number_arg(args, 0)?.to_radians())
}

fn sin(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(number_arg(args, 0)?.sin())
}

fn cos(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(number_arg(args, 0)?.cos())
}

fn tan(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(number_arg(args, 0)?.tan())
}

fn asin(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    if !(-1.0..=1.0).contains(&n) {
        return Err(ErrorKind::Num);
    }
    ok_num(n.asin())
}

fn acos(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    if !(-1.0..=1.0).contains(&n) {
        return Err(ErrorKind::Num);
    }
    ok_num(n.acos())
}

fn atan(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(number_arg(args, 0)?.atan())
}

// Excel argument order is (x, y), the reverse of f64::atan2.
fn atan2(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let x = number_arg(args, 0)?;
    let y = number_arg(args, 1)?;
    if x == 0.0 && y == 0.0 {
        return Err(ErrorKind::Div);
    }
    ok_num(y.atan2(x))
}

fn sinh(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(number_arg(args, 0)?.sinh())
}

fn cosh(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(number_arg(args, 0)?.cosh())
}

fn tanh(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(number_arg(args, 0)?.tanh())
}

fn asinh(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(number_arg(args, 0)?.asinh())
}

fn acosh(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    if n < 1.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(n.acosh())
}

fn atanh(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    if n <= -1.0 || n >= 1.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(n.atanh())
}

fn cot(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    let t = n.tan();
    if t.abs() < EPSILON_NEAR_ZERO {
        return Err(ErrorKind::Div);
    }
    ok_num(1.0 / t)
}

fn sec(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let c = number_arg(args, 0)?.cos();
    if c.abs() < EPSILON_NEAR_ZERO {
        return Err(ErrorKind::Div);
    }
    ok_num(1.0 / c)
}

fn csc(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let s = number_arg(args, 0)?.sin();
    if s.abs() < EPSILON_NEAR_ZERO {
        return Err(ErrorKind::Div);
    }
    ok_num(1.0 / s)
}
