//! Elementwise numeric functions: absolute value, rounding in its many
//! dialects, modulo, parity rounding, logarithms and powers.

use sheetcalc_common::{ErrorKind, Value};

use crate::builtins::utils::{number_arg, ok_num, opt_number_arg};
use crate::context::CellContext;
use crate::function::{FnCaps, FunctionDef};
use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("ABS", 1, Some(1), FnCaps::PURE, abs),
        FunctionDef::new("SIGN", 1, Some(1), FnCaps::PURE, sign),
        FunctionDef::new("INT", 1, Some(1), FnCaps::PURE, int),
        FunctionDef::new("TRUNC", 1, Some(2), FnCaps::PURE, trunc),
        FunctionDef::new("ROUND", 2, Some(2), FnCaps::PURE, round),
        FunctionDef::new("ROUNDUP", 2, Some(2), FnCaps::PURE, roundup),
        FunctionDef::new("ROUNDDOWN", 2, Some(2), FnCaps::PURE, rounddown),
        FunctionDef::new("MROUND", 2, Some(2), FnCaps::PURE, mround),
        FunctionDef::new("CEILING", 2, Some(2), FnCaps::PURE, ceiling),
        FunctionDef::new("CEILING.MATH", 1, Some(3), FnCaps::PURE, ceiling_math),
        FunctionDef::new("CEILING.PRECISE", 1, Some(2), FnCaps::PURE, ceiling_precise),
        FunctionDef::new("ISO.CEILING", 1, Some(2), FnCaps::PURE, ceiling_precise),
        FunctionDef::new("FLOOR", 2, Some(2), FnCaps::PURE, floor),
        FunctionDef::new("FLOOR.MATH", 1, Some(3), FnCaps::PURE, floor_math),
        FunctionDef::new("FLOOR.PRECISE", 1, Some(2), FnCaps::PURE, floor_precise),
        FunctionDef::new("MOD", 2, Some(2), FnCaps::PURE, mod_fn),
        FunctionDef::new("QUOTIENT", 2, Some(2), FnCaps::PURE, quotient),
        FunctionDef::new("EVEN", 1, Some(1), FnCaps::PURE, even),
        FunctionDef::new("ODD", 1, Some(1), FnCaps::PURE, odd),
        FunctionDef::new("SQRT", 1, Some(1), FnCaps::PURE, sqrt),
        FunctionDef::new("SQRTPI", 1, Some(1), FnCaps::PURE, sqrtpi),
        FunctionDef::new("EXP", 1, Some(1), FnCaps::PURE, exp),
        FunctionDef::new("LN", 1, Some(1), FnCaps::PURE, ln),
        FunctionDef::new("LOG", 1, Some(2), FnCaps::PURE, log),
        FunctionDef::new("LOG10", 1, Some(1), FnCaps::PURE, log10),
        FunctionDef::new("POWER", 2, Some(2), FnCaps::PURE, power),
    ] {
        reg.insert(def);
    }
}

fn abs(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(number_arg(args, 0)?.abs())
}

fn sign(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    ok_num(if n > 0.0 {
        1.0
    } else if n < 0.0 {
        -1.0
    } else {
        0.0
    })
}

// floor toward -inf
fn int(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(number_arg(args, 0)?.floor())
}

fn trunc(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    let digits = opt_number_arg(args, 1, 0.0)?.trunc() as i32;
    let factor = 10f64.powi(digits);
    ok_num((n * factor).trunc() / factor)
}

/// Halves round away from zero; Rust's `f64::round` already does.
fn round_at(n: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (n * factor).round() / factor
}

fn round(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    let digits = number_arg(args, 1)?.trunc() as i32;
    ok_num(round_at(n, digits))
}

fn roundup(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    let digits = number_arg(args, 1)?.trunc() as i32;
    let factor = 10f64.powi(digits);
    ok_num(n.signum() * (n.abs() * factor).ceil() / factor)
}

fn rounddown(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    let digits = number_arg(args, 1)?.trunc() as i32;
    let factor = 10f64.powi(digits);
    ok_num(n.signum() * (n.abs() * factor).floor() / factor)
}

fn mround(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    let multiple = number_arg(args, 1)?;
    if multiple == 0.0 || n * multiple < 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num((n / multiple).round() * multiple)
}

fn ceiling(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    let sig = number_arg(args, 1)?;
    if sig == 0.0 {
        return ok_num(0.0);
    }
    if n > 0.0 && sig < 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num((n / sig).ceil() * sig)
}

fn floor(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    let sig = number_arg(args, 1)?;
    if sig == 0.0 {
        return Err(ErrorKind::Div);
    }
    if n > 0.0 && sig < 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num((n / sig).floor() * sig)
}

/// Negative input under the .MATH rules: mode 0 rounds toward zero, any
/// other mode rounds away from zero.
fn negative_directed(n: f64, s: f64, mode: f64) -> f64 {
    let q = n.abs() / s;
    let steps = if mode != 0.0 { q.ceil() } else { q.floor() };
    -steps * s
}

fn ceiling_math(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    let sig = opt_number_arg(args, 1, 1.0)?;
    let mode = opt_number_arg(args, 2, 0.0)?;
    let s = sig.abs();
    if s == 0.0 {
        return ok_num(0.0);
    }
    if n >= 0.0 {
        return ok_num((n / s).ceil() * s);
    }
    ok_num(negative_directed(n, s, mode))
}

fn floor_math(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    let sig = opt_number_arg(args, 1, 1.0)?;
    let mode = opt_number_arg(args, 2, 0.0)?;
    let s = sig.abs();
    if s == 0.0 {
        return ok_num(0.0);
    }
    if n >= 0.0 {
        return ok_num((n / s).floor() * s);
    }
    ok_num(negative_directed(n, s, mode))
}

/// Toward +∞ regardless of signs; significance sign ignored.
fn ceiling_precise(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    let s = opt_number_arg(args, 1, 1.0)?.abs();
    if s == 0.0 {
        return ok_num(0.0);
    }
    ok_num((n / s).ceil() * s)
}

/// Toward −∞ regardless of signs; significance sign ignored.
fn floor_precise(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    let s = opt_number_arg(args, 1, 1.0)?.abs();
    if s == 0.0 {
        return ok_num(0.0);
    }
    ok_num((n / s).floor() * s)
}

fn mod_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    let d = number_arg(args, 1)?;
    if d == 0.0 {
        return Err(ErrorKind::Div);
    }
    // Sign follows the divisor.
    ok_num(n - d * (n / d).floor())
}

fn quotient(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    let d = number_arg(args, 1)?;
    if d == 0.0 {
        return Err(ErrorKind::Div);
    }
    ok_num((n / d).trunc())
}

fn even(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    let magnitude = (n.abs() / 2.0).ceil() * 2.0;
    ok_num(if n < 0.0 { -magnitude } else { magnitude })
}

fn odd(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    let m = n.abs();
    let magnitude = if m <= 1.0 { 1.0 } else { ((m - 1.0) / 2.0).ceil() * 2.0 + 1.0 };
    ok_num(if n < 0.0 { -magnitude } else { magnitude })
}

fn sqrt(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    if n < 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(n.sqrt())
}

fn sqrtpi(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    if n < 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num((n * std::f64::consts::PI).sqrt())
}

fn exp(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(number_arg(args, 0)?.exp())
}

fn ln(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    if n <= 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(n.ln())
}

fn log(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    let base = opt_number_arg(args, 1, 10.0)?;
    if n <= 0.0 || base <= 0.0 {
        return Err(ErrorKind::Num);
    }
    if base == 1.0 {
        return Err(ErrorKind::Div);
    }
    ok_num(n.ln() / base.ln())
}

fn log10(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    if n <= 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(n.log10())
}

fn power(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let base = number_arg(args, 0)?;
    let expo = number_arg(args, 1)?;
    if base == 0.0 {
        if expo == 0.0 {
            return Err(ErrorKind::Num);
        }
        if expo < 0.0 {
            return Err(ErrorKind::Div);
        }
    }
    if base < 0.0 && expo.fract() != 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(base.powf(expo))
}
