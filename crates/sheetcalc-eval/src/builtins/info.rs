//! Information functions. The IS-predicates inspect rather than compute,
//! so they see errors instead of propagating them.

use sheetcalc_common::{ErrorKind, Value};

use crate::builtins::utils::{ok_bool, ok_num};
use crate::context::CellContext;
use crate::function::{FnCaps, FunctionDef};
use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    let caps = FnCaps::ERROR_AWARE;
    for def in [
        FunctionDef::new("ISNUMBER", 1, Some(1), caps, isnumber),
        FunctionDef::new("ISTEXT", 1, Some(1), caps, istext),
        FunctionDef::new("ISNONTEXT", 1, Some(1), caps, isnontext),
        FunctionDef::new("ISBLANK", 1, Some(1), caps, isblank),
        FunctionDef::new("ISLOGICAL", 1, Some(1), caps, islogical),
        FunctionDef::new("ISERROR", 1, Some(1), caps, iserror),
        FunctionDef::new("ISERR", 1, Some(1), caps, iserr),
        FunctionDef::new("ISNA", 1, Some(1), caps, isna),
        FunctionDef::new("ISEVEN", 1, Some(1), caps, iseven),
        FunctionDef::new("ISODD", 1, Some(1), caps, isodd),
        FunctionDef::new("TYPE", 1, None, caps, type_fn),
        FunctionDef::new("ERROR.TYPE", 1, Some(1), caps, error_type),
        FunctionDef::new("N", 1, Some(1), FnCaps::PURE, n_fn),
        FunctionDef::new("NA", 0, Some(0), FnCaps::PURE, na),
        FunctionDef::new("AREAS", 1, Some(1), FnCaps::PURE, areas),
    ] {
        reg.insert(def);
    }
}

fn isnumber(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_bool(args[0].is_number())
}

fn istext(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_bool(args[0].is_text())
}

fn isnontext(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_bool(!args[0].is_text())
}

fn isblank(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_bool(args[0].is_empty())
}

fn islogical(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_bool(args[0].is_boolean())
}

fn iserror(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_bool(args[0].is_error())
}

// Every error except #N/A.
fn iserr(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_bool(matches!(args[0], Value::Error(k) if k != ErrorKind::Na))
}

fn isna(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_bool(matches!(args[0], Value::Error(ErrorKind::Na)))
}

// Predicates never propagate; an error is neither even nor odd.
fn iseven(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    if args[0].is_error() {
        return ok_bool(false);
    }
    ok_bool(args[0].as_number_coerced()?.trunc() as i64 % 2 == 0)
}

fn isodd(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    if args[0].is_error() {
        return ok_bool(false);
    }
    ok_bool((args[0].as_number_coerced()?.trunc() as i64).rem_euclid(2) == 1)
}

// 1 number (including empty), 2 text, 4 boolean, 16 error; 64 when the
// call carries more than one value (the flat reading of an array).
fn type_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    if args.len() > 1 {
        return ok_num(64.0);
    }
    ok_num(match &args[0] {
        Value::Number(_) | Value::Empty => 1.0,
        Value::Text(_) => 2.0,
        Value::Boolean(_) => 4.0,
        Value::Error(_) => 16.0,
    })
}

fn error_type(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    match &args[0] {
        Value::Error(k) => ok_num(k.type_code() as f64),
        _ => Err(ErrorKind::Na),
    }
}

fn n_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(match &args[0] {
        Value::Number(x) => *x,
        Value::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    })
}

fn na(_: &dyn CellContext, _: &[Value]) -> Result<Value, ErrorKind> {
    Err(ErrorKind::Na)
}

// The scalar surface presents exactly one area per reference.
fn areas(_: &dyn CellContext, _: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(1.0)
}
