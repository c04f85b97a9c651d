//! Logical functions: IF and friends, the error-catching pair, IFS and
//! SWITCH, and the boolean folds.

use sheetcalc_common::{ErrorKind, Value};

use crate::builtins::utils::ok_bool;
use crate::coercion::to_boolean_lenient;
use crate::context::CellContext;
use crate::criteria::eq_fold;
use crate::function::{FnCaps, FunctionDef};
use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("TRUE", 0, Some(0), FnCaps::PURE, true_fn),
        FunctionDef::new("FALSE", 0, Some(0), FnCaps::PURE, false_fn),
        FunctionDef::new("IF", 2, Some(3), FnCaps::PURE, if_fn),
        FunctionDef::new("IFERROR", 2, Some(2), FnCaps::ERROR_AWARE, iferror),
        FunctionDef::new("IFNA", 2, Some(2), FnCaps::ERROR_AWARE, ifna),
        FunctionDef::new("IFS", 2, None, FnCaps::PURE, ifs),
        FunctionDef::new("SWITCH", 3, None, FnCaps::PURE, switch),
        FunctionDef::new("AND", 1, None, FnCaps::PURE, and),
        FunctionDef::new("OR", 1, None, FnCaps::PURE, or),
        FunctionDef::new("NOT", 1, Some(1), FnCaps::PURE, not),
        FunctionDef::new("XOR", 1, None, FnCaps::PURE, xor),
    ] {
        reg.insert(def);
    }
}

fn true_fn(_: &dyn CellContext, _: &[Value]) -> Result<Value, ErrorKind> {
    ok_bool(true)
}

fn false_fn(_: &dyn CellContext, _: &[Value]) -> Result<Value, ErrorKind> {
    ok_bool(false)
}

fn if_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let cond = to_boolean_lenient(&args[0])?;
    Ok(if cond {
        args[1].clone()
    } else {
        args.get(2).cloned().unwrap_or(Value::Boolean(false))
    })
}

fn iferror(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    Ok(if args[0].is_error() { args[1].clone() } else { args[0].clone() })
}

fn ifna(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    Ok(match &args[0] {
        Value::Error(ErrorKind::Na) => args[1].clone(),
        other => other.clone(),
    })
}

// (condition, value)⁺; the first truthy condition wins.
fn ifs(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    if args.len() % 2 != 0 {
        return Err(ErrorKind::Value);
    }
    for pair in args.chunks_exact(2) {
        if to_boolean_lenient(&pair[0])? {
            return Ok(pair[1].clone());
        }
    }
    Err(ErrorKind::Na)
}

/// Case-insensitive match for text, strict variant-and-value match for
/// everything else.
fn switch_matches(expr: &Value, case: &Value) -> bool {
    match (expr, case) {
        (Value::Text(a), Value::Text(b)) => eq_fold(a, b),
        (a, b) => a == b,
    }
}

// SWITCH(expr, (case, value)⁺ [, default])
fn switch(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let expr = &args[0];
    let rest = &args[1..];
    let (pairs, default) = if rest.len() % 2 == 1 {
        (&rest[..rest.len() - 1], Some(&rest[rest.len() - 1]))
    } else {
        (rest, None)
    };
    for pair in pairs.chunks_exact(2) {
        if switch_matches(expr, &pair[0]) {
            return Ok(pair[1].clone());
        }
    }
    match default {
        Some(v) => Ok(v.clone()),
        None => Err(ErrorKind::Na),
    }
}

/// Boolean fold input: empties are skipped, everything else must coerce.
fn booleans(args: &[Value]) -> Result<Vec<bool>, ErrorKind> {
    let mut out = Vec::with_capacity(args.len());
    for v in args {
        if v.is_empty() {
            continue;
        }
        out.push(to_boolean_lenient(v)?);
    }
    if out.is_empty() {
        return Err(ErrorKind::Value);
    }
    Ok(out)
}

fn and(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_bool(booleans(args)?.into_iter().all(|b| b))
}

fn or(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_bool(booleans(args)?.into_iter().any(|b| b))
}

fn not(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_bool(!to_boolean_lenient(&args[0])?)
}

// Odd number of truthy values.
fn xor(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let truthy = booleans(args)?.into_iter().filter(|&b| b).count();
    ok_bool(truthy % 2 == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::invoke;
    use crate::test_grid::TestGrid;

    fn n(x: f64) -> Value {
        Value::Number(x)
    }
    fn t(s: &str) -> Value {
        Value::text(s)
    }
    fn b(v: bool) -> Value {
        Value::Boolean(v)
    }

    #[test]
    fn if_basics() {
        let g = TestGrid::new();
        assert_eq!(invoke("IF", &g, &[b(true), t("yes"), t("no")]), t("yes"));
        assert_eq!(invoke("IF", &g, &[n(0.0), t("yes"), t("no")]), t("no"));
        assert_eq!(invoke("IF", &g, &[b(false), t("yes")]), b(false));
        assert_eq!(
            invoke("IF", &g, &[t("maybe"), t("yes"), t("no")]),
            Value::Error(ErrorKind::Value)
        );
    }

    #[test]
    fn error_catchers() {
        let g = TestGrid::new();
        let div = Value::Error(ErrorKind::Div);
        let na = Value::Error(ErrorKind::Na);
        assert_eq!(invoke("IFERROR", &g, &[div.clone(), t("alt")]), t("alt"));
        assert_eq!(invoke("IFERROR", &g, &[n(5.0), t("alt")]), n(5.0));
        assert_eq!(invoke("IFNA", &g, &[na, t("alt")]), t("alt"));
        // IFNA only catches #N/A.
        assert_eq!(invoke("IFNA", &g, &[div.clone(), t("alt")]), div);
    }

    #[test]
    fn ifs_and_switch() {
        let g = TestGrid::new();
        assert_eq!(
            invoke("IFS", &g, &[b(false), t("A"), b(true), t("B")]),
            t("B")
        );
        assert_eq!(
            invoke("IFS", &g, &[b(false), t("A"), b(false), t("B")]),
            Value::Error(ErrorKind::Na)
        );
        assert_eq!(
            invoke("IFS", &g, &[b(true), t("A"), b(false)]),
            Value::Error(ErrorKind::Value)
        );

        assert_eq!(
            invoke("SWITCH", &g, &[n(5.0), n(1.0), t("One"), n(2.0), t("Two"), t("Other")]),
            t("Other")
        );
        assert_eq!(
            invoke("SWITCH", &g, &[n(5.0), n(1.0), t("One"), n(2.0), t("Two")]),
            Value::Error(ErrorKind::Na)
        );
        assert_eq!(
            invoke("SWITCH", &g, &[t("B"), t("a"), n(1.0), t("b"), n(2.0)]),
            n(2.0)
        );
        // Strict type matching for non-text: the number 1 is not TRUE.
        assert_eq!(
            invoke("SWITCH", &g, &[n(1.0), b(true), t("bool"), n(1.0), t("num")]),
            t("num")
        );
    }

    #[test]
    fn boolean_folds() {
        let g = TestGrid::new();
        assert_eq!(invoke("AND", &g, &[b(true), n(1.0), t("TRUE")]), b(true));
        assert_eq!(invoke("AND", &g, &[b(true), n(0.0)]), b(false));
        assert_eq!(invoke("OR", &g, &[b(false), n(0.0)]), b(false));
        assert_eq!(invoke("OR", &g, &[b(false), n(2.0)]), b(true));
        assert_eq!(invoke("NOT", &g, &[b(false)]), b(true));
        assert_eq!(
            invoke("AND", &g, &[t("nope")]),
            Value::Error(ErrorKind::Value)
        );
        // Empties are skipped by the folds.
        assert_eq!(invoke("AND", &g, &[b(true), Value::Empty]), b(true));
    }

    #[test]
    fn xor_parity() {
        let g = TestGrid::new();
        assert_eq!(invoke("XOR", &g, &[b(true)]), b(true));
        assert_eq!(invoke("XOR", &g, &[b(true), b(true)]), b(false));
        assert_eq!(invoke("XOR", &g, &[b(true), b(true), b(true)]), b(true));
        assert_eq!(invoke("XOR", &g, &[b(false), b(false)]), b(false));
    }
}
