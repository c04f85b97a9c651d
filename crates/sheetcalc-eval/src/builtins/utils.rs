//! Argument plumbing shared by the builtin modules.

use sheetcalc_common::{ErrorKind, Value};

use crate::coercion::{to_boolean_lenient, to_integer, to_number_lenient, to_text};

pub fn ok_num(n: f64) -> Result<Value, ErrorKind> {
    Ok(Value::Number(n))
}

pub fn ok_text(s: String) -> Result<Value, ErrorKind> {
    Ok(Value::Text(s))
}

pub fn ok_bool(b: bool) -> Result<Value, ErrorKind> {
    Ok(Value::Boolean(b))
}

pub fn number_arg(args: &[Value], i: usize) -> Result<f64, ErrorKind> {
    to_number_lenient(&args[i])
}

/// Optional numeric argument: missing or `Empty` falls back to `default`.
pub fn opt_number_arg(args: &[Value], i: usize, default: f64) -> Result<f64, ErrorKind> {
    match args.get(i) {
        None | Some(Value::Empty) => Ok(default),
        Some(v) => to_number_lenient(v),
    }
}

pub fn int_arg(args: &[Value], i: usize) -> Result<i64, ErrorKind> {
    to_integer(&args[i])
}

pub fn opt_int_arg(args: &[Value], i: usize, default: i64) -> Result<i64, ErrorKind> {
    match args.get(i) {
        None | Some(Value::Empty) => Ok(default),
        Some(v) => to_integer(v),
    }
}

pub fn text_arg(args: &[Value], i: usize) -> Result<String, ErrorKind> {
    to_text(&args[i])
}

pub fn opt_text_arg(args: &[Value], i: usize, default: &str) -> Result<String, ErrorKind> {
    match args.get(i) {
        None | Some(Value::Empty) => Ok(default.to_string()),
        Some(v) => to_text(v),
    }
}

pub fn opt_bool_arg(args: &[Value], i: usize, default: bool) -> Result<bool, ErrorKind> {
    match args.get(i) {
        None | Some(Value::Empty) => Ok(default),
        Some(v) => to_boolean_lenient(v),
    }
}

/// SUM-style fold input: every argument coerced leniently, empties skipped,
/// non-numeric text is `#VALUE!`.
pub fn fold_numbers(args: &[Value]) -> Result<Vec<f64>, ErrorKind> {
    let mut out = Vec::with_capacity(args.len());
    for v in args {
        if v.is_empty() {
            continue;
        }
        out.push(to_number_lenient(v)?);
    }
    Ok(out)
}

/// Statistics-style sample: numbers only; text, booleans and empties are
/// skipped silently.
pub fn numeric_samples(args: &[Value]) -> Vec<f64> {
    args.iter().filter_map(Value::as_number_strict).collect()
}

/// `*A`-variant sample: text counts as 0, booleans as 1/0, empties skipped.
pub fn numeric_samples_a(args: &[Value]) -> Vec<f64> {
    args.iter()
        .filter_map(|v| match v {
            Value::Number(n) => Some(*n),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(_) => Some(0.0),
            Value::Empty | Value::Error(_) => None,
        })
        .collect()
}
