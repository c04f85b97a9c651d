//! Reference and lookup functions: OFFSET/INDIRECT dereference cells via
//! the context, ROW/COLUMN report positions, ADDRESS renders references,
//! and CHOOSE/INDEX/MATCH/LOOKUP search the flattened argument list.

use sheetcalc_common::{ErrorKind, Value};

use crate::builtins::utils::{int_arg, ok_num, ok_text, opt_bool_arg, opt_int_arg};
use crate::coercion::to_integer;
use crate::context::CellContext;
use crate::criteria::{eq_fold, fold_case};
use crate::function::{FnCaps, FunctionDef};
use crate::reference::{Notation, format_address, parse_reference};
use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("OFFSET", 3, Some(5), FnCaps::VOLATILE, offset),
        FunctionDef::new("INDIRECT", 1, Some(2), FnCaps::VOLATILE, indirect),
        FunctionDef::new("ROW", 0, Some(1), FnCaps::PURE, row),
        FunctionDef::new("COLUMN", 0, Some(1), FnCaps::PURE, column),
        FunctionDef::new("ROWS", 1, None, FnCaps::PURE, rows),
        FunctionDef::new("COLUMNS", 1, None, FnCaps::PURE, columns),
        FunctionDef::new("ADDRESS", 2, Some(5), FnCaps::PURE, address),
        FunctionDef::new("CHOOSE", 2, None, FnCaps::PURE, choose),
        FunctionDef::new("INDEX", 2, None, FnCaps::PURE, index),
        FunctionDef::new("MATCH", 2, None, FnCaps::PURE, match_fn),
        FunctionDef::new("LOOKUP", 2, None, FnCaps::PURE, lookup),
    ] {
        reg.insert(def);
    }
}

fn ref_text_arg(v: &Value) -> Result<&str, ErrorKind> {
    match v {
        Value::Text(s) => Ok(s),
        Value::Error(e) => Err(*e),
        _ => Err(ErrorKind::Value),
    }
}

// OFFSET(ref, rows, cols[, height=1[, width=1]]) — anchor-cell read of
// the shifted window.
fn offset(ctx: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let base = parse_reference(ref_text_arg(&args[0])?, Notation::A1, ctx.current_cell())
        .map_err(|_| ErrorKind::Ref)?;
    let rows = int_arg(args, 1)?;
    let cols = int_arg(args, 2)?;
    let height = opt_int_arg(args, 3, 1)?;
    let width = opt_int_arg(args, 4, 1)?;
    if height < 1 || width < 1 {
        return Err(ErrorKind::Ref);
    }

    let row = base.row as i64 + rows;
    let col = base.col as i64 + cols;
    let (max_row, max_col) = ctx.worksheet_bounds();
    if row < 1
        || col < 1
        || row + height - 1 > max_row as i64
        || col + width - 1 > max_col as i64
    {
        return Err(ErrorKind::Ref);
    }
    Ok(ctx.read(row as u32, col as u32))
}

// INDIRECT(ref_text[, a1=TRUE]) — sheet qualifiers are accepted and
// ignored (single-sheet context).
fn indirect(ctx: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let text = ref_text_arg(&args[0])?;
    let a1 = opt_bool_arg(args, 1, true)?;
    let notation = if a1 { Notation::A1 } else { Notation::R1C1 };
    let parsed = parse_reference(text, notation, ctx.current_cell())?;
    Ok(ctx.read(parsed.row, parsed.col))
}

fn row(ctx: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    match args.first() {
        Some(v) => {
            let parsed = parse_reference(ref_text_arg(v)?, Notation::A1, ctx.current_cell())?;
            ok_num(parsed.row as f64)
        }
        None => match ctx.current_cell() {
            Some((r, _)) => ok_num(r as f64),
            None => Err(ErrorKind::Value),
        },
    }
}

fn column(ctx: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    match args.first() {
        Some(v) => {
            let parsed = parse_reference(ref_text_arg(v)?, Notation::A1, ctx.current_cell())?;
            ok_num(parsed.col as f64)
        }
        None => match ctx.current_cell() {
            Some((_, c)) => ok_num(c as f64),
            None => Err(ErrorKind::Value),
        },
    }
}

// Flat arrays are column vectors: N rows, one column.
fn rows(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(args.len() as f64)
}

fn columns(_: &dyn CellContext, _args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(1.0)
}

// ADDRESS(row, col[, abs_num=1[, a1=TRUE[, sheet]]])
fn address(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let row = int_arg(args, 0)?;
    let col = int_arg(args, 1)?;
    let abs_num = opt_int_arg(args, 2, 1)?;
    let a1 = opt_bool_arg(args, 3, true)?;
    let sheet = match args.get(4) {
        None | Some(Value::Empty) => None,
        Some(v) => Some(v.as_text()?),
    };
    if row < 1 || col < 1 || !(1..=4).contains(&abs_num) {
        return Err(ErrorKind::Value);
    }
    let text = format_address(
        u32::try_from(row).map_err(|_| ErrorKind::Value)?,
        u32::try_from(col).map_err(|_| ErrorKind::Value)?,
        abs_num as u8,
        a1,
        sheet.as_deref(),
    )?;
    ok_text(text)
}

fn choose(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let k = to_integer(&args[0])?;
    if k < 1 || k as usize >= args.len() {
        return Err(ErrorKind::Value);
    }
    Ok(args[k as usize].clone())
}

// INDEX(array…, k): 1-based position in the flattened column.
fn index(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let k = to_integer(&args[args.len() - 1])?;
    let data = &args[..args.len() - 1];
    if k < 1 {
        return Err(ErrorKind::Value);
    }
    data.get(k as usize - 1).cloned().ok_or(ErrorKind::Ref)
}

/// Lenient ordering used by MATCH/LOOKUP: numeric when both sides read
/// as numbers, case-folded text otherwise.
fn cmp_values(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    let num = |v: &Value| match v {
        Value::Number(n) => Some(*n),
        Value::Boolean(x) => Some(if *x { 1.0 } else { 0.0 }),
        _ => None,
    };
    if let (Some(x), Some(y)) = (num(a), num(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Value::Text(x), Value::Text(y)) => Some(fold_case(x).cmp(&fold_case(y))),
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Text(x), Value::Text(y)) => eq_fold(x, y),
        _ => cmp_values(a, b) == Some(std::cmp::Ordering::Equal),
    }
}

// MATCH(lookup, array…): largest value ≤ lookup (Excel's default
// match_type 1), exact hits returned immediately.
fn match_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let needle = &args[0];
    let data = &args[1..];
    let mut best: Option<(usize, &Value)> = None;
    for (i, v) in data.iter().enumerate() {
        if values_equal(v, needle) {
            return ok_num((i + 1) as f64);
        }
        if cmp_values(v, needle) == Some(std::cmp::Ordering::Less) {
            let better = match best {
                Some((_, bv)) => cmp_values(v, bv) == Some(std::cmp::Ordering::Greater),
                None => true,
            };
            if better {
                best = Some((i, v));
            }
        }
    }
    match best {
        Some((i, _)) => ok_num((i + 1) as f64),
        None => Err(ErrorKind::Na),
    }
}

// Legacy LOOKUP. Even tail = (lookup vector, result vector) halves; odd
// tail = one vector serving both roles. Binary search for the last value
// ≤ the key; unsorted data gives an unspecified (but safe) pick.
fn lookup(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let key = &args[0];
    let rest = &args[1..];
    let (haystack, results) = if rest.len() % 2 == 0 {
        let half = rest.len() / 2;
        (&rest[..half], &rest[half..])
    } else {
        (rest, rest)
    };
    if haystack.is_empty() {
        return Err(ErrorKind::Na);
    }

    let mut lo = 0usize;
    let mut hi = haystack.len();
    while lo < hi {
        let mid = (lo + hi) / 2;
        match cmp_values(&haystack[mid], key) {
            Some(std::cmp::Ordering::Greater) | None => hi = mid,
            _ => lo = mid + 1,
        }
    }
    if lo == 0 {
        return Err(ErrorKind::Na);
    }
    Ok(results[lo - 1].clone())
}
