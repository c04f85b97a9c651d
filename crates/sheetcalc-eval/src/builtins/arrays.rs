//! Array functions. Each has a shape-aware core (its shape law) returning
//! the full rectangle; the registered flat wrapper slices its arguments by
//! arity, runs the core, and returns the top-left anchor cell.

use sheetcalc_common::{ErrorKind, Value};

use crate::builtins::math::aggregate::apply_code;
use crate::builtins::utils::opt_number_arg;
use crate::coercion::{to_boolean_lenient, to_integer};
use crate::context::CellContext;
use crate::criteria::eq_fold;
use crate::function::{FnCaps, FunctionDef};
use crate::registry::Registry;
use crate::shape::{ArrayResult, ArrayView, Shape};

pub(crate) fn register_builtins(reg: &mut Registry) {
    let array = FnCaps::PURE.union(FnCaps::ARRAY);
    for def in [
        FunctionDef::new("TRANSPOSE", 1, None, array, transpose_fn),
        FunctionDef::new("SORT", 1, None, array, sort_fn),
        FunctionDef::new("FILTER", 2, None, array, filter_fn),
        FunctionDef::new("UNIQUE", 1, None, array, unique_fn),
        FunctionDef::new("SEQUENCE", 1, Some(4), array, sequence_fn),
        FunctionDef::new("GROUPBY", 3, None, array, groupby_fn),
        FunctionDef::new("PIVOTBY", 4, None, array, pivotby_fn),
        FunctionDef::new("TRIMRANGE", 1, None, array, trimrange_fn),
        FunctionDef::new("ANCHORARRAY", 1, None, array, anchorarray),
    ] {
        reg.insert(def);
    }
}

/* ───────────────────────── ordering helpers ───────────────────────── */

/// Sort order across kinds: numbers, then text (case-folded), then
/// booleans, then errors, with empties last.
fn sort_rank(v: &Value) -> u8 {
    match v {
        Value::Number(_) => 0,
        Value::Text(_) => 1,
        Value::Boolean(_) => 2,
        Value::Error(_) => 3,
        Value::Empty => 4,
    }
}

fn value_cmp(a: &Value, b: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
        (Value::Text(x), Value::Text(y)) => {
            crate::criteria::fold_case(x).cmp(&crate::criteria::fold_case(y))
        }
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn value_order(a: &Value, b: &Value) -> std::cmp::Ordering {
    sort_rank(a).cmp(&sort_rank(b)).then_with(|| value_cmp(a, b))
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Text(x), Value::Text(y)) => eq_fold(x, y),
        _ => a == b,
    }
}

/* ───────────────────────── cores (shape laws) ───────────────────────── */

/// (r, c) → (c, r).
pub fn transpose(view: &ArrayView) -> ArrayResult {
    let shape = view.shape();
    let mut values = Vec::with_capacity(shape.len());
    for c in 0..shape.cols {
        for r in 0..shape.rows {
            values.push(view.get(r, c).clone());
        }
    }
    ArrayResult::new(values, shape.transposed())
}

/// (r, c) → (r, c), rows reordered by the 1-based sort column. `by_col`
/// sorts columns by the sort row instead.
pub fn sort(
    view: &ArrayView,
    sort_index: usize,
    descending: bool,
    by_col: bool,
) -> Result<ArrayResult, ErrorKind> {
    if by_col {
        let flipped = transpose(view);
        let inner = ArrayView::new(&flipped.values, flipped.shape)?;
        let sorted = sort(&inner, sort_index, descending, false)?;
        let back = ArrayView::new(&sorted.values, sorted.shape)?;
        return Ok(transpose(&back));
    }
    let shape = view.shape();
    if sort_index < 1 || sort_index > shape.cols {
        return Err(ErrorKind::Value);
    }
    let mut order: Vec<usize> = (0..shape.rows).collect();
    order.sort_by(|&a, &b| {
        let ord = value_order(view.get(a, sort_index - 1), view.get(b, sort_index - 1));
        if descending { ord.reverse() } else { ord }
    });
    let mut values = Vec::with_capacity(shape.len());
    for r in order {
        values.extend(view.row(r).iter().cloned());
    }
    Ok(ArrayResult::new(values, shape))
}

/// (r, c) × (r, 1) → (k, c) for the k rows whose include flag is truthy.
/// Empty selection is `#CALC!` unless `if_empty` is supplied.
pub fn filter_rows(
    data: &ArrayView,
    include: &ArrayView,
    if_empty: Option<&Value>,
) -> Result<ArrayResult, ErrorKind> {
    let shape = data.shape();
    if include.shape().rows != shape.rows || include.shape().cols != 1 {
        return Err(ErrorKind::Value);
    }
    let mut values = Vec::new();
    let mut kept = 0usize;
    for r in 0..shape.rows {
        let flag = include.get(r, 0);
        if let Value::Error(e) = flag {
            return Err(*e);
        }
        if to_boolean_lenient(flag)? {
            values.extend(data.row(r).iter().cloned());
            kept += 1;
        }
    }
    if kept == 0 {
        return match if_empty {
            Some(v) => Ok(ArrayResult::scalar(v.clone())),
            None => Err(ErrorKind::Calc),
        };
    }
    Ok(ArrayResult::new(values, Shape::new(kept, shape.cols)))
}

/// (r, c) → (k, c) distinct rows in first-seen order; `occurs_once`
/// keeps only rows that never repeat. `by_col` works on columns.
pub fn unique(
    view: &ArrayView,
    by_col: bool,
    occurs_once: bool,
) -> Result<ArrayResult, ErrorKind> {
    if by_col {
        let flipped = transpose(view);
        let inner = ArrayView::new(&flipped.values, flipped.shape)?;
        let out = unique(&inner, false, occurs_once)?;
        let back = ArrayView::new(&out.values, out.shape)?;
        return Ok(transpose(&back));
    }
    let shape = view.shape();
    let rows: Vec<&[Value]> = (0..shape.rows).map(|r| view.row(r)).collect();
    let row_eq = |a: &[Value], b: &[Value]| a.iter().zip(b).all(|(x, y)| value_eq(x, y));

    let mut kept: Vec<&[Value]> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let count = rows.iter().filter(|other| row_eq(row, other)).count();
        let first_seen = rows[..i].iter().all(|prior| !row_eq(row, prior));
        let keep = if occurs_once { count == 1 } else { first_seen };
        if keep {
            kept.push(row);
        }
    }
    if kept.is_empty() {
        return Err(ErrorKind::Calc);
    }
    let values: Vec<Value> = kept.iter().flat_map(|r| r.iter().cloned()).collect();
    let rows_out = kept.len();
    Ok(ArrayResult::new(values, Shape::new(rows_out, shape.cols)))
}

/// () → (rows, cols) arithmetic progression in row-major order.
pub fn sequence(rows: i64, cols: i64, start: f64, step: f64) -> Result<ArrayResult, ErrorKind> {
    if rows < 0 || cols < 0 {
        return Err(ErrorKind::Value);
    }
    if rows == 0 || cols == 0 {
        return Err(ErrorKind::Calc);
    }
    let total = (rows * cols) as usize;
    let values = (0..total)
        .map(|k| Value::Number(start + step * k as f64))
        .collect();
    Ok(ArrayResult::new(values, Shape::new(rows as usize, cols as usize)))
}

/// (r, 1) keys × (r, 1) values → (k, 2): distinct key, aggregated value.
pub fn group_by(
    keys: &ArrayView,
    values: &ArrayView,
    code: i64,
) -> Result<ArrayResult, ErrorKind> {
    if keys.shape() != values.shape() || keys.shape().cols != 1 {
        return Err(ErrorKind::Value);
    }
    let mut groups: Vec<(&Value, Vec<f64>)> = Vec::new();
    for r in 0..keys.shape().rows {
        let key = keys.get(r, 0);
        let sample = values.get(r, 0).as_number_strict();
        match groups.iter_mut().find(|(k, _)| value_eq(k, key)) {
            Some((_, xs)) => xs.extend(sample),
            None => groups.push((key, sample.into_iter().collect())),
        }
    }
    if groups.is_empty() {
        return Err(ErrorKind::Calc);
    }
    let mut out = Vec::with_capacity(groups.len() * 2);
    for (key, xs) in &groups {
        out.push((*key).clone());
        out.push(Value::Number(apply_code(code, xs)?));
    }
    let rows = groups.len();
    Ok(ArrayResult::new(out, Shape::new(rows, 2)))
}

/// (r,1) row keys × (r,1) column keys × (r,1) values →
/// (k+1, m+1) matrix with key headers and aggregated cells.
pub fn pivot_by(
    row_keys: &ArrayView,
    col_keys: &ArrayView,
    values: &ArrayView,
    code: i64,
) -> Result<ArrayResult, ErrorKind> {
    let shape = row_keys.shape();
    if shape.cols != 1 || col_keys.shape() != shape || values.shape() != shape {
        return Err(ErrorKind::Value);
    }
    let mut rks: Vec<&Value> = Vec::new();
    let mut cks: Vec<&Value> = Vec::new();
    for r in 0..shape.rows {
        if !rks.iter().any(|k| value_eq(k, row_keys.get(r, 0))) {
            rks.push(row_keys.get(r, 0));
        }
        if !cks.iter().any(|k| value_eq(k, col_keys.get(r, 0))) {
            cks.push(col_keys.get(r, 0));
        }
    }
    if rks.is_empty() {
        return Err(ErrorKind::Calc);
    }

    let mut out = Vec::with_capacity((rks.len() + 1) * (cks.len() + 1));
    out.push(Value::Empty);
    out.extend(cks.iter().map(|k| (*k).clone()));
    for rk in &rks {
        out.push((*rk).clone());
        for ck in &cks {
            let sample: Vec<f64> = (0..shape.rows)
                .filter(|&r| {
                    value_eq(row_keys.get(r, 0), rk) && value_eq(col_keys.get(r, 0), ck)
                })
                .filter_map(|r| values.get(r, 0).as_number_strict())
                .collect();
            out.push(if sample.is_empty() {
                Value::Empty
            } else {
                Value::Number(apply_code(code, &sample)?)
            });
        }
    }
    Ok(ArrayResult::new(out, Shape::new(rks.len() + 1, cks.len() + 1)))
}

/// Drops leading/trailing all-empty rows and columns.
pub fn trim_range(view: &ArrayView) -> Result<ArrayResult, ErrorKind> {
    let shape = view.shape();
    let row_used = |r: usize| (0..shape.cols).any(|c| !view.get(r, c).is_empty());
    let col_used = |c: usize| (0..shape.rows).any(|r| !view.get(r, c).is_empty());

    let Some(top) = (0..shape.rows).find(|&r| row_used(r)) else {
        return Err(ErrorKind::Calc);
    };
    let bottom = (0..shape.rows).rev().find(|&r| row_used(r)).unwrap_or(top);
    let left = (0..shape.cols).find(|&c| col_used(c)).unwrap_or(0);
    let right = (0..shape.cols).rev().find(|&c| col_used(c)).unwrap_or(left);

    let mut values = Vec::new();
    for r in top..=bottom {
        for c in left..=right {
            values.push(view.get(r, c).clone());
        }
    }
    Ok(ArrayResult::new(
        values,
        Shape::new(bottom - top + 1, right - left + 1),
    ))
}

/* ───────────────────────── flat wrappers ───────────────────────── */

fn transpose_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    Ok(transpose(&ArrayView::column(args)).anchor())
}

// All arguments are data; the column sorts ascending.
fn sort_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    Ok(sort(&ArrayView::column(args), 1, false, false)?.anchor())
}

// Odd argument count carries a trailing if_empty; the rest splits into
// data and include halves.
fn filter_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (body, if_empty) = if args.len() % 2 == 1 {
        (&args[..args.len() - 1], Some(&args[args.len() - 1]))
    } else {
        (args, None)
    };
    if body.len() < 2 {
        return Err(ErrorKind::Value);
    }
    let half = body.len() / 2;
    let data = ArrayView::column(&body[..half]);
    let include = ArrayView::column(&body[half..]);
    Ok(filter_rows(&data, &include, if_empty)?.anchor())
}

fn unique_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    Ok(unique(&ArrayView::column(args), false, false)?.anchor())
}

fn sequence_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let rows = to_integer(&args[0])?;
    let cols = match args.get(1) {
        None | Some(Value::Empty) => 1,
        Some(v) => to_integer(v)?,
    };
    let start = opt_number_arg(args, 2, 1.0)?;
    let step = opt_number_arg(args, 3, 1.0)?;
    Ok(sequence(rows, cols, start, step)?.anchor())
}

// GROUPBY(row_field…, values…, function)
fn groupby_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let code = to_integer(&args[args.len() - 1])?;
    let body = &args[..args.len() - 1];
    if body.len() < 2 || body.len() % 2 != 0 {
        return Err(ErrorKind::Value);
    }
    let half = body.len() / 2;
    let keys = ArrayView::column(&body[..half]);
    let values = ArrayView::column(&body[half..]);
    Ok(group_by(&keys, &values, code)?.anchor())
}

// PIVOTBY(row_field…, col_field…, values…, function)
fn pivotby_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let code = to_integer(&args[args.len() - 1])?;
    let body = &args[..args.len() - 1];
    if body.len() < 3 || body.len() % 3 != 0 {
        return Err(ErrorKind::Value);
    }
    let third = body.len() / 3;
    let rows = ArrayView::column(&body[..third]);
    let cols = ArrayView::column(&body[third..2 * third]);
    let values = ArrayView::column(&body[2 * third..]);
    Ok(pivot_by(&rows, &cols, &values, code)?.anchor())
}

fn trimrange_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    Ok(trim_range(&ArrayView::column(args))?.anchor())
}

// Identity on the anchor.
fn anchorarray(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    Ok(args[0].clone())
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
    fn transpose_shape_law() {
        let vals = [n(1.0), n(2.0), n(3.0), n(4.0), n(5.0), n(6.0)];
        let view = ArrayView::new(&vals, Shape::new(2, 3)).unwrap();
        let out = transpose(&view);
        assert_eq!(out.shape, Shape::new(3, 2));
        assert_eq!(out.values, vec![n(1.0), n(4.0), n(2.0), n(5.0), n(3.0), n(6.0)]);
    }

    #[test]
    fn sort_rows_by_column() {
        let vals = [n(3.0), t("c"), n(1.0), t("a"), n(2.0), t("b")];
        let view = ArrayView::new(&vals, Shape::new(3, 2)).unwrap();
        let out = sort(&view, 1, false, false).unwrap();
        assert_eq!(
            out.values,
            vec![n(1.0), t("a"), n(2.0), t("b"), n(3.0), t("c")]
        );
        let desc = sort(&view, 1, true, false).unwrap();
        assert_eq!(desc.values[0], n(3.0));
        assert_eq!(sort(&view, 3, false, false).unwrap_err(), ErrorKind::Value);
        // Text sorts after numbers, case-insensitively.
        let mixed = [t("b"), n(9.0), t("A")];
        let view = ArrayView::new(&mixed, Shape::column(3)).unwrap();
        let out = sort(&view, 1, false, false).unwrap();
        assert_eq!(out.values, vec![n(9.0), t("A"), t("b")]);
    }

    #[test]
    fn filter_keeps_truthy_rows() {
        let data = [n(10.0), n(20.0), n(30.0)];
        let include = [b(false), b(true), b(true)];
        let dv = ArrayView::new(&data, Shape::column(3)).unwrap();
        let iv = ArrayView::new(&include, Shape::column(3)).unwrap();
        let out = filter_rows(&dv, &iv, None).unwrap();
        assert_eq!(out.values, vec![n(20.0), n(30.0)]);

        let none = [b(false), b(false), b(false)];
        let nv = ArrayView::new(&none, Shape::column(3)).unwrap();
        assert_eq!(filter_rows(&dv, &nv, None).unwrap_err(), ErrorKind::Calc);
        let fallback = t("none");
        let out = filter_rows(&dv, &nv, Some(&fallback)).unwrap();
        assert_eq!(out.values, vec![t("none")]);

        // Errors in the include vector surface.
        let bad = [b(true), Value::Error(ErrorKind::Div), b(true)];
        let bv = ArrayView::new(&bad, Shape::column(3)).unwrap();
        assert_eq!(filter_rows(&dv, &bv, None).unwrap_err(), ErrorKind::Div);
    }

    #[test]
    fn unique_modes() {
        let vals = [n(1.0), n(2.0), n(1.0), n(3.0), n(2.0)];
        let view = ArrayView::new(&vals, Shape::column(5)).unwrap();
        let first = unique(&view, false, false).unwrap();
        assert_eq!(first.values, vec![n(1.0), n(2.0), n(3.0)]);
        let once = unique(&view, false, true).unwrap();
        assert_eq!(once.values, vec![n(3.0)]);
        // Case-folded text dedup.
        let words = [t("Ant"), t("ant"), t("bee")];
        let view = ArrayView::new(&words, Shape::column(3)).unwrap();
        let out = unique(&view, false, false).unwrap();
        assert_eq!(out.values, vec![t("Ant"), t("bee")]);
    }

    #[test]
    fn sequence_grid() {
        let out = sequence(2, 3, 5.0, 10.0).unwrap();
        assert_eq!(out.shape, Shape::new(2, 3));
        assert_eq!(
            out.values,
            vec![n(5.0), n(15.0), n(25.0), n(35.0), n(45.0), n(55.0)]
        );
        assert_eq!(sequence(-1, 1, 1.0, 1.0).unwrap_err(), ErrorKind::Value);
        assert_eq!(sequence(0, 1, 1.0, 1.0).unwrap_err(), ErrorKind::Calc);
    }

    #[test]
    fn groupby_aggregates() {
        let keys = [t("a"), t("b"), t("a"), t("b")];
        let vals = [n(1.0), n(10.0), n(2.0), n(20.0)];
        let kv = ArrayView::new(&keys, Shape::column(4)).unwrap();
        let vv = ArrayView::new(&vals, Shape::column(4)).unwrap();
        // Code 9 = SUM.
        let out = group_by(&kv, &vv, 9).unwrap();
        assert_eq!(out.shape, Shape::new(2, 2));
        assert_eq!(out.values, vec![t("a"), n(3.0), t("b"), n(30.0)]);
    }

    #[test]
    fn pivotby_matrix() {
        let rows = [t("x"), t("x"), t("y")];
        let cols = [t("p"), t("q"), t("p")];
        let vals = [n(1.0), n(2.0), n(3.0)];
        let rv = ArrayView::new(&rows, Shape::column(3)).unwrap();
        let cv = ArrayView::new(&cols, Shape::column(3)).unwrap();
        let vv = ArrayView::new(&vals, Shape::column(3)).unwrap();
        let out = pivot_by(&rv, &cv, &vv, 9).unwrap();
        assert_eq!(out.shape, Shape::new(3, 3));
        // Header row, then x: {p:1, q:2}, y: {p:3, q:empty}.
        assert_eq!(
            out.values,
            vec![
                Value::Empty,
                t("p"),
                t("q"),
                t("x"),
                n(1.0),
                n(2.0),
                t("y"),
                n(3.0),
                Value::Empty,
            ]
        );
    }

    #[test]
    fn trimrange_drops_empty_edges() {
        let vals = [
            Value::Empty,
            Value::Empty,
            Value::Empty,
            Value::Empty,
            n(1.0),
            n(2.0),
            Value::Empty,
            Value::Empty,
            Value::Empty,
        ];
        let view = ArrayView::new(&vals, Shape::new(3, 3)).unwrap();
        let out = trim_range(&view).unwrap();
        assert_eq!(out.shape, Shape::new(1, 2));
        assert_eq!(out.values, vec![n(1.0), n(2.0)]);

        let empty = [Value::Empty, Value::Empty];
        let view = ArrayView::new(&empty, Shape::column(2)).unwrap();
        assert_eq!(trim_range(&view).unwrap_err(), ErrorKind::Calc);
    }

    #[test]
    fn flat_wrappers_return_anchors() {
        let g = TestGrid::new();
        assert_eq!(invoke("TRANSPOSE", &g, &[n(7.0), n(8.0)]), n(7.0));
        assert_eq!(invoke("SORT", &g, &[n(3.0), n(1.0), n(2.0)]), n(1.0));
        assert_eq!(
            invoke("FILTER", &g, &[n(5.0), n(6.0), b(false), b(true)]),
            n(6.0)
        );
        assert_eq!(
            invoke("FILTER", &g, &[n(5.0), n(6.0), b(false), b(false)]),
            Value::Error(ErrorKind::Calc)
        );
        assert_eq!(
            invoke("FILTER", &g, &[n(5.0), n(6.0), b(false), b(false), t("nope")]),
            t("nope")
        );
        assert_eq!(invoke("UNIQUE", &g, &[n(4.0), n(4.0), n(5.0)]), n(4.0));
        assert_eq!(invoke("SEQUENCE", &g, &[n(3.0)]), n(1.0));
        assert_eq!(invoke("SEQUENCE", &g, &[n(3.0), n(1.0), n(9.0), n(2.0)]), n(9.0));
        assert_eq!(
            invoke("GROUPBY", &g, &[t("k"), t("k"), n(2.0), n(3.0), n(9.0)]),
            t("k")
        );
        assert_eq!(
            invoke(
                "PIVOTBY",
                &g,
                &[t("r"), t("c"), n(5.0), n(9.0)]
            ),
            Value::Empty
        );
        assert_eq!(
            invoke("TRIMRANGE", &g, &[Value::Empty, n(9.0), Value::Empty]),
            n(9.0)
        );
        assert_eq!(invoke("ANCHORARRAY", &g, &[n(42.0), n(1.0)]), n(42.0));
    }
}
