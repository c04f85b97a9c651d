//! Order statistics: LARGE/SMALL, the percentile/quartile family, RANK,
//! and FREQUENCY.
//!
//! The interpolating percentile helpers are shared with AGGREGATE's codes
//! 14–19.

use sheetcalc_common::{ErrorKind, Value};

use crate::builtins::utils::{numeric_samples, number_arg, ok_num};
use crate::coercion::to_integer;
use crate::context::CellContext;
use crate::function::{FnCaps, FunctionDef};
use crate::registry::Registry;
use crate::shape::ArrayResult;

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("LARGE", 2, None, FnCaps::PURE, large),
        FunctionDef::new("SMALL", 2, None, FnCaps::PURE, small),
        FunctionDef::new("PERCENTILE", 2, None, FnCaps::PURE, percentile),
        FunctionDef::new("PERCENTILE.INC", 2, None, FnCaps::PURE, percentile),
        FunctionDef::new("PERCENTILE.EXC", 2, None, FnCaps::PURE, percentile_exc_fn),
        FunctionDef::new("QUARTILE", 2, None, FnCaps::PURE, quartile),
        FunctionDef::new("QUARTILE.INC", 2, None, FnCaps::PURE, quartile),
        FunctionDef::new("RANK", 2, None, FnCaps::PURE, rank_eq),
        FunctionDef::new("RANK.EQ", 2, None, FnCaps::PURE, rank_eq),
        FunctionDef::new("RANK.AVG", 2, None, FnCaps::PURE, rank_avg),
        FunctionDef::new("FREQUENCY", 2, None, FnCaps::PURE | FnCaps::ARRAY, frequency),
    ] {
        reg.insert(def);
    }
}

/// k-th largest (1-based) of the sample.
pub(crate) fn large_k(xs: &[f64], k: i64) -> Result<f64, ErrorKind> {
    if k < 1 || k as usize > xs.len() {
        return Err(ErrorKind::Num);
    }
    let mut s = xs.to_vec();
    s.sort_by(|a, b| b.total_cmp(a));
    Ok(s[k as usize - 1])
}

/// k-th smallest (1-based) of the sample.
pub(crate) fn small_k(xs: &[f64], k: i64) -> Result<f64, ErrorKind> {
    if k < 1 || k as usize > xs.len() {
        return Err(ErrorKind::Num);
    }
    let mut s = xs.to_vec();
    s.sort_by(f64::total_cmp);
    Ok(s[k as usize - 1])
}

/// Inclusive percentile: linear interpolation at h = p(n−1).
pub(crate) fn percentile_inc(xs: &[f64], p: f64) -> Result<f64, ErrorKind> {
    if xs.is_empty() || !(0.0..=1.0).contains(&p) {
        return Err(ErrorKind::Num);
    }
    let mut s = xs.to_vec();
    s.sort_by(f64::total_cmp);
    let h = p * (s.len() - 1) as f64;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    Ok(s[lo] + (h - lo as f64) * (s[hi] - s[lo]))
}

/// Exclusive percentile: h = p(n+1), defined only for 1 ≤ h ≤ n.
pub(crate) fn percentile_exc(xs: &[f64], p: f64) -> Result<f64, ErrorKind> {
    if xs.is_empty() || !(0.0..=1.0).contains(&p) {
        return Err(ErrorKind::Num);
    }
    let mut s = xs.to_vec();
    s.sort_by(f64::total_cmp);
    let h = p * (s.len() + 1) as f64;
    if h < 1.0 || h > s.len() as f64 {
        return Err(ErrorKind::Num);
    }
    let lo = (h.floor() as usize).min(s.len()) - 1;
    let hi = (h.ceil() as usize).min(s.len()) - 1;
    Ok(s[lo] + (h - h.floor()) * (s[hi] - s[lo]))
}

// Flat convention: the array leads, the parameter is the last argument.
fn split_tail(args: &[Value]) -> (&[Value], &Value) {
    (&args[..args.len() - 1], &args[args.len() - 1])
}

fn large(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (data, k) = split_tail(args);
    ok_num(large_k(&numeric_samples(data), to_integer(k)?)?)
}

fn small(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (data, k) = split_tail(args);
    ok_num(small_k(&numeric_samples(data), to_integer(k)?)?)
}

fn percentile(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (data, p) = split_tail(args);
    let p = p.as_number_coerced()?;
    ok_num(percentile_inc(&numeric_samples(data), p)?)
}

fn percentile_exc_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (data, p) = split_tail(args);
    let p = p.as_number_coerced()?;
    ok_num(percentile_exc(&numeric_samples(data), p)?)
}

fn quartile(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (data, q) = split_tail(args);
    let q = to_integer(q)?;
    if !(0..=4).contains(&q) {
        return Err(ErrorKind::Num);
    }
    ok_num(percentile_inc(&numeric_samples(data), q as f64 / 4.0)?)
}

// RANK(x, sample…): descending rank (Excel's default order).
fn rank_positions(args: &[Value]) -> Result<(f64, Vec<f64>), ErrorKind> {
    let x = number_arg(args, 0)?;
    Ok((x, numeric_samples(&args[1..])))
}

fn rank_eq(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (x, xs) = rank_positions(args)?;
    if !xs.contains(&x) {
        return Err(ErrorKind::Na);
    }
    let above = xs.iter().filter(|&&y| y > x).count();
    ok_num((above + 1) as f64)
}

fn rank_avg(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (x, xs) = rank_positions(args)?;
    let ties = xs.iter().filter(|&&y| y == x).count();
    if ties == 0 {
        return Err(ErrorKind::Na);
    }
    let above = xs.iter().filter(|&&y| y > x).count();
    // Mean of the tied ranks above+1 .. above+ties.
    ok_num(above as f64 + (ties as f64 + 1.0) / 2.0)
}

/// Left-open, right-closed bin counts; bins need not be sorted on entry.
/// The result has one extra slot for values above the last bin.
pub fn frequency_counts(data: &[f64], bins: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = bins.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut counts = vec![0.0; sorted.len() + 1];
    for &x in data {
        let slot = sorted.iter().position(|&b| x <= b).unwrap_or(sorted.len());
        counts[slot] += 1.0;
    }
    counts
}

// Flat split: first half data, second half bins.
fn frequency(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    if args.len() % 2 != 0 {
        return Err(ErrorKind::Value);
    }
    let half = args.len() / 2;
    let data = numeric_samples(&args[..half]);
    let bins = numeric_samples(&args[half..]);
    let counts = frequency_counts(&data, &bins);
    Ok(ArrayResult::column(counts.into_iter().map(Value::Number).collect()).anchor())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::invoke;
    use crate::test_grid::TestGrid;

    fn n(x: f64) -> Value {
        Value::Number(x)
    }

    #[test]
    fn large_small_duality() {
        let g = TestGrid::new();
        let data = [n(3.0), n(5.0), n(1.0), n(4.0), n(2.0)];
        let mut args = data.to_vec();
        args.push(n(1.0));
        assert_eq!(invoke("LARGE", &g, &args), n(5.0));
        assert_eq!(invoke("SMALL", &g, &args), n(1.0));

        let mut args = data.to_vec();
        args.push(n(2.0));
        assert_eq!(invoke("LARGE", &g, &args), n(4.0));
        assert_eq!(invoke("SMALL", &g, &args), n(2.0));

        let mut args = data.to_vec();
        args.push(n(6.0));
        assert_eq!(invoke("LARGE", &g, &args), Value::Error(ErrorKind::Num));
        let mut args = data.to_vec();
        args.push(n(0.0));
        assert_eq!(invoke("SMALL", &g, &args), Value::Error(ErrorKind::Num));
    }

    #[test]
    fn percentile_interpolates() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile_inc(&xs, 0.0).unwrap(), 1.0);
        assert_eq!(percentile_inc(&xs, 1.0).unwrap(), 4.0);
        assert_eq!(percentile_inc(&xs, 0.5).unwrap(), 2.5);
        assert!((percentile_inc(&xs, 0.25).unwrap() - 1.75).abs() < 1e-12);
        assert_eq!(percentile_inc(&xs, 1.5), Err(ErrorKind::Num));

        // Exclusive mode rejects tails it cannot interpolate.
        assert_eq!(percentile_exc(&xs, 0.1), Err(ErrorKind::Num));
        assert_eq!(percentile_exc(&xs, 0.5).unwrap(), 2.5);
    }

    #[test]
    fn quartile_maps_to_percentiles() {
        let g = TestGrid::new();
        let data = [n(1.0), n(2.0), n(3.0), n(4.0), n(5.0)];
        for (q, want) in [(0.0, 1.0), (1.0, 2.0), (2.0, 3.0), (3.0, 4.0), (4.0, 5.0)] {
            let mut args = data.to_vec();
            args.push(n(q));
            assert_eq!(invoke("QUARTILE", &g, &args), n(want));
        }
        let mut args = data.to_vec();
        args.push(n(5.0));
        assert_eq!(invoke("QUARTILE", &g, &args), Value::Error(ErrorKind::Num));
    }

    #[test]
    fn rank_orders_descending() {
        let g = TestGrid::new();
        assert_eq!(
            invoke("RANK", &g, &[n(4.0), n(1.0), n(4.0), n(9.0)]),
            n(2.0)
        );
        assert_eq!(
            invoke("RANK.EQ", &g, &[n(7.0), n(1.0), n(4.0)]),
            Value::Error(ErrorKind::Na)
        );
        assert_eq!(
            invoke("RANK.AVG", &g, &[n(4.0), n(9.0), n(4.0), n(4.0), n(1.0)]),
            n(2.5)
        );
    }

    #[test]
    fn frequency_bins_are_right_closed() {
        let counts = frequency_counts(&[1.0, 2.0, 2.0, 3.0, 7.0], &[2.0, 5.0]);
        assert_eq!(counts, vec![3.0, 1.0, 1.0]);
        // Anchor is the first bin count.
        let g = TestGrid::new();
        assert_eq!(
            invoke("FREQUENCY", &g, &[n(1.0), n(2.0), n(5.0), n(9.0)]),
            n(2.0)
        );
    }
}
