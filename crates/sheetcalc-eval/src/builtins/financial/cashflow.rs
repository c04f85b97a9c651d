//! Cashflow series: NPV/IRR, MIRR, the dated XNPV/XIRR pair, FVSCHEDULE,
//! and PERCENTOF.
//!
//! IRR and XIRR run Newton from the default 0.1 guess and fall back to a
//! bracket scan over (−1, ∞); non-convergence is `#NUM!` uniformly.

use sheetcalc_common::{ErrorKind, Value};

use crate::builtins::utils::{fold_numbers, number_arg, ok_num};
use crate::coercion::to_number_lenient;
use crate::context::CellContext;
use crate::function::{FnCaps, FunctionDef};
use crate::numerics::solver::{SolverParams, bracketed, newton};
use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("NPV", 2, None, FnCaps::PURE, npv),
        FunctionDef::new("IRR", 2, None, FnCaps::PURE, irr),
        FunctionDef::new("MIRR", 3, None, FnCaps::PURE, mirr),
        FunctionDef::new("XNPV", 5, None, FnCaps::PURE, xnpv),
        FunctionDef::new("XIRR", 4, None, FnCaps::PURE, xirr),
        FunctionDef::new("FVSCHEDULE", 1, None, FnCaps::PURE, fvschedule),
        FunctionDef::new("PERCENTOF", 2, Some(2), FnCaps::PURE, percentof),
    ] {
        reg.insert(def);
    }
}

fn npv_at(rate: f64, values: &[f64]) -> f64 {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| v / (1.0 + rate).powi(i as i32 + 1))
        .sum()
}

fn npv(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let rate = number_arg(args, 0)?;
    if rate <= -1.0 {
        return Err(ErrorKind::Num);
    }
    let values = fold_numbers(&args[1..])?;
    ok_num(npv_at(rate, &values))
}

fn has_sign_mix(values: &[f64]) -> bool {
    values.iter().any(|&v| v > 0.0) && values.iter().any(|&v| v < 0.0)
}

/// Newton from `guess`, then a sign-change scan over a rate ladder.
fn solve_rate<F>(f: F, guess: f64) -> Result<f64, ErrorKind>
where
    F: Fn(f64) -> f64,
{
    let params = SolverParams::default();
    if let Ok(r) = newton(&f, guess, &params) {
        if r > -1.0 && f(r).is_finite() {
            return Ok(r);
        }
    }
    const LADDER: [f64; 16] = [
        -0.99, -0.9, -0.7, -0.5, -0.3, -0.15, -0.05, 0.0, 0.05, 0.15, 0.3, 0.5, 1.0, 2.0, 5.0,
        10.0,
    ];
    for pair in LADDER.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let (fa, fb) = (f(a), f(b));
        if fa.is_finite() && fb.is_finite() && fa.signum() != fb.signum() {
            return bracketed(&f, a, b, &params);
        }
    }
    Err(ErrorKind::Num)
}

// Flat convention: every argument is a cashflow; the guess stays at the
// 0.1 default.
fn irr(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let values = fold_numbers(args)?;
    if !has_sign_mix(&values) {
        return Err(ErrorKind::Num);
    }
    // Cashflow 0 is at time zero.
    let f = move |r: f64| {
        if r <= -1.0 {
            return f64::NAN;
        }
        values
            .iter()
            .enumerate()
            .map(|(i, v)| v / (1.0 + r).powi(i as i32))
            .sum()
    };
    ok_num(solve_rate(f, 0.1)?)
}

// MIRR(values…, finance_rate, reinvest_rate)
fn mirr(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let reinvest = to_number_lenient(&args[args.len() - 1])?;
    let finance = to_number_lenient(&args[args.len() - 2])?;
    let values = fold_numbers(&args[..args.len() - 2])?;
    let n = values.len();
    if n < 2 {
        return Err(ErrorKind::Num);
    }
    if !has_sign_mix(&values) {
        return Err(ErrorKind::Div);
    }
    let positives: Vec<f64> = values.iter().map(|&v| v.max(0.0)).collect();
    let negatives: Vec<f64> = values.iter().map(|&v| v.min(0.0)).collect();
    let npv_pos = npv_at(reinvest, &positives);
    let npv_neg = npv_at(finance, &negatives);
    if npv_neg == 0.0 {
        return Err(ErrorKind::Div);
    }
    let ratio = -npv_pos * (1.0 + reinvest).powi(n as i32) / (npv_neg * (1.0 + finance));
    if ratio <= 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(ratio.powf(1.0 / (n as f64 - 1.0)) - 1.0)
}

/// Interleaved `(value, date)` pairs with at least one positive and one
/// negative value.
fn dated_pairs(args: &[Value]) -> Result<(Vec<f64>, Vec<f64>), ErrorKind> {
    if args.len() % 2 != 0 || args.is_empty() {
        return Err(ErrorKind::Value);
    }
    let mut values = Vec::with_capacity(args.len() / 2);
    let mut dates = Vec::with_capacity(args.len() / 2);
    for pair in args.chunks_exact(2) {
        values.push(to_number_lenient(&pair[0])?);
        dates.push(crate::coercion::to_date_serial_clamped(&pair[1])?.trunc());
    }
    if !has_sign_mix(&values) {
        return Err(ErrorKind::Num);
    }
    Ok((values, dates))
}

fn xnpv_at(rate: f64, values: &[f64], dates: &[f64]) -> f64 {
    let t0 = dates[0];
    values
        .iter()
        .zip(dates)
        .map(|(v, d)| v / (1.0 + rate).powf((d - t0) / 365.0))
        .sum()
}

fn xnpv(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let rate = number_arg(args, 0)?;
    if rate <= -1.0 {
        return Err(ErrorKind::Num);
    }
    let (values, dates) = dated_pairs(&args[1..])?;
    ok_num(xnpv_at(rate, &values, &dates))
}

// XIRR(value, date, value, date, …[, guess])
fn xirr(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (body, guess) = if args.len() % 2 == 1 {
        (&args[..args.len() - 1], to_number_lenient(&args[args.len() - 1])?)
    } else {
        (args, 0.1)
    };
    let (values, dates) = dated_pairs(body)?;
    let f = move |r: f64| {
        if r <= -1.0 {
            return f64::NAN;
        }
        xnpv_at(r, &values, &dates)
    };
    ok_num(solve_rate(f, guess)?)
}

fn fvschedule(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let principal = number_arg(args, 0)?;
    let mut acc = principal;
    for v in &args[1..] {
        if v.is_empty() {
            continue;
        }
        acc *= 1.0 + to_number_lenient(v)?;
    }
    ok_num(acc)
}

fn percentof(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let subset = number_arg(args, 0)?;
    let total = number_arg(args, 1)?;
    if total == 0.0 {
        return Err(ErrorKind::Div);
    }
    ok_num(subset / total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::invoke;
    use crate::test_grid::TestGrid;
    use chrono::NaiveDate;
    use sheetcalc_common::date_to_serial;

    fn n(x: f64) -> Value {
        Value::Number(x)
    }

    fn d(y: i32, m: u32, day: u32) -> Value {
        Value::Number(date_to_serial(NaiveDate::from_ymd_opt(y, m, day).unwrap()))
    }

    fn num_of(v: Value) -> f64 {
        match v {
            Value::Number(x) => x,
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn npv_discounts_from_period_one() {
        let g = TestGrid::new();
        let v = num_of(invoke("NPV", &g, &[n(0.1), n(110.0)]));
        assert!((v - 100.0).abs() < 1e-9);
        let v = num_of(invoke("NPV", &g, &[n(0.1), n(110.0), n(121.0)]));
        assert!((v - 200.0).abs() < 1e-9);
    }

    #[test]
    fn irr_zeroes_the_npv() {
        let g = TestGrid::new();
        let flows = [n(-4000.0), n(1200.0), n(1410.0), n(1875.0), n(1050.0)];
        let r = num_of(invoke("IRR", &g, &flows));
        // NPV at the IRR (time-zero convention) vanishes.
        let npv0: f64 = [-4000.0, 1200.0, 1410.0, 1875.0, 1050.0]
            .iter()
            .enumerate()
            .map(|(i, v)| v / (1.0 + r).powi(i as i32))
            .sum();
        assert!(npv0.abs() < 1e-6);
        assert!((r - 0.143).abs() < 2e-3);
        assert_eq!(
            invoke("IRR", &g, &[n(100.0), n(200.0)]),
            Value::Error(ErrorKind::Num)
        );
    }

    #[test]
    fn mirr_needs_both_signs() {
        let g = TestGrid::new();
        // Excel anchor: MIRR({-120000,39000,30000,21000,37000,46000}, 0.1, 0.12) ≈ 0.126094
        let r = num_of(invoke(
            "MIRR",
            &g,
            &[
                n(-120000.0),
                n(39000.0),
                n(30000.0),
                n(21000.0),
                n(37000.0),
                n(46000.0),
                n(0.1),
                n(0.12),
            ],
        ));
        assert!((r - 0.126094).abs() < 1e-5);
        assert_eq!(
            invoke("MIRR", &g, &[n(100.0), n(200.0), n(0.1), n(0.1)]),
            Value::Error(ErrorKind::Div)
        );
    }

    #[test]
    fn xnpv_xirr_dated() {
        let g = TestGrid::new();
        let args = [
            n(0.09),
            n(-10000.0),
            d(2008, 1, 1),
            n(2750.0),
            d(2008, 3, 1),
            n(4250.0),
            d(2008, 10, 30),
            n(3250.0),
            d(2009, 2, 15),
            n(2750.0),
            d(2009, 4, 1),
        ];
        // Excel anchor ≈ 2086.65
        let v = num_of(invoke("XNPV", &g, &args));
        assert!((v - 2086.65).abs() < 0.5);

        let r = num_of(invoke("XIRR", &g, &args[1..]));
        // Excel anchor ≈ 0.373363
        assert!((r - 0.373363).abs() < 1e-4);
        assert_eq!(
            invoke("XIRR", &g, &[n(100.0), d(2020, 1, 1), n(50.0), d(2021, 1, 1)]),
            Value::Error(ErrorKind::Num)
        );
    }

    #[test]
    fn fvschedule_compounds() {
        let g = TestGrid::new();
        let v = num_of(invoke("FVSCHEDULE", &g, &[n(1.0), n(0.09), n(0.11), n(0.1)]));
        assert!((v - 1.33089).abs() < 1e-5);
    }

    #[test]
    fn percentof_ratio() {
        let g = TestGrid::new();
        assert_eq!(invoke("PERCENTOF", &g, &[n(25.0), n(200.0)]), n(0.125));
        assert_eq!(
            invoke("PERCENTOF", &g, &[n(25.0), n(0.0)]),
            Value::Error(ErrorKind::Div)
        );
    }
}
