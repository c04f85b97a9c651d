//! Time-value-of-money: PV/FV/PMT and the per-period split, NPER, RATE,
//! cumulative interest/principal, and the EFFECT/NOMINAL pair.
//!
//! Closed forms when rate ≠ 0, degenerate linear forms at rate = 0.
//! `type` is 0 = payments at period end, 1 = at period start.

use sheetcalc_common::{ErrorKind, Value};

use crate::builtins::utils::{number_arg, ok_num, opt_number_arg};
use crate::context::CellContext;
use crate::function::{FnCaps, FunctionDef};
use crate::numerics::solver::{SolverParams, newton};
use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("PV", 3, Some(5), FnCaps::PURE, pv),
        FunctionDef::new("FV", 3, Some(5), FnCaps::PURE, fv),
        FunctionDef::new("PMT", 3, Some(5), FnCaps::PURE, pmt),
        FunctionDef::new("IPMT", 4, Some(6), FnCaps::PURE, ipmt),
        FunctionDef::new("PPMT", 4, Some(6), FnCaps::PURE, ppmt),
        FunctionDef::new("NPER", 3, Some(5), FnCaps::PURE, nper),
        FunctionDef::new("RATE", 3, Some(6), FnCaps::PURE, rate),
        FunctionDef::new("CUMIPMT", 6, Some(6), FnCaps::PURE, cumipmt),
        FunctionDef::new("CUMPRINC", 6, Some(6), FnCaps::PURE, cumprinc),
        FunctionDef::new("EFFECT", 2, Some(2), FnCaps::PURE, effect),
        FunctionDef::new("NOMINAL", 2, Some(2), FnCaps::PURE, nominal),
        FunctionDef::new("ISPMT", 4, Some(4), FnCaps::PURE, ispmt),
        FunctionDef::new("RRI", 3, Some(3), FnCaps::PURE, rri),
    ] {
        reg.insert(def);
    }
}

fn type_arg(args: &[Value], i: usize) -> Result<f64, ErrorKind> {
    let t = opt_number_arg(args, i, 0.0)?;
    if t != 0.0 && t != 1.0 {
        return Err(ErrorKind::Num);
    }
    Ok(t)
}

/// Future value of (pv, pmt) after n periods — the annuity identity every
/// other TVM form is solved from.
fn fv_of(rate: f64, n: f64, pmt: f64, pv: f64, t: f64) -> f64 {
    if rate == 0.0 {
        -(pv + pmt * n)
    } else {
        let growth = (1.0 + rate).powf(n);
        -(pv * growth + pmt * (1.0 + rate * t) * (growth - 1.0) / rate)
    }
}

fn pmt_of(rate: f64, n: f64, pv: f64, fvv: f64, t: f64) -> Result<f64, ErrorKind> {
    if n == 0.0 {
        return Err(ErrorKind::Num);
    }
    if rate == 0.0 {
        return Ok(-(pv + fvv) / n);
    }
    let growth = (1.0 + rate).powf(n);
    let denom = (growth - 1.0) * (1.0 + rate * t);
    if denom == 0.0 {
        return Err(ErrorKind::Num);
    }
    Ok(-(pv * growth + fvv) * rate / denom)
}

fn fv(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let rate = number_arg(args, 0)?;
    let n = number_arg(args, 1)?;
    let pmt = number_arg(args, 2)?;
    let pv = opt_number_arg(args, 3, 0.0)?;
    let t = type_arg(args, 4)?;
    ok_num(fv_of(rate, n, pmt, pv, t))
}

fn pv(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let rate = number_arg(args, 0)?;
    let n = number_arg(args, 1)?;
    let pmt = number_arg(args, 2)?;
    let fvv = opt_number_arg(args, 3, 0.0)?;
    let t = type_arg(args, 4)?;
    if rate == 0.0 {
        return ok_num(-(fvv + pmt * n));
    }
    let growth = (1.0 + rate).powf(n);
    ok_num(-(fvv + pmt * (1.0 + rate * t) * (growth - 1.0) / rate) / growth)
}

fn pmt(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let rate = number_arg(args, 0)?;
    let n = number_arg(args, 1)?;
    let pv = number_arg(args, 2)?;
    let fvv = opt_number_arg(args, 3, 0.0)?;
    let t = type_arg(args, 4)?;
    ok_num(pmt_of(rate, n, pv, fvv, t)?)
}

/// Interest portion of payment `per`, computed by walking the balance.
fn ipmt_of(
    rate: f64,
    per: i64,
    n: f64,
    pv: f64,
    fvv: f64,
    t: f64,
) -> Result<(f64, f64), ErrorKind> {
    if per < 1 || (per as f64) > n || n > 1.0e6 {
        return Err(ErrorKind::Num);
    }
    let payment = pmt_of(rate, n, pv, fvv, t)?;
    let mut balance = pv;
    let mut interest = 0.0;
    for i in 1..=per {
        interest = if t == 1.0 && i == 1 { 0.0 } else { -balance * rate };
        let principal = payment - interest;
        balance += principal;
    }
    Ok((interest, payment - interest))
}

fn ipmt(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let rate = number_arg(args, 0)?;
    let per = number_arg(args, 1)?.trunc() as i64;
    let n = number_arg(args, 2)?;
    let pv = number_arg(args, 3)?;
    let fvv = opt_number_arg(args, 4, 0.0)?;
    let t = type_arg(args, 5)?;
    ok_num(ipmt_of(rate, per, n, pv, fvv, t)?.0)
}

fn ppmt(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let rate = number_arg(args, 0)?;
    let per = number_arg(args, 1)?.trunc() as i64;
    let n = number_arg(args, 2)?;
    let pv = number_arg(args, 3)?;
    let fvv = opt_number_arg(args, 4, 0.0)?;
    let t = type_arg(args, 5)?;
    ok_num(ipmt_of(rate, per, n, pv, fvv, t)?.1)
}

fn nper(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let rate = number_arg(args, 0)?;
    let pmt = number_arg(args, 1)?;
    let pv = number_arg(args, 2)?;
    let fvv = opt_number_arg(args, 3, 0.0)?;
    let t = type_arg(args, 4)?;
    if rate == 0.0 {
        if pmt == 0.0 {
            return Err(ErrorKind::Num);
        }
        return ok_num(-(pv + fvv) / pmt);
    }
    let adj = pmt * (1.0 + rate * t) / rate;
    let num = adj - fvv;
    let den = adj + pv;
    if num / den <= 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num((num / den).ln() / (1.0 + rate).ln())
}

// Newton iteration per the stated contract; guess defaults to 0.1.
fn rate(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    let pmt = number_arg(args, 1)?;
    let pv = number_arg(args, 2)?;
    let fvv = opt_number_arg(args, 3, 0.0)?;
    let t = type_arg(args, 4)?;
    let guess = opt_number_arg(args, 5, 0.1)?;
    if n <= 0.0 {
        return Err(ErrorKind::Num);
    }

    let f = |r: f64| {
        if r <= -1.0 {
            return f64::NAN;
        }
        if r.abs() < 1e-12 {
            return pv + pmt * n + fvv;
        }
        let growth = (1.0 + r).powf(n);
        pv * growth + pmt * (1.0 + r * t) * (growth - 1.0) / r + fvv
    };
    ok_num(newton(f, guess, &SolverParams::default())?)
}

fn cum_range(args: &[Value]) -> Result<(f64, f64, f64, i64, i64, f64), ErrorKind> {
    let rate = number_arg(args, 0)?;
    let n = number_arg(args, 1)?;
    let pv = number_arg(args, 2)?;
    let start = number_arg(args, 3)?.trunc() as i64;
    let end = number_arg(args, 4)?.trunc() as i64;
    let t = type_arg(args, 5)?;
    if rate <= 0.0 || n <= 0.0 || pv <= 0.0 {
        return Err(ErrorKind::Num);
    }
    if start < 1 || end < start || (end as f64) > n {
        return Err(ErrorKind::Num);
    }
    Ok((rate, n, pv, start, end, t))
}

fn cumipmt(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (rate, n, pv, start, end, t) = cum_range(args)?;
    let mut total = 0.0;
    for per in start..=end {
        total += ipmt_of(rate, per, n, pv, 0.0, t)?.0;
    }
    ok_num(total)
}

fn cumprinc(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (rate, n, pv, start, end, t) = cum_range(args)?;
    let mut total = 0.0;
    for per in start..=end {
        total += ipmt_of(rate, per, n, pv, 0.0, t)?.1;
    }
    ok_num(total)
}

fn effect(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let nominal_rate = number_arg(args, 0)?;
    let npery = number_arg(args, 1)?.trunc();
    if npery < 1.0 || nominal_rate <= -1.0 {
        return Err(ErrorKind::Num);
    }
    ok_num((1.0 + nominal_rate / npery).powf(npery) - 1.0)
}

fn nominal(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let effect_rate = number_arg(args, 0)?;
    let npery = number_arg(args, 1)?.trunc();
    if npery < 1.0 || effect_rate <= -1.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(npery * ((1.0 + effect_rate).powf(1.0 / npery) - 1.0))
}

// Even-principal loan interest for period `per`.
fn ispmt(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let rate = number_arg(args, 0)?;
    let per = number_arg(args, 1)?.trunc();
    let n = number_arg(args, 2)?;
    let pv = number_arg(args, 3)?;
    if n == 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(-pv * rate * (n - per) / n)
}

fn rri(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = number_arg(args, 0)?;
    let pv = number_arg(args, 1)?;
    let fvv = number_arg(args, 2)?;
    if n <= 0.0 || pv == 0.0 || fvv / pv < 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num((fvv / pv).powf(1.0 / n) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::invoke;
    use crate::test_grid::TestGrid;

    fn n(x: f64) -> Value {
        Value::Number(x)
    }

    fn num_of(v: Value) -> f64 {
        match v {
            Value::Number(x) => x,
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn pmt_classic_loan() {
        let g = TestGrid::new();
        // Excel anchor: PMT(0.08/12, 10, 10000) = -1037.03…
        let p = num_of(invoke("PMT", &g, &[n(0.08 / 12.0), n(10.0), n(10000.0)]));
        assert!((p + 1037.032).abs() < 1e-3);
        // Zero-rate degenerate form.
        assert_eq!(
            invoke("PMT", &g, &[n(0.0), n(10.0), n(1000.0)]),
            n(-100.0)
        );
    }

    #[test]
    fn fv_pv_inverse() {
        let g = TestGrid::new();
        let fv = num_of(invoke("FV", &g, &[n(0.005), n(120.0), n(-100.0), n(-1000.0)]));
        let pv = num_of(invoke(
            "PV",
            &g,
            &[n(0.005), n(120.0), n(-100.0), n(fv)],
        ));
        assert!((pv + 1000.0).abs() < 1e-6);
    }

    #[test]
    fn ipmt_ppmt_sum_to_pmt() {
        let g = TestGrid::new();
        let r = 0.1 / 12.0;
        let p = num_of(invoke("PMT", &g, &[n(r), n(36.0), n(8000.0)]));
        let i1 = num_of(invoke("IPMT", &g, &[n(r), n(1.0), n(36.0), n(8000.0)]));
        let p1 = num_of(invoke("PPMT", &g, &[n(r), n(1.0), n(36.0), n(8000.0)]));
        assert!((i1 + 8000.0 * r).abs() < 1e-9);
        assert!((i1 + p1 - p).abs() < 1e-9);
        assert_eq!(
            invoke("IPMT", &g, &[n(r), n(0.0), n(36.0), n(8000.0)]),
            Value::Error(ErrorKind::Num)
        );
        assert_eq!(
            invoke("IPMT", &g, &[n(r), n(37.0), n(36.0), n(8000.0)]),
            Value::Error(ErrorKind::Num)
        );
    }

    #[test]
    fn nper_and_rate_close_the_loop() {
        let g = TestGrid::new();
        let p = num_of(invoke("PMT", &g, &[n(0.01), n(24.0), n(5000.0)]));
        let periods = num_of(invoke("NPER", &g, &[n(0.01), n(p), n(5000.0)]));
        assert!((periods - 24.0).abs() < 1e-6);
        let r = num_of(invoke("RATE", &g, &[n(24.0), n(p), n(5000.0)]));
        assert!((r - 0.01).abs() < 1e-7);
        assert_eq!(
            invoke("NPER", &g, &[n(0.0), n(0.0), n(100.0)]),
            Value::Error(ErrorKind::Num)
        );
    }

    #[test]
    fn cumulative_split_reconciles() {
        let g = TestGrid::new();
        let r = 0.09 / 12.0;
        let nper = 30.0 * 12.0;
        let pv = 125_000.0;
        let p = num_of(invoke("PMT", &g, &[n(r), n(nper), n(pv)]));
        let ci = num_of(invoke(
            "CUMIPMT",
            &g,
            &[n(r), n(nper), n(pv), n(13.0), n(24.0), n(0.0)],
        ));
        let cp = num_of(invoke(
            "CUMPRINC",
            &g,
            &[n(r), n(nper), n(pv), n(13.0), n(24.0), n(0.0)],
        ));
        assert!((ci + cp - p * 12.0).abs() < 1e-2);
        assert_eq!(
            invoke("CUMIPMT", &g, &[n(r), n(nper), n(pv), n(0.0), n(12.0), n(0.0)]),
            Value::Error(ErrorKind::Num)
        );
        assert_eq!(
            invoke("CUMIPMT", &g, &[n(r), n(nper), n(pv), n(13.0), n(12.0), n(0.0)]),
            Value::Error(ErrorKind::Num)
        );
    }

    #[test]
    fn effect_nominal_inverse() {
        let g = TestGrid::new();
        for r in [0.0, 0.05, 0.25, 1.0] {
            for periods in [1.0, 2.0, 4.0, 12.0, 365.0] {
                let e = num_of(invoke("EFFECT", &g, &[n(r), n(periods)]));
                let back = num_of(invoke("NOMINAL", &g, &[n(e), n(periods)]));
                assert!((back - r).abs() < 1e-6, "r={r} periods={periods}");
            }
        }
        assert_eq!(
            invoke("EFFECT", &g, &[n(0.1), n(0.0)]),
            Value::Error(ErrorKind::Num)
        );
    }

    #[test]
    fn simple_interest_helpers() {
        let g = TestGrid::new();
        assert_eq!(
            invoke("ISPMT", &g, &[n(0.1), n(1.0), n(4.0), n(4000.0)]),
            n(-300.0)
        );
        let r = num_of(invoke("RRI", &g, &[n(96.0), n(10000.0), n(11000.0)]));
        assert!((r - 0.0009933073).abs() < 1e-9);
        assert_eq!(
            invoke("RRI", &g, &[n(0.0), n(1.0), n(2.0)]),
            Value::Error(ErrorKind::Num)
        );
    }
}
