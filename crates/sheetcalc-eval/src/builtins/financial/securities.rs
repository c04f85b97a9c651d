//! Securities: dollar fraction conversions, the coupon-schedule family,
//! bond pricing/yield, duration, accrued interest, discount instruments,
//! and Treasury bills.
//!
//! Shared validations: frequency ∈ {1, 2, 4}, basis ∈ 0..4, and
//! settlement strictly before maturity — anything else is `#NUM!`.

use chrono::NaiveDate;
use sheetcalc_common::{ErrorKind, Value};

use super::super::datetime::{add_months, date_arg, spans::days_360, spans::year_frac_dates};
use crate::builtins::utils::{number_arg, ok_num, opt_number_arg};
use crate::context::CellContext;
use crate::function::{FnCaps, FunctionDef};
use crate::numerics::solver::{SolverParams, newton_or_bracket};
use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("DOLLARDE", 2, Some(2), FnCaps::PURE, dollarde),
        FunctionDef::new("DOLLARFR", 2, Some(2), FnCaps::PURE, dollarfr),
        FunctionDef::new("COUPPCD", 3, Some(4), FnCaps::PURE, couppcd),
        FunctionDef::new("COUPNCD", 3, Some(4), FnCaps::PURE, coupncd),
        FunctionDef::new("COUPNUM", 3, Some(4), FnCaps::PURE, coupnum),
        FunctionDef::new("COUPDAYBS", 3, Some(4), FnCaps::PURE, coupdaybs),
        FunctionDef::new("COUPDAYS", 3, Some(4), FnCaps::PURE, coupdays),
        FunctionDef::new("COUPDAYSNC", 3, Some(4), FnCaps::PURE, coupdaysnc),
        FunctionDef::new("PRICE", 6, Some(7), FnCaps::PURE, price),
        FunctionDef::new("PRICEDISC", 4, Some(5), FnCaps::PURE, pricedisc),
        FunctionDef::new("PRICEMAT", 5, Some(6), FnCaps::PURE, pricemat),
        FunctionDef::new("YIELD", 6, Some(7), FnCaps::PURE, yield_fn),
        FunctionDef::new("YIELDDISC", 4, Some(5), FnCaps::PURE, yielddisc),
        FunctionDef::new("YIELDMAT", 5, Some(6), FnCaps::PURE, yieldmat),
        FunctionDef::new("DURATION", 5, Some(6), FnCaps::PURE, duration),
        FunctionDef::new("MDURATION", 5, Some(6), FnCaps::PURE, mduration),
        FunctionDef::new("ACCRINT", 6, Some(8), FnCaps::PURE, accrint),
        FunctionDef::new("ACCRINTM", 4, Some(5), FnCaps::PURE, accrintm),
        FunctionDef::new("DISC", 4, Some(5), FnCaps::PURE, disc),
        FunctionDef::new("INTRATE", 4, Some(5), FnCaps::PURE, intrate),
        FunctionDef::new("RECEIVED", 4, Some(5), FnCaps::PURE, received),
        FunctionDef::new("TBILLEQ", 3, Some(3), FnCaps::PURE, tbilleq),
        FunctionDef::new("TBILLPRICE", 3, Some(3), FnCaps::PURE, tbillprice),
        FunctionDef::new("TBILLYIELD", 3, Some(3), FnCaps::PURE, tbillyield),
    ] {
        reg.insert(def);
    }
}

/* ───────────────────── dollar fractions ───────────────────── */

fn dollarde(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let fractional = number_arg(args, 0)?;
    let base = number_arg(args, 1)?.trunc();
    if base < 0.0 {
        return Err(ErrorKind::Num);
    }
    if base == 0.0 {
        return Err(ErrorKind::Div);
    }
    let digits = base.log10().ceil().max(1.0);
    let whole = fractional.trunc();
    let frac = fractional - whole;
    ok_num(whole + frac * 10f64.powf(digits) / base)
}

fn dollarfr(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let decimal = number_arg(args, 0)?;
    let base = number_arg(args, 1)?.trunc();
    if base < 0.0 {
        return Err(ErrorKind::Num);
    }
    if base == 0.0 {
        return Err(ErrorKind::Div);
    }
    let digits = base.log10().ceil().max(1.0);
    let whole = decimal.trunc();
    let frac = decimal - whole;
    ok_num(whole + frac * base / 10f64.powf(digits))
}

/* ───────────────────── coupon schedule ───────────────────── */

#[derive(Clone, Copy)]
struct CouponTerms {
    settlement: NaiveDate,
    maturity: NaiveDate,
    frequency: i64,
    basis: i64,
}

/// Settlement/maturity lead the argument list; frequency and optional
/// basis sit at `freq_idx`.
fn coupon_terms(args: &[Value], freq_idx: usize) -> Result<CouponTerms, ErrorKind> {
    let settlement = date_arg(&args[0])?;
    let maturity = date_arg(&args[1])?;
    let frequency = number_arg(args, freq_idx)?.trunc() as i64;
    let basis = opt_number_arg(args, freq_idx + 1, 0.0)?.trunc() as i64;
    if settlement >= maturity || !matches!(frequency, 1 | 2 | 4) || !(0..=4).contains(&basis) {
        return Err(ErrorKind::Num);
    }
    Ok(CouponTerms { settlement, maturity, frequency, basis })
}

impl CouponTerms {
    fn months_per_period(&self) -> i64 {
        12 / self.frequency
    }

    /// Last coupon date on or before settlement, stepping back from
    /// maturity.
    fn previous_coupon(&self) -> Result<NaiveDate, ErrorKind> {
        let step = self.months_per_period();
        let mut k = 1i64;
        let mut date = add_months(self.maturity, -step)?;
        while date > self.settlement {
            k += 1;
            date = add_months(self.maturity, -step * k)?;
        }
        Ok(date)
    }

    fn next_coupon(&self) -> Result<NaiveDate, ErrorKind> {
        let prev = self.previous_coupon()?;
        add_months(prev, self.months_per_period())
    }

    fn coupon_count(&self) -> Result<i64, ErrorKind> {
        let step = self.months_per_period();
        let mut count = 0i64;
        let mut date = self.maturity;
        while date > self.settlement {
            count += 1;
            date = add_months(self.maturity, -step * count)?;
        }
        Ok(count)
    }

    /// Day count from `a` to `b` under this basis.
    fn day_count(&self, a: NaiveDate, b: NaiveDate) -> f64 {
        match self.basis {
            0 => days_360(a, b, false) as f64,
            4 => days_360(a, b, true) as f64,
            _ => (b - a).num_days() as f64,
        }
    }

    /// Length of the coupon period containing settlement.
    fn period_days(&self) -> Result<f64, ErrorKind> {
        Ok(match self.basis {
            1 => {
                let prev = self.previous_coupon()?;
                let next = self.next_coupon()?;
                (next - prev).num_days() as f64
            }
            3 => 365.0 / self.frequency as f64,
            _ => 360.0 / self.frequency as f64,
        })
    }
}

fn couppcd(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let terms = coupon_terms(args, 2)?;
    ok_num(sheetcalc_common::date_to_serial(terms.previous_coupon()?))
}

fn coupncd(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let terms = coupon_terms(args, 2)?;
    ok_num(sheetcalc_common::date_to_serial(terms.next_coupon()?))
}

fn coupnum(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let terms = coupon_terms(args, 2)?;
    ok_num(terms.coupon_count()? as f64)
}

fn coupdaybs(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let terms = coupon_terms(args, 2)?;
    let prev = terms.previous_coupon()?;
    ok_num(terms.day_count(prev, terms.settlement))
}

fn coupdays(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let terms = coupon_terms(args, 2)?;
    ok_num(terms.period_days()?)
}

fn coupdaysnc(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let terms = coupon_terms(args, 2)?;
    match terms.basis {
        0 | 4 => {
            let prev = terms.previous_coupon()?;
            ok_num(terms.period_days()? - terms.day_count(prev, terms.settlement))
        }
        _ => {
            let next = terms.next_coupon()?;
            ok_num((next - terms.settlement).num_days() as f64)
        }
    }
}

/* ───────────────────── bond pricing ───────────────────── */

/// Standard coupon-bond price for 100 face, given yield per annum.
fn price_at(terms: &CouponTerms, rate: f64, yld: f64, redemption: f64) -> Result<f64, ErrorKind> {
    let freq = terms.frequency as f64;
    let n = terms.coupon_count()? as f64;
    let prev = terms.previous_coupon()?;
    let next = terms.next_coupon()?;
    let e = terms.period_days()?;
    let a = terms.day_count(prev, terms.settlement);
    let dsc = match terms.basis {
        0 | 4 => e - a,
        _ => (next - terms.settlement).num_days() as f64,
    };
    let coupon = 100.0 * rate / freq;
    let q = 1.0 + yld / freq;

    if n == 1.0 {
        // Single remaining cashflow discounts like a money-market line.
        let t = dsc / e;
        return Ok((redemption + coupon) / (1.0 + t * yld / freq) - a / e * coupon);
    }

    let mut total = redemption / q.powf(n - 1.0 + dsc / e);
    for k in 1..=(n as i64) {
        total += coupon / q.powf(k as f64 - 1.0 + dsc / e);
    }
    Ok(total - coupon * a / e)
}

fn price(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let terms = coupon_terms(args, 5)?;
    let rate = number_arg(args, 2)?;
    let yld = number_arg(args, 3)?;
    let redemption = number_arg(args, 4)?;
    if rate < 0.0 || yld < 0.0 || redemption <= 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(price_at(&terms, rate, yld, redemption)?)
}

fn yield_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let terms = coupon_terms(args, 5)?;
    let rate = number_arg(args, 2)?;
    let pr = number_arg(args, 3)?;
    let redemption = number_arg(args, 4)?;
    if rate < 0.0 || pr <= 0.0 || redemption <= 0.0 {
        return Err(ErrorKind::Num);
    }
    let f = move |y: f64| match price_at(&terms, rate, y, redemption) {
        Ok(p) => p - pr,
        Err(_) => f64::NAN,
    };
    ok_num(newton_or_bracket(f, rate.max(0.05), &SolverParams::default())?)
}

fn basis_arg(args: &[Value], i: usize) -> Result<i64, ErrorKind> {
    let basis = opt_number_arg(args, i, 0.0)?.trunc() as i64;
    if !(0..=4).contains(&basis) {
        return Err(ErrorKind::Num);
    }
    Ok(basis)
}

fn settle_pair(args: &[Value]) -> Result<(NaiveDate, NaiveDate), ErrorKind> {
    let settlement = date_arg(&args[0])?;
    let maturity = date_arg(&args[1])?;
    if settlement >= maturity {
        return Err(ErrorKind::Num);
    }
    Ok((settlement, maturity))
}

fn pricedisc(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (settlement, maturity) = settle_pair(args)?;
    let discount = number_arg(args, 2)?;
    let redemption = number_arg(args, 3)?;
    let basis = basis_arg(args, 4)?;
    if discount <= 0.0 || redemption <= 0.0 {
        return Err(ErrorKind::Num);
    }
    let yf = year_frac_dates(settlement, maturity, basis)?;
    ok_num(redemption * (1.0 - discount * yf))
}

fn pricemat(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (settlement, maturity) = settle_pair(args)?;
    let issue = date_arg(&args[2])?;
    let rate = number_arg(args, 3)?;
    let yld = number_arg(args, 4)?;
    let basis = basis_arg(args, 5)?;
    if rate < 0.0 || yld < 0.0 || issue > settlement {
        return Err(ErrorKind::Num);
    }
    let yf_im = year_frac_dates(issue, maturity, basis)?;
    let yf_is = year_frac_dates(issue, settlement, basis)?;
    let yf_sm = year_frac_dates(settlement, maturity, basis)?;
    ok_num((100.0 + yf_im * rate * 100.0) / (1.0 + yf_sm * yld) - yf_is * rate * 100.0)
}

fn yielddisc(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (settlement, maturity) = settle_pair(args)?;
    let pr = number_arg(args, 2)?;
    let redemption = number_arg(args, 3)?;
    let basis = basis_arg(args, 4)?;
    if pr <= 0.0 || redemption <= 0.0 {
        return Err(ErrorKind::Num);
    }
    let yf = year_frac_dates(settlement, maturity, basis)?;
    ok_num((redemption - pr) / pr / yf)
}

fn yieldmat(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (settlement, maturity) = settle_pair(args)?;
    let issue = date_arg(&args[2])?;
    let rate = number_arg(args, 3)?;
    let pr = number_arg(args, 4)?;
    let basis = basis_arg(args, 5)?;
    if rate < 0.0 || pr <= 0.0 || issue > settlement {
        return Err(ErrorKind::Num);
    }
    let yf_im = year_frac_dates(issue, maturity, basis)?;
    let yf_is = year_frac_dates(issue, settlement, basis)?;
    let yf_sm = year_frac_dates(settlement, maturity, basis)?;
    ok_num(
        ((1.0 + yf_im * rate) / (pr / 100.0 + yf_is * rate) - 1.0) / yf_sm,
    )
}

/* ───────────────────── duration ───────────────────── */

fn duration_years(terms: &CouponTerms, coupon: f64, yld: f64) -> Result<f64, ErrorKind> {
    let freq = terms.frequency as f64;
    let n = terms.coupon_count()? as f64;
    let e = terms.period_days()?;
    let prev = terms.previous_coupon()?;
    let a = terms.day_count(prev, terms.settlement);
    let dsc_frac = (e - a) / e;
    let q = 1.0 + yld / freq;
    let per_coupon = 100.0 * coupon / freq;

    let mut weighted = 0.0;
    let mut total = 0.0;
    for k in 1..=(n as i64) {
        let t = k as f64 - 1.0 + dsc_frac;
        let mut cash = per_coupon;
        if k as f64 == n {
            cash += 100.0;
        }
        let pv = cash / q.powf(t);
        weighted += pv * t / freq;
        total += pv;
    }
    if total == 0.0 {
        return Err(ErrorKind::Num);
    }
    Ok(weighted / total)
}

fn duration(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let terms = coupon_terms(args, 4)?;
    let coupon = number_arg(args, 2)?;
    let yld = number_arg(args, 3)?;
    if coupon < 0.0 || yld < 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(duration_years(&terms, coupon, yld)?)
}

fn mduration(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let terms = coupon_terms(args, 4)?;
    let coupon = number_arg(args, 2)?;
    let yld = number_arg(args, 3)?;
    if coupon < 0.0 || yld < 0.0 {
        return Err(ErrorKind::Num);
    }
    let d = duration_years(&terms, coupon, yld)?;
    ok_num(d / (1.0 + yld / terms.frequency as f64))
}

/* ───────────────────── accrued interest ───────────────────── */

// ACCRINT(issue, first_interest, settlement, rate, par, frequency[, basis[, calc_method]])
fn accrint(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let issue = date_arg(&args[0])?;
    let _first_interest = date_arg(&args[1])?;
    let settlement = date_arg(&args[2])?;
    let rate = number_arg(args, 3)?;
    let par = number_arg(args, 4)?;
    let frequency = number_arg(args, 5)?.trunc() as i64;
    let basis = basis_arg(args, 6)?;
    if rate <= 0.0 || par <= 0.0 || !matches!(frequency, 1 | 2 | 4) || settlement <= issue {
        return Err(ErrorKind::Num);
    }
    ok_num(par * rate * year_frac_dates(issue, settlement, basis)?)
}

fn accrintm(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let issue = date_arg(&args[0])?;
    let settlement = date_arg(&args[1])?;
    let rate = number_arg(args, 2)?;
    let par = number_arg(args, 3)?;
    let basis = basis_arg(args, 4)?;
    if rate <= 0.0 || par <= 0.0 || settlement <= issue {
        return Err(ErrorKind::Num);
    }
    ok_num(par * rate * year_frac_dates(issue, settlement, basis)?)
}

/* ───────────────────── discount instruments ───────────────────── */

fn disc(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (settlement, maturity) = settle_pair(args)?;
    let pr = number_arg(args, 2)?;
    let redemption = number_arg(args, 3)?;
    let basis = basis_arg(args, 4)?;
    if pr <= 0.0 || redemption <= 0.0 {
        return Err(ErrorKind::Num);
    }
    let yf = year_frac_dates(settlement, maturity, basis)?;
    ok_num((redemption - pr) / redemption / yf)
}

fn intrate(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (settlement, maturity) = settle_pair(args)?;
    let investment = number_arg(args, 2)?;
    let redemption = number_arg(args, 3)?;
    let basis = basis_arg(args, 4)?;
    if investment <= 0.0 || redemption <= 0.0 {
        return Err(ErrorKind::Num);
    }
    let yf = year_frac_dates(settlement, maturity, basis)?;
    ok_num((redemption - investment) / investment / yf)
}

fn received(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (settlement, maturity) = settle_pair(args)?;
    let investment = number_arg(args, 2)?;
    let discount = number_arg(args, 3)?;
    let basis = basis_arg(args, 4)?;
    if investment <= 0.0 || discount <= 0.0 {
        return Err(ErrorKind::Num);
    }
    let yf = year_frac_dates(settlement, maturity, basis)?;
    let denom = 1.0 - discount * yf;
    if denom <= 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(investment / denom)
}

/* ───────────────────── treasury bills ───────────────────── */

fn tbill_days(args: &[Value]) -> Result<f64, ErrorKind> {
    let (settlement, maturity) = settle_pair(args)?;
    let dsm = (maturity - settlement).num_days() as f64;
    if dsm > 366.0 {
        return Err(ErrorKind::Num);
    }
    Ok(dsm)
}

fn tbillprice(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let dsm = tbill_days(args)?;
    let discount = number_arg(args, 2)?;
    if discount <= 0.0 {
        return Err(ErrorKind::Num);
    }
    let pr = 100.0 * (1.0 - discount * dsm / 360.0);
    if pr <= 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(pr)
}

fn tbillyield(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let dsm = tbill_days(args)?;
    let pr = number_arg(args, 2)?;
    if pr <= 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num((100.0 - pr) / pr * 360.0 / dsm)
}

fn tbilleq(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let dsm = tbill_days(args)?;
    let discount = number_arg(args, 2)?;
    if discount <= 0.0 {
        return Err(ErrorKind::Num);
    }
    let denom = 360.0 - discount * dsm;
    if denom <= 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(365.0 * discount / denom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::invoke;
    use crate::test_grid::TestGrid;
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
    fn dollar_fraction_conversions() {
        let g = TestGrid::new();
        // Excel anchors.
        assert!((num_of(invoke("DOLLARDE", &g, &[n(1.02), n(16.0)])) - 1.125).abs() < 1e-9);
        assert!((num_of(invoke("DOLLARFR", &g, &[n(1.125), n(16.0)])) - 1.02).abs() < 1e-9);
        assert_eq!(
            invoke("DOLLARDE", &g, &[n(1.02), n(0.0)]),
            Value::Error(ErrorKind::Div)
        );
        assert_eq!(
            invoke("DOLLARFR", &g, &[n(1.125), n(-1.0)]),
            Value::Error(ErrorKind::Num)
        );
    }

    #[test]
    fn coupon_schedule() {
        let g = TestGrid::new();
        // Semi-annual bond: settle 2023-02-15, mature 2026-11-15.
        let settle = d(2023, 2, 15);
        let mature = d(2026, 11, 15);
        assert_eq!(
            invoke("COUPPCD", &g, &[settle.clone(), mature.clone(), n(2.0)]),
            d(2022, 11, 15)
        );
        assert_eq!(
            invoke("COUPNCD", &g, &[settle.clone(), mature.clone(), n(2.0)]),
            d(2023, 5, 15)
        );
        assert_eq!(
            invoke("COUPNUM", &g, &[settle.clone(), mature.clone(), n(2.0)]),
            n(8.0)
        );
        // Basis 1: actual days.
        assert_eq!(
            invoke("COUPDAYBS", &g, &[settle.clone(), mature.clone(), n(2.0), n(1.0)]),
            n(92.0)
        );
        assert_eq!(
            invoke("COUPDAYS", &g, &[settle.clone(), mature.clone(), n(2.0), n(1.0)]),
            n(181.0)
        );
        assert_eq!(
            invoke("COUPDAYSNC", &g, &[settle.clone(), mature.clone(), n(2.0), n(1.0)]),
            n(89.0)
        );
        // Basis 0: 30/360 period.
        assert_eq!(
            invoke("COUPDAYS", &g, &[settle.clone(), mature.clone(), n(2.0)]),
            n(180.0)
        );
        assert_eq!(
            invoke("COUPNUM", &g, &[mature, settle, n(2.0)]),
            Value::Error(ErrorKind::Num)
        );
    }

    #[test]
    fn pricing_and_yield_invert() {
        let g = TestGrid::new();
        let args = [
            d(2023, 2, 15),
            d(2028, 11, 15),
            n(0.0575),
            n(0.065),
            n(100.0),
            n(2.0),
            n(0.0),
        ];
        let pr = num_of(invoke("PRICE", &g, &args));
        assert!(pr > 90.0 && pr < 100.0, "price {pr}");

        // YIELD(price(y)) = y
        let back = num_of(invoke(
            "YIELD",
            &g,
            &[
                d(2023, 2, 15),
                d(2028, 11, 15),
                n(0.0575),
                n(pr),
                n(100.0),
                n(2.0),
                n(0.0),
            ],
        ));
        assert!((back - 0.065).abs() < 1e-7, "yield {back}");
    }

    #[test]
    fn discounted_instruments() {
        let g = TestGrid::new();
        let pr = num_of(invoke(
            "PRICEDISC",
            &g,
            &[d(2024, 1, 1), d(2024, 7, 1), n(0.05), n(100.0), n(2.0)],
        ));
        assert!((pr - (100.0 * (1.0 - 0.05 * 182.0 / 360.0))).abs() < 1e-9);
        let y = num_of(invoke(
            "YIELDDISC",
            &g,
            &[d(2024, 1, 1), d(2024, 7, 1), n(pr), n(100.0), n(2.0)],
        ));
        assert!((pr * (1.0 + y * 182.0 / 360.0) - 100.0).abs() < 1e-9);
        let dr = num_of(invoke(
            "DISC",
            &g,
            &[d(2024, 1, 1), d(2024, 7, 1), n(pr), n(100.0), n(2.0)],
        ));
        assert!((dr - 0.05).abs() < 1e-9);
        let rec = num_of(invoke(
            "RECEIVED",
            &g,
            &[d(2024, 1, 1), d(2024, 7, 1), n(pr), n(0.05), n(2.0)],
        ));
        assert!((rec - 100.0).abs() < 1e-6);
        let ir = num_of(invoke(
            "INTRATE",
            &g,
            &[d(2024, 1, 1), d(2024, 7, 1), n(pr), n(100.0), n(2.0)],
        ));
        assert!((ir - y).abs() < 1e-9);
    }

    #[test]
    fn accrued_interest() {
        let g = TestGrid::new();
        // One year at 8% on 1000 par, actual/365.
        let a = num_of(invoke(
            "ACCRINTM",
            &g,
            &[d(2023, 1, 1), d(2024, 1, 1), n(0.08), n(1000.0), n(3.0)],
        ));
        assert!((a - 80.0).abs() < 1e-6);
        let b = num_of(invoke(
            "ACCRINT",
            &g,
            &[
                d(2023, 1, 1),
                d(2023, 7, 1),
                d(2024, 1, 1),
                n(0.08),
                n(1000.0),
                n(2.0),
                n(3.0),
            ],
        ));
        assert!((b - 80.0).abs() < 1e-6);
    }

    #[test]
    fn duration_bounds() {
        let g = TestGrid::new();
        let args = [
            d(2023, 1, 1),
            d(2031, 1, 1),
            n(0.08),
            n(0.09),
            n(2.0),
            n(1.0),
        ];
        let dur = num_of(invoke("DURATION", &g, &args));
        // Coupon bond duration is below maturity (8y) and above half.
        assert!(dur > 4.0 && dur < 8.0, "duration {dur}");
        let md = num_of(invoke("MDURATION", &g, &args));
        assert!((md - dur / 1.045).abs() < 1e-9);
    }

    #[test]
    fn treasury_bills() {
        let g = TestGrid::new();
        // Excel anchors: TBILLPRICE(2008-03-31, 2008-06-01, 0.09) = 98.45
        let pr = num_of(invoke(
            "TBILLPRICE",
            &g,
            &[d(2008, 3, 31), d(2008, 6, 1), n(0.09)],
        ));
        assert!((pr - 98.45).abs() < 1e-9);
        // TBILLYIELD(…, 98.45) ≈ 0.0914170
        let y = num_of(invoke(
            "TBILLYIELD",
            &g,
            &[d(2008, 3, 31), d(2008, 6, 1), n(98.45)],
        ));
        assert!((y - 0.0914170).abs() < 1e-6);
        // TBILLEQ(…, 0.0914) ≈ 0.09412
        let eq = num_of(invoke(
            "TBILLEQ",
            &g,
            &[d(2008, 3, 31), d(2008, 6, 1), n(0.0914)],
        ));
        assert!((eq - 365.0 * 0.0914 / (360.0 - 0.0914 * 62.0)).abs() < 1e-9);
        // Longer than a year is out of domain.
        assert_eq!(
            invoke("TBILLPRICE", &g, &[d(2020, 1, 1), d(2022, 1, 1), n(0.05)]),
            Value::Error(ErrorKind::Num)
        );
    }
}
