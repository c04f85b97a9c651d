//! The distribution family: normal, Student-t, chi-square, F, beta,
//! lognormal, exponential, Poisson, binomial, Weibull, gamma, and the
//! CONFIDENCE pair.
//!
//! Forward CDFs go through the special functions; every inverse is a
//! numerical inversion of its CDF through the shared solver (seeded by
//! the Acklam normal inverse where that helps). Probabilities outside
//! (0, 1) are `#NUM!` throughout.

use sheetcalc_common::{ErrorKind, Value};

use crate::builtins::utils::{number_arg, ok_num, opt_number_arg};
use crate::coercion::to_boolean_lenient;
use crate::context::CellContext;
use crate::function::{FnCaps, FunctionDef};
use crate::numerics::solver::{SolverParams, invert_cdf};
use crate::numerics::special::{
    beta_reg, gamma_p, ln_beta, ln_gamma, std_norm_cdf, std_norm_inv, std_norm_pdf,
};
use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("NORM.DIST", 4, Some(4), FnCaps::PURE, norm_dist),
        FunctionDef::new("NORM.INV", 3, Some(3), FnCaps::PURE, norm_inv),
        FunctionDef::new("NORM.S.DIST", 2, Some(2), FnCaps::PURE, norm_s_dist),
        FunctionDef::new("NORM.S.INV", 1, Some(1), FnCaps::PURE, norm_s_inv),
        FunctionDef::new("PHI", 1, Some(1), FnCaps::PURE, phi),
        FunctionDef::new("GAUSS", 1, Some(1), FnCaps::PURE, gauss),
        FunctionDef::new("T.DIST", 3, Some(3), FnCaps::PURE, t_dist),
        FunctionDef::new("T.DIST.RT", 2, Some(2), FnCaps::PURE, t_dist_rt),
        FunctionDef::new("T.DIST.2T", 2, Some(2), FnCaps::PURE, t_dist_2t),
        FunctionDef::new("T.INV", 2, Some(2), FnCaps::PURE, t_inv_fn),
        FunctionDef::new("T.INV.2T", 2, Some(2), FnCaps::PURE, t_inv_2t),
        FunctionDef::new("TDIST", 3, Some(3), FnCaps::PURE, tdist_legacy),
        FunctionDef::new("TINV", 2, Some(2), FnCaps::PURE, t_inv_2t),
        FunctionDef::new("CHISQ.DIST", 3, Some(3), FnCaps::PURE, chisq_dist),
        FunctionDef::new("CHISQ.DIST.RT", 2, Some(2), FnCaps::PURE, chisq_dist_rt),
        FunctionDef::new("CHISQ.INV", 2, Some(2), FnCaps::PURE, chisq_inv_fn),
        FunctionDef::new("CHISQ.INV.RT", 2, Some(2), FnCaps::PURE, chisq_inv_rt),
        FunctionDef::new("F.DIST", 4, Some(4), FnCaps::PURE, f_dist),
        FunctionDef::new("F.DIST.RT", 3, Some(3), FnCaps::PURE, f_dist_rt),
        FunctionDef::new("F.INV", 3, Some(3), FnCaps::PURE, f_inv_fn),
        FunctionDef::new("F.INV.RT", 3, Some(3), FnCaps::PURE, f_inv_rt),
        FunctionDef::new("BETA.DIST", 4, Some(6), FnCaps::PURE, beta_dist),
        FunctionDef::new("BETA.INV", 3, Some(5), FnCaps::PURE, beta_inv_fn),
        FunctionDef::new("LOGNORM.DIST", 4, Some(4), FnCaps::PURE, lognorm_dist),
        FunctionDef::new("LOGNORM.INV", 3, Some(3), FnCaps::PURE, lognorm_inv),
        FunctionDef::new("EXPON.DIST", 3, Some(3), FnCaps::PURE, expon_dist),
        FunctionDef::new("POISSON.DIST", 3, Some(3), FnCaps::PURE, poisson_dist),
        FunctionDef::new("BINOM.DIST", 4, Some(4), FnCaps::PURE, binom_dist),
        FunctionDef::new("WEIBULL.DIST", 4, Some(4), FnCaps::PURE, weibull_dist),
        FunctionDef::new("GAMMA.DIST", 4, Some(4), FnCaps::PURE, gamma_dist),
        FunctionDef::new("GAMMA.INV", 3, Some(3), FnCaps::PURE, gamma_inv),
        FunctionDef::new("CONFIDENCE", 3, Some(3), FnCaps::PURE, confidence_norm),
        FunctionDef::new("CONFIDENCE.NORM", 3, Some(3), FnCaps::PURE, confidence_norm),
        FunctionDef::new("CONFIDENCE.T", 3, Some(3), FnCaps::PURE, confidence_t),
    ] {
        reg.insert(def);
    }
}

fn prob_arg(args: &[Value], i: usize) -> Result<f64, ErrorKind> {
    let p = number_arg(args, i)?;
    if !(0.0 < p && p < 1.0) {
        return Err(ErrorKind::Num);
    }
    Ok(p)
}

fn cumulative_arg(args: &[Value], i: usize) -> Result<bool, ErrorKind> {
    to_boolean_lenient(&args[i])
}

/* ───────────────────────── normal ───────────────────────── */

fn norm_dist(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let x = number_arg(args, 0)?;
    let mean = number_arg(args, 1)?;
    let sd = number_arg(args, 2)?;
    let cumulative = cumulative_arg(args, 3)?;
    if sd <= 0.0 {
        return Err(ErrorKind::Num);
    }
    let z = (x - mean) / sd;
    ok_num(if cumulative { std_norm_cdf(z) } else { std_norm_pdf(z) / sd })
}

fn norm_inv(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let p = prob_arg(args, 0)?;
    let mean = number_arg(args, 1)?;
    let sd = number_arg(args, 2)?;
    if sd <= 0.0 {
        return Err(ErrorKind::Num);
    }
    let z = std_norm_inv(p).ok_or(ErrorKind::Num)?;
    ok_num(mean + sd * z)
}

fn norm_s_dist(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let z = number_arg(args, 0)?;
    let cumulative = cumulative_arg(args, 1)?;
    ok_num(if cumulative { std_norm_cdf(z) } else { std_norm_pdf(z) })
}

fn norm_s_inv(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let p = prob_arg(args, 0)?;
    ok_num(std_norm_inv(p).ok_or(ErrorKind::Num)?)
}

fn phi(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(std_norm_pdf(number_arg(args, 0)?))
}

fn gauss(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(std_norm_cdf(number_arg(args, 0)?) - 0.5)
}

/* ───────────────────────── Student-t ───────────────────────── */

fn t_cdf(t: f64, df: f64) -> f64 {
    let x = df / (df + t * t);
    0.5 * (1.0 + t.signum() * (1.0 - beta_reg(x, df / 2.0, 0.5)))
}

fn t_pdf(t: f64, df: f64) -> f64 {
    let coef = (ln_gamma((df + 1.0) / 2.0)
        - ln_gamma(df / 2.0)
        - 0.5 * (df * std::f64::consts::PI).ln())
    .exp();
    coef * (1.0 + t * t / df).powf(-(df + 1.0) / 2.0)
}

fn df_arg(args: &[Value], i: usize) -> Result<f64, ErrorKind> {
    let df = number_arg(args, i)?.trunc();
    if df < 1.0 {
        return Err(ErrorKind::Num);
    }
    Ok(df)
}

fn t_dist(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let x = number_arg(args, 0)?;
    let df = df_arg(args, 1)?;
    let cumulative = cumulative_arg(args, 2)?;
    ok_num(if cumulative { t_cdf(x, df) } else { t_pdf(x, df) })
}

fn t_dist_rt(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let x = number_arg(args, 0)?;
    let df = df_arg(args, 1)?;
    ok_num(1.0 - t_cdf(x, df))
}

fn t_dist_2t(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let x = number_arg(args, 0)?;
    let df = df_arg(args, 1)?;
    if x < 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(2.0 * (1.0 - t_cdf(x, df)))
}

// Legacy TDIST(x, df, tails)
fn tdist_legacy(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let x = number_arg(args, 0)?;
    let df = df_arg(args, 1)?;
    let tails = number_arg(args, 2)?.trunc();
    if x < 0.0 {
        return Err(ErrorKind::Num);
    }
    match tails {
        t if t == 1.0 => ok_num(1.0 - t_cdf(x, df)),
        t if t == 2.0 => ok_num(2.0 * (1.0 - t_cdf(x, df))),
        _ => Err(ErrorKind::Num),
    }
}

fn t_inv(p: f64, df: f64) -> Result<f64, ErrorKind> {
    let seed = std_norm_inv(p).ok_or(ErrorKind::Num)?;
    invert_cdf(
        |x| t_cdf(x, df),
        p,
        seed,
        f64::NEG_INFINITY,
        f64::INFINITY,
        &SolverParams::default(),
    )
}

fn t_inv_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let p = prob_arg(args, 0)?;
    let df = df_arg(args, 1)?;
    ok_num(t_inv(p, df)?)
}

// Two-tailed inverse: the positive t with P(|T| > t) = p.
fn t_inv_2t(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let p = prob_arg(args, 0)?;
    let df = df_arg(args, 1)?;
    ok_num(t_inv(1.0 - p / 2.0, df)?)
}

/* ───────────────────────── chi-square ───────────────────────── */

fn chisq_cdf(x: f64, df: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    gamma_p(df / 2.0, x / 2.0)
}

fn chisq_pdf(x: f64, df: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    let half = df / 2.0;
    ((half - 1.0) * x.ln() - x / 2.0 - half * 2f64.ln() - ln_gamma(half)).exp()
}

fn chisq_dist(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let x = number_arg(args, 0)?;
    let df = df_arg(args, 1)?;
    let cumulative = cumulative_arg(args, 2)?;
    if x < 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(if cumulative { chisq_cdf(x, df) } else { chisq_pdf(x, df) })
}

fn chisq_dist_rt(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let x = number_arg(args, 0)?;
    let df = df_arg(args, 1)?;
    if x < 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(1.0 - chisq_cdf(x, df))
}

fn chisq_inv(p: f64, df: f64) -> Result<f64, ErrorKind> {
    invert_cdf(
        |x| chisq_cdf(x, df),
        p,
        df,
        0.0,
        f64::INFINITY,
        &SolverParams::default(),
    )
}

fn chisq_inv_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let p = prob_arg(args, 0)?;
    let df = df_arg(args, 1)?;
    ok_num(chisq_inv(p, df)?)
}

fn chisq_inv_rt(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let p = prob_arg(args, 0)?;
    let df = df_arg(args, 1)?;
    ok_num(chisq_inv(1.0 - p, df)?)
}

/* ───────────────────────── F ───────────────────────── */

fn f_cdf(x: f64, d1: f64, d2: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    beta_reg(d1 * x / (d1 * x + d2), d1 / 2.0, d2 / 2.0)
}

fn f_pdf(x: f64, d1: f64, d2: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    let ln_num = (d1 / 2.0) * (d1 / d2).ln() + (d1 / 2.0 - 1.0) * x.ln()
        - ((d1 + d2) / 2.0) * (1.0 + d1 * x / d2).ln();
    (ln_num - ln_beta(d1 / 2.0, d2 / 2.0)).exp()
}

fn f_dist(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let x = number_arg(args, 0)?;
    let d1 = df_arg(args, 1)?;
    let d2 = df_arg(args, 2)?;
    let cumulative = cumulative_arg(args, 3)?;
    if x < 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(if cumulative { f_cdf(x, d1, d2) } else { f_pdf(x, d1, d2) })
}

fn f_dist_rt(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let x = number_arg(args, 0)?;
    let d1 = df_arg(args, 1)?;
    let d2 = df_arg(args, 2)?;
    if x < 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(1.0 - f_cdf(x, d1, d2))
}

fn f_inv(p: f64, d1: f64, d2: f64) -> Result<f64, ErrorKind> {
    invert_cdf(
        |x| f_cdf(x, d1, d2),
        p,
        1.0,
        0.0,
        f64::INFINITY,
        &SolverParams::default(),
    )
}

fn f_inv_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let p = prob_arg(args, 0)?;
    let d1 = df_arg(args, 1)?;
    let d2 = df_arg(args, 2)?;
    ok_num(f_inv(p, d1, d2)?)
}

fn f_inv_rt(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let p = prob_arg(args, 0)?;
    let d1 = df_arg(args, 1)?;
    let d2 = df_arg(args, 2)?;
    ok_num(f_inv(1.0 - p, d1, d2)?)
}

/* ───────────────────────── beta ───────────────────────── */

fn beta_pdf(z: f64, a: f64, b: f64) -> f64 {
    if z <= 0.0 || z >= 1.0 {
        return 0.0;
    }
    ((a - 1.0) * z.ln() + (b - 1.0) * (1.0 - z).ln() - ln_beta(a, b)).exp()
}

// BETA.DIST(x, α, β, cumulative[, A=0[, B=1]])
fn beta_dist(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let x = number_arg(args, 0)?;
    let a = number_arg(args, 1)?;
    let b = number_arg(args, 2)?;
    let cumulative = cumulative_arg(args, 3)?;
    let lo = opt_number_arg(args, 4, 0.0)?;
    let hi = opt_number_arg(args, 5, 1.0)?;
    if a <= 0.0 || b <= 0.0 || lo >= hi || x < lo || x > hi {
        return Err(ErrorKind::Num);
    }
    let z = (x - lo) / (hi - lo);
    ok_num(if cumulative { beta_reg(z, a, b) } else { beta_pdf(z, a, b) / (hi - lo) })
}

fn beta_inv_fn(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let p = prob_arg(args, 0)?;
    let a = number_arg(args, 1)?;
    let b = number_arg(args, 2)?;
    let lo = opt_number_arg(args, 3, 0.0)?;
    let hi = opt_number_arg(args, 4, 1.0)?;
    if a <= 0.0 || b <= 0.0 || lo >= hi {
        return Err(ErrorKind::Num);
    }
    let z = invert_cdf(
        |z| beta_reg(z, a, b),
        p,
        0.5,
        0.0,
        1.0,
        &SolverParams::default(),
    )?;
    ok_num(lo + z * (hi - lo))
}

/* ───────────────────────── lognormal ───────────────────────── */

fn lognorm_dist(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let x = number_arg(args, 0)?;
    let mean = number_arg(args, 1)?;
    let sd = number_arg(args, 2)?;
    let cumulative = cumulative_arg(args, 3)?;
    if x <= 0.0 || sd <= 0.0 {
        return Err(ErrorKind::Num);
    }
    let z = (x.ln() - mean) / sd;
    ok_num(if cumulative { std_norm_cdf(z) } else { std_norm_pdf(z) / (x * sd) })
}

fn lognorm_inv(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let p = prob_arg(args, 0)?;
    let mean = number_arg(args, 1)?;
    let sd = number_arg(args, 2)?;
    if sd <= 0.0 {
        return Err(ErrorKind::Num);
    }
    let z = std_norm_inv(p).ok_or(ErrorKind::Num)?;
    ok_num((mean + sd * z).exp())
}

/* ───────────────────── exponential / Poisson / binomial ───────────────────── */

fn expon_dist(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let x = number_arg(args, 0)?;
    let lambda = number_arg(args, 1)?;
    let cumulative = cumulative_arg(args, 2)?;
    if x < 0.0 || lambda <= 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(if cumulative {
        1.0 - (-lambda * x).exp()
    } else {
        lambda * (-lambda * x).exp()
    })
}

fn poisson_dist(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let k = number_arg(args, 0)?.trunc();
    let mean = number_arg(args, 1)?;
    let cumulative = cumulative_arg(args, 2)?;
    if k < 0.0 || mean < 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(if cumulative {
        // P(X ≤ k) = Q(k+1, λ)
        1.0 - gamma_p(k + 1.0, mean)
    } else {
        (k * mean.ln() - mean - ln_gamma(k + 1.0)).exp()
    })
}

fn binom_pmf(k: f64, n: f64, p: f64) -> f64 {
    if p == 0.0 {
        return if k == 0.0 { 1.0 } else { 0.0 };
    }
    if p == 1.0 {
        return if k == n { 1.0 } else { 0.0 };
    }
    let ln_c = ln_gamma(n + 1.0) - ln_gamma(k + 1.0) - ln_gamma(n - k + 1.0);
    (ln_c + k * p.ln() + (n - k) * (1.0 - p).ln()).exp()
}

fn binom_dist(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let k = number_arg(args, 0)?.trunc();
    let n = number_arg(args, 1)?.trunc();
    let p = number_arg(args, 2)?;
    let cumulative = cumulative_arg(args, 3)?;
    if k < 0.0 || n < k || !(0.0..=1.0).contains(&p) {
        return Err(ErrorKind::Num);
    }
    if cumulative {
        if k == n {
            return ok_num(1.0);
        }
        // P(X ≤ k) = I_{1-p}(n−k, k+1)
        ok_num(beta_reg(1.0 - p, n - k, k + 1.0))
    } else {
        ok_num(binom_pmf(k, n, p))
    }
}

fn weibull_dist(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let x = number_arg(args, 0)?;
    let alpha = number_arg(args, 1)?;
    let beta = number_arg(args, 2)?;
    let cumulative = cumulative_arg(args, 3)?;
    if x < 0.0 || alpha <= 0.0 || beta <= 0.0 {
        return Err(ErrorKind::Num);
    }
    let t = (x / beta).powf(alpha);
    ok_num(if cumulative {
        1.0 - (-t).exp()
    } else {
        alpha / beta * (x / beta).powf(alpha - 1.0) * (-t).exp()
    })
}

/* ───────────────────────── gamma ───────────────────────── */

fn gamma_dist(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let x = number_arg(args, 0)?;
    let alpha = number_arg(args, 1)?;
    let beta = number_arg(args, 2)?;
    let cumulative = cumulative_arg(args, 3)?;
    if x < 0.0 || alpha <= 0.0 || beta <= 0.0 {
        return Err(ErrorKind::Num);
    }
    ok_num(if cumulative {
        gamma_p(alpha, x / beta)
    } else if x == 0.0 {
        if alpha < 1.0 {
            return Err(ErrorKind::Num);
        }
        if alpha == 1.0 { 1.0 / beta } else { 0.0 }
    } else {
        ((alpha - 1.0) * x.ln() - x / beta - alpha * beta.ln() - ln_gamma(alpha)).exp()
    })
}

fn gamma_inv(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let p = prob_arg(args, 0)?;
    let alpha = number_arg(args, 1)?;
    let beta = number_arg(args, 2)?;
    if alpha <= 0.0 || beta <= 0.0 {
        return Err(ErrorKind::Num);
    }
    let x = invert_cdf(
        |x| gamma_p(alpha, x / beta),
        p,
        alpha * beta,
        0.0,
        f64::INFINITY,
        &SolverParams::default(),
    )?;
    ok_num(x)
}

/* ───────────────────────── confidence ───────────────────────── */

fn confidence_norm(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let alpha = prob_arg(args, 0)?;
    let sd = number_arg(args, 1)?;
    let size = number_arg(args, 2)?.trunc();
    if sd <= 0.0 || size < 1.0 {
        return Err(ErrorKind::Num);
    }
    let z = std_norm_inv(1.0 - alpha / 2.0).ok_or(ErrorKind::Num)?;
    ok_num(z * sd / size.sqrt())
}

fn confidence_t(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let alpha = prob_arg(args, 0)?;
    let sd = number_arg(args, 1)?;
    let size = number_arg(args, 2)?.trunc();
    if sd <= 0.0 || size < 1.0 {
        return Err(ErrorKind::Num);
    }
    if size < 2.0 {
        return Err(ErrorKind::Div);
    }
    let t = t_inv(1.0 - alpha / 2.0, size - 1.0)?;
    ok_num(t * sd / size.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::invoke;
    use crate::test_grid::TestGrid;

    fn n(x: f64) -> Value {
        Value::Number(x)
    }
    fn b(v: bool) -> Value {
        Value::Boolean(v)
    }

    fn num_of(v: Value) -> f64 {
        match v {
            Value::Number(x) => x,
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn normal_family() {
        let g = TestGrid::new();
        assert!(
            (num_of(invoke("NORM.DIST", &g, &[n(50.0), n(50.0), n(10.0), b(true)])) - 0.5).abs()
                < 1e-12
        );
        assert!(
            (num_of(invoke("NORM.S.DIST", &g, &[n(1.959963984540054), b(true)])) - 0.975).abs()
                < 1e-9
        );
        assert!(
            (num_of(invoke("NORM.S.INV", &g, &[n(0.975)])) - 1.959963984540054).abs() < 1e-9
        );
        assert_eq!(
            invoke("NORM.DIST", &g, &[n(1.0), n(0.0), n(0.0), b(true)]),
            Value::Error(ErrorKind::Num)
        );
        assert_eq!(
            invoke("NORM.S.INV", &g, &[n(1.0)]),
            Value::Error(ErrorKind::Num)
        );
        // PHI / GAUSS are the pdf and centered cdf.
        assert!(
            (num_of(invoke("PHI", &g, &[n(0.0)])) - 0.3989422804014327).abs() < 1e-12
        );
        assert!((num_of(invoke("GAUSS", &g, &[n(0.0)]))).abs() < 1e-12);
    }

    #[test]
    fn t_family_round_trips() {
        let g = TestGrid::new();
        // Classic critical value: t(0.975, 10) ≈ 2.228138852
        let t = num_of(invoke("T.INV", &g, &[n(0.975), n(10.0)]));
        assert!((t - 2.228138852).abs() < 1e-6);
        let p = num_of(invoke("T.DIST", &g, &[n(t), n(10.0), b(true)]));
        assert!((p - 0.975).abs() < 1e-9);

        let t2 = num_of(invoke("T.INV.2T", &g, &[n(0.05), n(10.0)]));
        assert!((t2 - 2.228138852).abs() < 1e-6);
        let p2 = num_of(invoke("T.DIST.2T", &g, &[n(t2), n(10.0)]));
        assert!((p2 - 0.05).abs() < 1e-9);

        // Legacy TDIST matches the right-tail forms.
        let rt = num_of(invoke("T.DIST.RT", &g, &[n(1.5), n(8.0)]));
        let legacy = num_of(invoke("TDIST", &g, &[n(1.5), n(8.0), n(1.0)]));
        assert!((rt - legacy).abs() < 1e-12);
        assert_eq!(
            invoke("TDIST", &g, &[n(1.5), n(8.0), n(3.0)]),
            Value::Error(ErrorKind::Num)
        );
        assert_eq!(
            invoke("T.DIST", &g, &[n(1.0), n(0.0), b(true)]),
            Value::Error(ErrorKind::Num)
        );
    }

    #[test]
    fn chisq_family_round_trips() {
        let g = TestGrid::new();
        // χ²(0.95, 5) ≈ 11.0704977
        let x = num_of(invoke("CHISQ.INV", &g, &[n(0.95), n(5.0)]));
        assert!((x - 11.0704977).abs() < 1e-5);
        let p = num_of(invoke("CHISQ.DIST", &g, &[n(x), n(5.0), b(true)]));
        assert!((p - 0.95).abs() < 1e-9);
        let rt = num_of(invoke("CHISQ.INV.RT", &g, &[n(0.05), n(5.0)]));
        assert!((rt - x).abs() < 1e-6);
        assert_eq!(
            invoke("CHISQ.DIST", &g, &[n(-1.0), n(5.0), b(true)]),
            Value::Error(ErrorKind::Num)
        );
    }

    #[test]
    fn f_family_round_trips() {
        let g = TestGrid::new();
        // F(0.95; 3, 10) ≈ 3.708265
        let x = num_of(invoke("F.INV", &g, &[n(0.95), n(3.0), n(10.0)]));
        assert!((x - 3.708265).abs() < 1e-4);
        let p = num_of(invoke("F.DIST", &g, &[n(x), n(3.0), n(10.0), b(true)]));
        assert!((p - 0.95).abs() < 1e-9);
        let rt = num_of(invoke("F.INV.RT", &g, &[n(0.05), n(3.0), n(10.0)]));
        assert!((rt - x).abs() < 1e-6);
    }

    #[test]
    fn beta_with_bounds() {
        let g = TestGrid::new();
        // I_x(1,1) is uniform: CDF = x.
        assert!(
            (num_of(invoke("BETA.DIST", &g, &[n(0.3), n(1.0), n(1.0), b(true)])) - 0.3).abs()
                < 1e-12
        );
        // Rescaled to [2, 4]: x = 3 is the midpoint.
        assert!(
            (num_of(invoke(
                "BETA.DIST",
                &g,
                &[n(3.0), n(1.0), n(1.0), b(true), n(2.0), n(4.0)]
            )) - 0.5)
                .abs()
                < 1e-12
        );
        let inv = num_of(invoke(
            "BETA.INV",
            &g,
            &[n(0.5), n(2.0), n(3.0), n(0.0), n(1.0)],
        ));
        let back = num_of(invoke("BETA.DIST", &g, &[n(inv), n(2.0), n(3.0), b(true)]));
        assert!((back - 0.5).abs() < 1e-9);
        assert_eq!(
            invoke("BETA.DIST", &g, &[n(5.0), n(1.0), n(1.0), b(true), n(0.0), n(1.0)]),
            Value::Error(ErrorKind::Num)
        );
    }

    #[test]
    fn lognormal_inverts_analytically() {
        let g = TestGrid::new();
        let x = num_of(invoke("LOGNORM.INV", &g, &[n(0.75), n(0.5), n(1.2)]));
        let p = num_of(invoke("LOGNORM.DIST", &g, &[n(x), n(0.5), n(1.2), b(true)]));
        assert!((p - 0.75).abs() < 1e-9);
        assert_eq!(
            invoke("LOGNORM.DIST", &g, &[n(0.0), n(0.0), n(1.0), b(true)]),
            Value::Error(ErrorKind::Num)
        );
    }

    #[test]
    fn discrete_distributions() {
        let g = TestGrid::new();
        // POISSON.DIST(2, 5, FALSE) = e⁻⁵·5²/2!
        let want = (-5.0f64).exp() * 12.5;
        assert!(
            (num_of(invoke("POISSON.DIST", &g, &[n(2.0), n(5.0), b(false)])) - want).abs() < 1e-12
        );
        // Cumulative at k = n is exactly 1.
        assert!(
            (num_of(invoke("BINOM.DIST", &g, &[n(6.0), n(6.0), n(0.4), b(true)])) - 1.0).abs()
                < 1e-9
        );
        // BINOM.DIST(2, 6, 0.5, FALSE) = 15/64
        assert!(
            (num_of(invoke("BINOM.DIST", &g, &[n(2.0), n(6.0), n(0.5), b(false)])) - 15.0 / 64.0)
                .abs()
                < 1e-12
        );
        assert_eq!(
            invoke("BINOM.DIST", &g, &[n(7.0), n(6.0), n(0.5), b(true)]),
            Value::Error(ErrorKind::Num)
        );
    }

    #[test]
    fn gamma_and_weibull() {
        let g = TestGrid::new();
        // GAMMA.DIST with α=1 is the exponential distribution.
        let a = num_of(invoke("GAMMA.DIST", &g, &[n(2.0), n(1.0), n(1.0), b(true)]));
        let e = num_of(invoke("EXPON.DIST", &g, &[n(2.0), n(1.0), b(true)]));
        assert!((a - e).abs() < 1e-12);
        let x = num_of(invoke("GAMMA.INV", &g, &[n(0.6), n(2.5), n(3.0)]));
        let back = num_of(invoke("GAMMA.DIST", &g, &[n(x), n(2.5), n(3.0), b(true)]));
        assert!((back - 0.6).abs() < 1e-9);
        // WEIBULL with α=1 reduces to exponential with rate 1/β.
        let w = num_of(invoke("WEIBULL.DIST", &g, &[n(2.0), n(1.0), n(1.0), b(true)]));
        assert!((w - e).abs() < 1e-12);
    }

    #[test]
    fn confidence_intervals() {
        let g = TestGrid::new();
        // Excel anchor: CONFIDENCE(0.05, 2.5, 50) ≈ 0.692952
        let c = num_of(invoke("CONFIDENCE", &g, &[n(0.05), n(2.5), n(50.0)]));
        assert!((c - 0.692952).abs() < 1e-5);
        let ct = num_of(invoke("CONFIDENCE.T", &g, &[n(0.05), n(2.5), n(50.0)]));
        assert!(ct > c);
        assert_eq!(
            invoke("CONFIDENCE.T", &g, &[n(0.05), n(2.5), n(1.0)]),
            Value::Error(ErrorKind::Div)
        );
    }
}
