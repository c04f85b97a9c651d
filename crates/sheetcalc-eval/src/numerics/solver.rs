//! The one root finder behind RATE, IRR, XIRR, the inverse CDFs, and the
//! forecasting parameter refinement.
//!
//! State per iteration is `(xₙ, residualₙ, iter)`. Newton steps are taken
//! while they stay inside the current bracket; otherwise the step falls
//! back to bisection / regula falsi. Non-convergence is `#NUM!` uniformly.

use sheetcalc_common::ErrorKind;

#[derive(Debug, Clone, Copy)]
pub struct SolverParams {
    pub rel_tol: f64,
    pub abs_tol: f64,
    pub max_iter: usize,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self { rel_tol: 1e-9, abs_tol: 1e-12, max_iter: 128 }
    }
}

impl SolverParams {
    fn converged(&self, x: f64, step: f64, residual: f64) -> bool {
        residual.abs() < self.abs_tol || step.abs() < self.rel_tol * x.abs() + self.abs_tol
    }
}

/// Newton iteration with a numerically-estimated derivative and no
/// bracket. Diverging or non-finite steps are `#NUM!`.
pub fn newton<F>(f: F, guess: f64, params: &SolverParams) -> Result<f64, ErrorKind>
where
    F: Fn(f64) -> f64,
{
    let mut x = guess;
    for _ in 0..params.max_iter {
        let fx = f(x);
        if !fx.is_finite() {
            return Err(ErrorKind::Num);
        }
        if fx.abs() < params.abs_tol {
            return Ok(x);
        }
        let h = 1e-7 * x.abs().max(1e-4);
        let dfx = (f(x + h) - f(x - h)) / (2.0 * h);
        if !dfx.is_finite() || dfx.abs() < 1e-300 {
            return Err(ErrorKind::Num);
        }
        let step = fx / dfx;
        let next = x - step;
        if !next.is_finite() {
            return Err(ErrorKind::Num);
        }
        if params.converged(next, step, fx) {
            return Ok(next);
        }
        x = next;
    }
    Err(ErrorKind::Num)
}

/// Root inside [lo, hi] where `f` changes sign: regula falsi with a
/// bisection safeguard (Illinois scheme) so a stale endpoint cannot stall.
pub fn bracketed<F>(f: F, lo: f64, hi: f64, params: &SolverParams) -> Result<f64, ErrorKind>
where
    F: Fn(f64) -> f64,
{
    let (mut a, mut b) = (lo, hi);
    let (mut fa, mut fb) = (f(a), f(b));
    if !fa.is_finite() || !fb.is_finite() {
        return Err(ErrorKind::Num);
    }
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    if fa.signum() == fb.signum() {
        return Err(ErrorKind::Num);
    }

    let mut side = 0i8;
    for _ in 0..params.max_iter {
        let denom = fb - fa;
        let mut x = if denom.abs() > 1e-300 { b - fb * (b - a) / denom } else { 0.5 * (a + b) };
        if !x.is_finite() || x <= a.min(b) || x >= a.max(b) {
            x = 0.5 * (a + b);
        }
        let fx = f(x);
        if !fx.is_finite() {
            return Err(ErrorKind::Num);
        }
        if params.converged(x, b - a, fx) {
            return Ok(x);
        }
        if fx.signum() == fa.signum() {
            a = x;
            fa = fx;
            if side == -1 {
                fb /= 2.0;
            }
            side = -1;
        } else {
            b = x;
            fb = fx;
            if side == 1 {
                fa /= 2.0;
            }
            side = 1;
        }
    }
    Err(ErrorKind::Num)
}

/// Root of `f` starting from `guess`: Newton first, and when that fails,
/// an outward bracket search followed by the bracketed solve.
pub fn newton_or_bracket<F>(f: F, guess: f64, params: &SolverParams) -> Result<f64, ErrorKind>
where
    F: Fn(f64) -> f64,
{
    if let Ok(x) = newton(&f, guess, params) {
        return Ok(x);
    }
    let (lo, hi) = expand_bracket(&f, guess)?;
    bracketed(&f, lo, hi, params)
}

/// Grow an interval around `seed` geometrically until `f` changes sign.
pub fn expand_bracket<F>(f: F, seed: f64) -> Result<(f64, f64), ErrorKind>
where
    F: Fn(f64) -> f64,
{
    let span0 = seed.abs().max(1.0);
    for k in 0..60 {
        let span = span0 * (1.5f64).powi(k);
        let (lo, hi) = (seed - span, seed + span);
        let (flo, fhi) = (f(lo), f(hi));
        if flo.is_finite() && fhi.is_finite() && flo.signum() != fhi.signum() {
            return Ok((lo, hi));
        }
    }
    Err(ErrorKind::Num)
}

/// Invert a monotone-increasing CDF over (lo_bound, hi_bound): expand a
/// bracket from `seed` inside the bounds, then solve. This is the shared
/// path for every `.INV` distribution function.
pub fn invert_cdf<F>(
    cdf: F,
    p: f64,
    seed: f64,
    lo_bound: f64,
    hi_bound: f64,
    params: &SolverParams,
) -> Result<f64, ErrorKind>
where
    F: Fn(f64) -> f64,
{
    if !(0.0..=1.0).contains(&p) || !p.is_finite() {
        return Err(ErrorKind::Num);
    }
    let g = |x: f64| cdf(x) - p;

    let mut lo = seed;
    let mut hi = seed;
    let mut span = seed.abs().max(1.0) * 0.5;
    for _ in 0..200 {
        if g(lo) <= 0.0 {
            break;
        }
        // Step outward; against a finite bound, close a quarter of the gap.
        lo = if lo_bound.is_finite() {
            lo_bound + (lo - lo_bound) * 0.25
        } else {
            lo - span
        };
        span *= 2.0;
    }
    span = seed.abs().max(1.0) * 0.5;
    for _ in 0..200 {
        if g(hi) >= 0.0 {
            break;
        }
        hi = if hi_bound.is_finite() {
            hi_bound - (hi_bound - hi) * 0.25
        } else {
            hi + span
        };
        span *= 2.0;
    }
    if !(g(lo) <= 0.0 && g(hi) >= 0.0) {
        return Err(ErrorKind::Num);
    }
    bracketed(g, lo, hi, params)
}
