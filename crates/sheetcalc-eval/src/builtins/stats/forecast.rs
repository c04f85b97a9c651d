//! FORECAST.ETS family: Holt–Winters triple exponential smoothing with
//! season auto-detection, timeline aggregation, and gap completion.
//!
//! The fitter runs initialize → fit → forecast. Smoothing parameters are
//! chosen by SSE grid search with one refinement pass. Failure modes:
//! fewer than two complete samples → `#N/A`; a target that is not
//! strictly after the last timeline point, or invalid options → `#NUM!`.

use sheetcalc_common::{ErrorKind, Value};

use crate::builtins::utils::{number_arg, ok_num};
use crate::coercion::{to_integer, to_number_lenient};
use crate::context::CellContext;
use crate::function::{FnCaps, FunctionDef};
use crate::numerics::special::std_norm_inv;
use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("FORECAST.ETS", 3, None, FnCaps::PURE, forecast_ets),
        FunctionDef::new("FORECAST.ETS.CONFINT", 3, None, FnCaps::PURE, forecast_ets_confint),
        FunctionDef::new(
            "FORECAST.ETS.SEASONALITY",
            2,
            None,
            FnCaps::PURE,
            forecast_ets_seasonality,
        ),
        FunctionDef::new("FORECAST.ETS.STAT", 3, None, FnCaps::PURE, forecast_ets_stat),
    ] {
        reg.insert(def);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EtsOptions {
    /// 0 = auto-detect, 1 = none, n ≥ 2 = period. Negative → `#NUM!`.
    pub seasonality: i64,
    /// 0 = treat missing grid points as 0, 1 = interpolate linearly.
    pub data_completion: i64,
    /// 1..7 = mean, count, max, median, min, sum, count-numbers.
    pub aggregation: i64,
}

impl Default for EtsOptions {
    fn default() -> Self {
        Self { seasonality: 1, data_completion: 1, aggregation: 1 }
    }
}

#[derive(Debug, Clone)]
pub struct EtsFit {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub period: usize,
    pub step: f64,
    level: f64,
    trend: f64,
    seasonal: Vec<f64>,
    season_pos: usize,
    last_time: f64,
    pub mae: f64,
    pub rmse: f64,
    pub mase: f64,
    pub smape: f64,
}

fn aggregate_group(xs: &[f64], code: i64) -> Result<f64, ErrorKind> {
    let n = xs.len() as f64;
    Ok(match code {
        1 => xs.iter().sum::<f64>() / n,
        2 | 7 => n,
        3 => xs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        4 => {
            let mut s = xs.to_vec();
            s.sort_by(f64::total_cmp);
            let mid = s.len() / 2;
            if s.len() % 2 == 1 { s[mid] } else { (s[mid - 1] + s[mid]) / 2.0 }
        }
        5 => xs.iter().copied().fold(f64::INFINITY, f64::min),
        6 => xs.iter().sum(),
        _ => return Err(ErrorKind::Num),
    })
}

/// Sort by time, collapse duplicate timeline points, and fill the uniform
/// grid between the first and last point.
fn prepare_series(
    values: &[f64],
    timeline: &[f64],
    opts: &EtsOptions,
) -> Result<(Vec<f64>, f64, f64), ErrorKind> {
    if values.len() != timeline.len() || values.len() < 2 {
        return Err(ErrorKind::Na);
    }
    let mut pairs: Vec<(f64, f64)> = timeline.iter().copied().zip(values.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Collapse duplicates per the aggregation code.
    let mut times: Vec<f64> = Vec::new();
    let mut series: Vec<f64> = Vec::new();
    let mut i = 0;
    while i < pairs.len() {
        let t = pairs[i].0;
        let mut group = Vec::new();
        while i < pairs.len() && pairs[i].0 == t {
            group.push(pairs[i].1);
            i += 1;
        }
        times.push(t);
        series.push(aggregate_group(&group, opts.aggregation)?);
    }
    if times.len() < 2 {
        return Err(ErrorKind::Na);
    }

    let step = times
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold(f64::INFINITY, f64::min);
    if !(step > 0.0) || !step.is_finite() {
        return Err(ErrorKind::Num);
    }

    let t0 = times[0];
    let slots = ((times[times.len() - 1] - t0) / step).round() as usize + 1;
    // Timeline points must land on the uniform grid.
    let mut grid: Vec<Option<f64>> = vec![None; slots];
    for (&t, &v) in times.iter().zip(&series) {
        let pos = (t - t0) / step;
        if (pos - pos.round()).abs() > 1e-6 {
            return Err(ErrorKind::Num);
        }
        grid[pos.round() as usize] = Some(v);
    }

    let filled: Vec<f64> = match opts.data_completion {
        0 => grid.iter().map(|s| s.unwrap_or(0.0)).collect(),
        1 => {
            let mut out = vec![0.0; slots];
            for (idx, slot) in grid.iter().enumerate() {
                out[idx] = match slot {
                    Some(v) => *v,
                    None => {
                        let prev = grid[..idx].iter().rposition(|s| s.is_some()).unwrap_or(0);
                        let next = grid[idx..]
                            .iter()
                            .position(|s| s.is_some())
                            .map(|o| idx + o)
                            .unwrap_or(prev);
                        let pv = grid[prev].unwrap_or(0.0);
                        let nv = grid[next].unwrap_or(pv);
                        if next == prev {
                            pv
                        } else {
                            pv + (nv - pv) * (idx - prev) as f64 / (next - prev) as f64
                        }
                    }
                };
            }
            out
        }
        _ => return Err(ErrorKind::Num),
    };

    Ok((filled, t0, step))
}

/// Autocorrelation-based season detection on the differenced series.
fn detect_period(xs: &[f64]) -> usize {
    let n = xs.len();
    if n < 4 {
        return 0;
    }
    let mean = xs.iter().sum::<f64>() / n as f64;
    let var: f64 = xs.iter().map(|x| (x - mean) * (x - mean)).sum();
    if var == 0.0 {
        return 0;
    }
    let mut best = (0usize, 0.3);
    for lag in 2..=(n / 2).min(24) {
        let mut acf = 0.0;
        for i in lag..n {
            acf += (xs[i] - mean) * (xs[i - lag] - mean);
        }
        acf /= var;
        if acf > best.1 {
            best = (lag, acf);
        }
    }
    best.0
}

struct SmoothState {
    level: f64,
    trend: f64,
    seasonal: Vec<f64>,
    sse: f64,
    abs_err: f64,
    sq_err: f64,
    smape_acc: f64,
    steps: usize,
}

/// One pass of additive Holt–Winters; period 0 runs Holt's linear method.
fn smooth_pass(xs: &[f64], period: usize, alpha: f64, beta: f64, gamma: f64) -> SmoothState {
    let m = period;
    let (mut level, mut trend, mut seasonal) = if m >= 2 && xs.len() >= 2 * m {
        let first_cycle = &xs[..m];
        let second_cycle = &xs[m..2 * m];
        let mean1 = first_cycle.iter().sum::<f64>() / m as f64;
        let mean2 = second_cycle.iter().sum::<f64>() / m as f64;
        let seasonal: Vec<f64> = first_cycle.iter().map(|x| x - mean1).collect();
        (mean1, (mean2 - mean1) / m as f64, seasonal)
    } else {
        (xs[0], xs[1] - xs[0], Vec::new())
    };

    let mut sse = 0.0;
    let mut abs_err = 0.0;
    let mut sq_err = 0.0;
    let mut smape_acc = 0.0;
    let mut steps = 0usize;
    let start = if seasonal.is_empty() { 1 } else { 0 };

    for (t, &x) in xs.iter().enumerate().skip(start) {
        let s = if seasonal.is_empty() { 0.0 } else { seasonal[t % m] };
        let fc = level + trend + s;
        let e = x - fc;
        sse += e * e;
        abs_err += e.abs();
        sq_err += e * e;
        let denom = x.abs() + fc.abs();
        if denom > 0.0 {
            smape_acc += 2.0 * e.abs() / denom;
        }
        steps += 1;

        let prev_level = level;
        level = alpha * (x - s) + (1.0 - alpha) * (level + trend);
        trend = beta * (level - prev_level) + (1.0 - beta) * trend;
        if !seasonal.is_empty() {
            seasonal[t % m] = gamma * (x - level) + (1.0 - gamma) * s;
        }
    }

    SmoothState { level, trend, seasonal, sse, abs_err, sq_err, smape_acc, steps }
}

/// Grid-search the smoothing parameters, then refine once around the best
/// cell at a quarter of the coarse step.
pub fn ets_fit(values: &[f64], timeline: &[f64], opts: &EtsOptions) -> Result<EtsFit, ErrorKind> {
    if opts.seasonality < 0 {
        return Err(ErrorKind::Num);
    }
    let (xs, t0, step) = prepare_series(values, timeline, opts)?;

    let period = match opts.seasonality {
        0 => detect_period(&xs),
        1 => 0,
        m => {
            if (m as usize) * 2 > xs.len() {
                return Err(ErrorKind::Na);
            }
            m as usize
        }
    };
    let seasonal_fit = period >= 2 && xs.len() >= 2 * period;
    let period = if seasonal_fit { period } else { 0 };

    let coarse: Vec<f64> = (1..10).map(|i| i as f64 / 10.0).collect();
    let gammas: Vec<f64> = if seasonal_fit { coarse.clone() } else { vec![0.0] };
    let mut best = (f64::INFINITY, 0.3, 0.1, 0.1);
    for &a in &coarse {
        for &b in &coarse {
            for &g in &gammas {
                let s = smooth_pass(&xs, period, a, b, g);
                if s.sse.is_finite() && s.sse < best.0 {
                    best = (s.sse, a, b, g);
                }
            }
        }
    }
    // Refinement: ±0.075 at 0.025 resolution around the winner.
    let refine = |c: f64| -> Vec<f64> {
        (-3..=3)
            .map(|k| (c + k as f64 * 0.025).clamp(0.001, 0.999))
            .collect()
    };
    let gammas2: Vec<f64> = if seasonal_fit { refine(best.3) } else { vec![0.0] };
    for a in refine(best.1) {
        for b in refine(best.2) {
            for &g in &gammas2 {
                let s = smooth_pass(&xs, period, a, b, g);
                if s.sse.is_finite() && s.sse < best.0 {
                    best = (s.sse, a, b, g);
                }
            }
        }
    }
    let (_, alpha, beta, gamma) = best;
    let fin = smooth_pass(&xs, period, alpha, beta, gamma);
    if !fin.level.is_finite() || !fin.trend.is_finite() {
        return Err(ErrorKind::Na);
    }

    let steps = fin.steps.max(1) as f64;
    let mae = fin.abs_err / steps;
    let rmse = (fin.sq_err / steps).sqrt();
    let smape = fin.smape_acc / steps;
    let naive: f64 = xs.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f64>()
        / (xs.len() - 1) as f64;
    let mase = if naive > 0.0 { mae / naive } else { 0.0 };

    Ok(EtsFit {
        alpha,
        beta,
        gamma: if seasonal_fit { gamma } else { 0.0 },
        period,
        step,
        level: fin.level,
        trend: fin.trend,
        seasonal: fin.seasonal,
        season_pos: xs.len(),
        last_time: t0 + (xs.len() - 1) as f64 * step,
        mae,
        rmse,
        mase,
        smape,
    })
}

/// Forecast at `target`, which must lie strictly after the fitted range.
pub fn ets_forecast(fit: &EtsFit, target: f64) -> Result<f64, ErrorKind> {
    let h = (target - fit.last_time) / fit.step;
    if h <= 0.0 {
        return Err(ErrorKind::Num);
    }
    let s = if fit.seasonal.is_empty() {
        0.0
    } else {
        let idx = (fit.season_pos + h.round().max(1.0) as usize - 1) % fit.seasonal.len();
        fit.seasonal[idx]
    };
    Ok(fit.level + fit.trend * h + s)
}

/* ───────────────── flat-convention argument slicing ───────────────── */

/// `rest` after the leading scalars: even count splits into halves; one
/// extra trailing argument is the seasonality option.
fn split_series(rest: &[Value]) -> Result<(Vec<f64>, Vec<f64>, EtsOptions), ErrorKind> {
    let mut opts = EtsOptions::default();
    let body = if rest.len() % 2 == 1 {
        opts.seasonality = to_integer(&rest[rest.len() - 1])?;
        &rest[..rest.len() - 1]
    } else {
        rest
    };
    if body.len() < 4 {
        return Err(ErrorKind::Na);
    }
    let half = body.len() / 2;
    let mut values = Vec::with_capacity(half);
    let mut timeline = Vec::with_capacity(half);
    for i in 0..half {
        values.push(to_number_lenient(&body[i])?);
        timeline.push(to_number_lenient(&body[half + i])?);
    }
    Ok((values, timeline, opts))
}

fn forecast_ets(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let target = number_arg(args, 0)?;
    let (values, timeline, opts) = split_series(&args[1..])?;
    let fit = ets_fit(&values, &timeline, &opts)?;
    ok_num(ets_forecast(&fit, target)?)
}

fn forecast_ets_confint(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let target = number_arg(args, 0)?;
    let rest = &args[1..];
    // Odd tail here is the confidence level, not seasonality.
    let (confidence, body) = if rest.len() % 2 == 1 {
        (to_number_lenient(&rest[rest.len() - 1])?, &rest[..rest.len() - 1])
    } else {
        (0.95, rest)
    };
    if !(0.0 < confidence && confidence < 1.0) {
        return Err(ErrorKind::Num);
    }
    let (values, timeline, opts) = split_series(body)?;
    let fit = ets_fit(&values, &timeline, &opts)?;
    let h = ((target - fit.last_time) / fit.step).max(1.0);
    ets_forecast(&fit, target)?;
    let z = std_norm_inv(0.5 + confidence / 2.0).ok_or(ErrorKind::Num)?;
    ok_num(z * fit.rmse * h.sqrt())
}

fn forecast_ets_seasonality(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let (values, timeline, mut opts) = split_series(args)?;
    opts.seasonality = 0;
    let fit = ets_fit(&values, &timeline, &opts)?;
    ok_num(fit.period as f64)
}

// FORECAST.ETS.STAT(values…, timeline…, stat_type)
fn forecast_ets_stat(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let stat_type = to_integer(&args[args.len() - 1])?;
    if !(1..=8).contains(&stat_type) {
        return Err(ErrorKind::Num);
    }
    let body = &args[..args.len() - 1];
    if body.len() % 2 == 1 {
        return Err(ErrorKind::Value);
    }
    let half = body.len() / 2;
    let mut values = Vec::with_capacity(half);
    let mut timeline = Vec::with_capacity(half);
    for i in 0..half {
        values.push(to_number_lenient(&body[i])?);
        timeline.push(to_number_lenient(&body[half + i])?);
    }
    let fit = ets_fit(&values, &timeline, &EtsOptions { seasonality: 0, ..Default::default() })?;
    ok_num(match stat_type {
        1 => fit.alpha,
        2 => fit.beta,
        3 => fit.gamma,
        4 => fit.mase,
        5 => fit.smape,
        6 => fit.mae,
        7 => fit.rmse,
        _ => fit.step,
    })
}
