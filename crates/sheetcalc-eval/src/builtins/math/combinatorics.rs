//! Factorials, combinations, permutations, GCD/LCM. Arguments truncate
//! toward zero; out-of-domain inputs are `#NUM!`.

use sheetcalc_common::{ErrorKind, Value};

use crate::builtins::utils::{number_arg, ok_num};
use crate::context::CellContext;
use crate::function::{FnCaps, FunctionDef};
use crate::numerics::special::ln_gamma;
use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("FACT", 1, Some(1), FnCaps::PURE, fact),
        FunctionDef::new("FACTDOUBLE", 1, Some(1), FnCaps::PURE, factdouble),
        FunctionDef::new("COMBIN", 2, Some(2), FnCaps::PURE, combin),
        FunctionDef::new("COMBINA", 2, Some(2), FnCaps::PURE, combina),
        FunctionDef::new("PERMUT", 2, Some(2), FnCaps::PURE, permut),
        FunctionDef::new("GCD", 1, None, FnCaps::PURE, gcd),
        FunctionDef::new("LCM", 1, None, FnCaps::PURE, lcm),
    ] {
        reg.insert(def);
    }
}

fn nonneg_int(args: &[Value], i: usize) -> Result<u64, ErrorKind> {
    let n = number_arg(args, i)?.trunc();
    if n < 0.0 || n > 9.0e15 {
        return Err(ErrorKind::Num);
    }
    Ok(n as u64)
}

fn fact(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = nonneg_int(args, 0)?;
    if n > 170 {
        return Err(ErrorKind::Num);
    }
    ok_num((1..=n).fold(1.0, |acc, k| acc * k as f64))
}

// n!! = n·(n−2)·…; 0!! = 1!! = 1
fn factdouble(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = nonneg_int(args, 0)?;
    if n > 300 {
        return Err(ErrorKind::Num);
    }
    let mut acc = 1.0;
    let mut k = n;
    while k > 1 {
        acc *= k as f64;
        k -= 2;
    }
    ok_num(acc)
}

/// n! / (k! (n−k)!), evaluated in log space and rounded back to the exact
/// integer it represents.
fn binomial(n: u64, k: u64) -> f64 {
    let (n, k) = (n as f64, k as f64);
    (ln_gamma(n + 1.0) - ln_gamma(k + 1.0) - ln_gamma(n - k + 1.0)).exp().round()
}

fn combin(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = nonneg_int(args, 0)?;
    let k = nonneg_int(args, 1)?;
    if k > n {
        return Err(ErrorKind::Num);
    }
    ok_num(binomial(n, k))
}

// C(n+k−1, k); COMBINA(0, 0) = 1
fn combina(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = nonneg_int(args, 0)?;
    let k = nonneg_int(args, 1)?;
    if n == 0 && k > 0 {
        return Err(ErrorKind::Num);
    }
    if k == 0 {
        return ok_num(1.0);
    }
    ok_num(binomial(n + k - 1, k))
}

fn permut(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let n = nonneg_int(args, 0)?;
    let k = nonneg_int(args, 1)?;
    if k > n {
        return Err(ErrorKind::Num);
    }
    let (nf, kf) = (n as f64, k as f64);
    ok_num((ln_gamma(nf + 1.0) - ln_gamma(nf - kf + 1.0)).exp().round())
}

fn gcd2(a: u64, b: u64) -> u64 {
    if b == 0 { a } else { gcd2(b, a % b) }
}

fn gcd(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let mut acc = 0u64;
    for i in 0..args.len() {
        let n = number_arg(args, i)?.trunc();
        if n < 0.0 || n > 9.0e15 {
            return Err(ErrorKind::Num);
        }
        acc = gcd2(acc, n as u64);
    }
    ok_num(acc as f64)
}

fn lcm(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let mut acc = 1u64;
    for i in 0..args.len() {
        let n = number_arg(args, i)?.trunc();
        if n < 0.0 || n > 9.0e15 {
            return Err(ErrorKind::Num);
        }
        let n = n as u64;
        if n == 0 {
            return ok_num(0.0);
        }
        let g = gcd2(acc, n);
        acc = acc.checked_mul(n / g).ok_or(ErrorKind::Num)?;
    }
    ok_num(acc as f64)
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
    fn factorials() {
        let g = TestGrid::new();
        assert_eq!(invoke("FACT", &g, &[n(5.0)]), n(120.0));
        assert_eq!(invoke("FACT", &g, &[n(0.0)]), n(1.0));
        assert_eq!(invoke("FACT", &g, &[n(5.9)]), n(120.0));
        assert_eq!(invoke("FACT", &g, &[n(-1.0)]), Value::Error(ErrorKind::Num));

        assert_eq!(invoke("FACTDOUBLE", &g, &[n(7.0)]), n(105.0));
        assert_eq!(invoke("FACTDOUBLE", &g, &[n(6.0)]), n(48.0));
        assert_eq!(invoke("FACTDOUBLE", &g, &[n(0.0)]), n(1.0));
        assert_eq!(invoke("FACTDOUBLE", &g, &[n(1.0)]), n(1.0));
        assert_eq!(
            invoke("FACTDOUBLE", &g, &[n(-3.0)]),
            Value::Error(ErrorKind::Num)
        );
    }

    #[test]
    fn combinations_and_permutations() {
        let g = TestGrid::new();
        assert_eq!(invoke("COMBIN", &g, &[n(8.0), n(2.0)]), n(28.0));
        assert_eq!(invoke("COMBIN", &g, &[n(8.0), n(0.0)]), n(1.0));
        assert_eq!(
            invoke("COMBIN", &g, &[n(2.0), n(3.0)]),
            Value::Error(ErrorKind::Num)
        );
        assert_eq!(invoke("COMBINA", &g, &[n(4.0), n(3.0)]), n(20.0));
        assert_eq!(invoke("COMBINA", &g, &[n(0.0), n(0.0)]), n(1.0));
        assert_eq!(invoke("PERMUT", &g, &[n(5.0), n(2.0)]), n(20.0));
        assert_eq!(
            invoke("PERMUT", &g, &[n(-5.0), n(2.0)]),
            Value::Error(ErrorKind::Num)
        );
    }

    #[test]
    fn gcd_lcm() {
        let g = TestGrid::new();
        assert_eq!(invoke("GCD", &g, &[n(24.0), n(36.0), n(60.0)]), n(12.0));
        assert_eq!(invoke("GCD", &g, &[n(7.0)]), n(7.0));
        assert_eq!(invoke("LCM", &g, &[n(4.0), n(6.0)]), n(12.0));
        assert_eq!(invoke("LCM", &g, &[n(4.0), n(0.0)]), n(0.0));
        assert_eq!(invoke("GCD", &g, &[n(-4.0)]), Value::Error(ErrorKind::Num));
    }
}
