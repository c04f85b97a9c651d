//! RAND and RANDBETWEEN draw from the context's entropy capability; no
//! process-global randomness is touched.

use sheetcalc_common::{ErrorKind, Value};

use crate::builtins::utils::{number_arg, ok_num};
use crate::context::CellContext;
use crate::function::{FnCaps, FunctionDef};
use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    reg.insert(FunctionDef::new("RAND", 0, Some(0), FnCaps::VOLATILE, rand));
    reg.insert(FunctionDef::new(
        "RANDBETWEEN",
        2,
        Some(2),
        FnCaps::VOLATILE,
        randbetween,
    ));
}

fn rand(ctx: &dyn CellContext, _: &[Value]) -> Result<Value, ErrorKind> {
    ok_num(ctx.entropy())
}

// Integer uniform on [⌈a⌉, ⌊b⌋].
fn randbetween(ctx: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    let a = number_arg(args, 0)?;
    let b = number_arg(args, 1)?;
    if a > b {
        return Err(ErrorKind::Num);
    }
    let lo = a.ceil();
    let hi = b.floor();
    if lo > hi {
        return Err(ErrorKind::Num);
    }
    let span = hi - lo + 1.0;
    let pick = lo + (ctx.entropy() * span).floor();
    ok_num(pick.min(hi))
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
    fn rand_stays_in_unit_interval() {
        let g = TestGrid::new();
        for _ in 0..100 {
            let r = num_of(invoke("RAND", &g, &[]));
            assert!((0.0..1.0).contains(&r));
        }
    }

    #[test]
    fn rand_is_deterministic_per_seed() {
        let a = TestGrid::new().with_seed(7);
        let b = TestGrid::new().with_seed(7);
        assert_eq!(invoke("RAND", &a, &[]), invoke("RAND", &b, &[]));
    }

    #[test]
    fn randbetween_bounds_and_domain() {
        let g = TestGrid::new();
        for _ in 0..100 {
            let r = num_of(invoke("RANDBETWEEN", &g, &[n(-3.0), n(4.0)]));
            assert!((-3.0..=4.0).contains(&r));
            assert_eq!(r, r.trunc());
        }
        assert_eq!(invoke("RANDBETWEEN", &g, &[n(2.0), n(2.0)]), n(2.0));
        assert_eq!(
            invoke("RANDBETWEEN", &g, &[n(5.0), n(1.0)]),
            Value::Error(ErrorKind::Num)
        );
        // No integer between 1.2 and 1.8.
        assert_eq!(
            invoke("RANDBETWEEN", &g, &[n(1.2), n(1.8)]),
            Value::Error(ErrorKind::Num)
        );
    }
}
