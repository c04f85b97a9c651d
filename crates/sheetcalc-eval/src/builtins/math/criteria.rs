//! Criteria-driven aggregation: SUMIF(S), COUNTIF(S), AVERAGEIF(S),
//! MAXIFS, MINIFS.
//!
//! The shape-aware `criteria_fold` is the general form: parallel views of
//! identical shape, one criterion per view, folded over the selected
//! cells. The flat wrappers follow the calling convention's literal arity
//! rule — each `(range, criterion)` pair is two arguments with a 1×1
//! range. Errors inside a criteria range propagate even when the row is
//! excluded by its criterion.

use smallvec::SmallVec;

use sheetcalc_common::{ErrorKind, Value};

use crate::context::CellContext;
use crate::criteria::Criterion;
use crate::function::{FnCaps, FunctionDef};
use crate::registry::Registry;
use crate::shape::ArrayView;

pub(crate) fn register_builtins(reg: &mut Registry) {
    for def in [
        FunctionDef::new("SUMIF", 2, Some(3), FnCaps::PURE, sumif),
        FunctionDef::new("COUNTIF", 2, Some(2), FnCaps::PURE, countif),
        FunctionDef::new("AVERAGEIF", 2, Some(3), FnCaps::PURE, averageif),
        FunctionDef::new("SUMIFS", 3, None, FnCaps::PURE, sumifs),
        FunctionDef::new("COUNTIFS", 2, None, FnCaps::PURE, countifs),
        FunctionDef::new("AVERAGEIFS", 3, None, FnCaps::PURE, averageifs),
        FunctionDef::new("MAXIFS", 3, None, FnCaps::PURE, maxifs),
        FunctionDef::new("MINIFS", 3, None, FnCaps::PURE, minifs),
    ] {
        reg.insert(def);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriteriaOp {
    Sum,
    Count,
    Average,
    Max,
    Min,
}

/// Fold `op` over the cells of `target` selected by every criterion.
/// All views must share one shape. Empty selections: SUM/COUNT/MAXIFS/
/// MINIFS → 0, AVERAGEIFS → `#DIV/0!`.
pub fn criteria_fold(
    target: Option<&ArrayView>,
    pairs: &[(ArrayView, &Value)],
    op: CriteriaOp,
) -> Result<Value, ErrorKind> {
    let Some(shape) = pairs.first().map(|(v, _)| v.shape()).or(target.map(|t| t.shape())) else {
        return Err(ErrorKind::Value);
    };
    if pairs.iter().any(|(v, _)| v.shape() != shape)
        || target.is_some_and(|t| t.shape() != shape)
    {
        return Err(ErrorKind::Value);
    }

    let criteria: SmallVec<[Criterion; 4]> =
        pairs.iter().map(|(_, c)| Criterion::parse(c)).collect();

    let mut acc = 0.0;
    let mut count = 0usize;
    let mut extreme: Option<f64> = None;
    'cells: for i in 0..shape.len() {
        for ((view, _), crit) in pairs.iter().zip(&criteria) {
            if !crit.matches(&view.values()[i])? {
                continue 'cells;
            }
        }
        count += 1;
        if let Some(t) = target {
            let cell = &t.values()[i];
            if let Value::Error(e) = cell {
                return Err(*e);
            }
            if let Some(n) = cell.as_number_strict() {
                acc += n;
                match op {
                    CriteriaOp::Max => {
                        extreme = Some(extreme.map_or(n, |e: f64| e.max(n)));
                    }
                    CriteriaOp::Min => {
                        extreme = Some(extreme.map_or(n, |e: f64| e.min(n)));
                    }
                    _ => {}
                }
            } else if matches!(op, CriteriaOp::Average) {
                // Non-numeric target cells do not enter the mean.
                count -= 1;
            }
        }
    }

    Ok(match op {
        CriteriaOp::Count => Value::Number(count as f64),
        CriteriaOp::Sum => Value::Number(acc),
        CriteriaOp::Average => {
            if count == 0 {
                return Err(ErrorKind::Div);
            }
            Value::Number(acc / count as f64)
        }
        CriteriaOp::Max | CriteriaOp::Min => Value::Number(extreme.unwrap_or(0.0)),
    })
}

/* ─────────────── flat wrappers (1×1 ranges per the arity rule) ─────────────── */

fn single_view(v: &Value) -> ArrayView<'_> {
    ArrayView::column(std::slice::from_ref(v))
}

fn if_family(args: &[Value], op: CriteriaOp) -> Result<Value, ErrorKind> {
    let range = single_view(&args[0]);
    let target_cell = args.get(2).unwrap_or(&args[0]);
    let target = single_view(target_cell);
    criteria_fold(Some(&target), &[(range, &args[1])], op)
}

fn sumif(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    if_family(args, CriteriaOp::Sum)
}

fn countif(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    criteria_fold(None, &[(single_view(&args[0]), &args[1])], CriteriaOp::Count)
}

fn averageif(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    if_family(args, CriteriaOp::Average)
}

fn ifs_family(args: &[Value], op: CriteriaOp, with_target: bool) -> Result<Value, ErrorKind> {
    let offset = usize::from(with_target);
    if (args.len() - offset) % 2 != 0 || args.len() - offset < 2 {
        return Err(ErrorKind::Value);
    }
    let target = with_target.then(|| single_view(&args[0]));
    let pairs: SmallVec<[(ArrayView, &Value); 4]> = args[offset..]
        .chunks_exact(2)
        .map(|pair| (single_view(&pair[0]), &pair[1]))
        .collect();
    criteria_fold(target.as_ref(), &pairs, op)
}

fn sumifs(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ifs_family(args, CriteriaOp::Sum, true)
}

fn countifs(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ifs_family(args, CriteriaOp::Count, false)
}

fn averageifs(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ifs_family(args, CriteriaOp::Average, true)
}

fn maxifs(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ifs_family(args, CriteriaOp::Max, true)
}

fn minifs(_: &dyn CellContext, args: &[Value]) -> Result<Value, ErrorKind> {
    ifs_family(args, CriteriaOp::Min, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::invoke;
    use crate::shape::Shape;
    use crate::test_grid::TestGrid;

    fn n(x: f64) -> Value {
        Value::Number(x)
    }
    fn t(s: &str) -> Value {
        Value::text(s)
    }

    #[test]
    fn criteria_fold_selects_rows() {
        let amounts = [n(10.0), n(20.0), n(30.0), n(40.0)];
        let regions = [t("east"), t("west"), t("east"), t("north")];
        let target = ArrayView::new(&amounts, Shape::column(4)).unwrap();
        let region_view = ArrayView::new(&regions, Shape::column(4)).unwrap();
        let crit = t("east");

        let sum = criteria_fold(Some(&target), &[(region_view, &crit)], CriteriaOp::Sum).unwrap();
        assert_eq!(sum, n(40.0));

        let count = criteria_fold(None, &[(region_view, &crit)], CriteriaOp::Count).unwrap();
        assert_eq!(count, n(2.0));
    }

    #[test]
    fn criteria_fold_multi_criteria() {
        let amounts = [n(10.0), n(20.0), n(30.0), n(40.0)];
        let regions = [t("east"), t("east"), t("east"), t("west")];
        let sizes = [n(1.0), n(2.0), n(3.0), n(4.0)];
        let target = ArrayView::new(&amounts, Shape::column(4)).unwrap();
        let rv = ArrayView::new(&regions, Shape::column(4)).unwrap();
        let sv = ArrayView::new(&sizes, Shape::column(4)).unwrap();
        let c1 = t("east");
        let c2 = t(">=2");

        let sum =
            criteria_fold(Some(&target), &[(rv, &c1), (sv, &c2)], CriteriaOp::Sum).unwrap();
        assert_eq!(sum, n(50.0));

        let max =
            criteria_fold(Some(&target), &[(rv, &c1), (sv, &c2)], CriteriaOp::Max).unwrap();
        assert_eq!(max, n(30.0));
    }

    #[test]
    fn criteria_fold_shape_mismatch() {
        let a = [n(1.0), n(2.0)];
        let b = [n(1.0)];
        let va = ArrayView::new(&a, Shape::column(2)).unwrap();
        let vb = ArrayView::new(&b, Shape::column(1)).unwrap();
        let c = n(1.0);
        assert_eq!(
            criteria_fold(Some(&va), &[(vb, &c)], CriteriaOp::Sum),
            Err(ErrorKind::Value)
        );
    }

    #[test]
    fn criteria_errors_propagate_even_when_excluded() {
        let data = [n(1.0), Value::Error(ErrorKind::Num)];
        let view = ArrayView::new(&data, Shape::column(2)).unwrap();
        let c = t(">100");
        assert_eq!(
            criteria_fold(None, &[(view, &c)], CriteriaOp::Count),
            Err(ErrorKind::Num)
        );
    }

    #[test]
    fn empty_selection_results() {
        let data = [n(1.0), n(2.0)];
        let view = ArrayView::new(&data, Shape::column(2)).unwrap();
        let c = t(">100");
        let target = ArrayView::new(&data, Shape::column(2)).unwrap();
        assert_eq!(
            criteria_fold(Some(&target), &[(view, &c)], CriteriaOp::Sum).unwrap(),
            n(0.0)
        );
        assert_eq!(
            criteria_fold(Some(&target), &[(view, &c)], CriteriaOp::Average),
            Err(ErrorKind::Div)
        );
        assert_eq!(
            criteria_fold(Some(&target), &[(view, &c)], CriteriaOp::Min).unwrap(),
            n(0.0)
        );
    }

    #[test]
    fn flat_wrappers_follow_the_arity_rule() {
        let g = TestGrid::new();
        assert_eq!(invoke("SUMIF", &g, &[n(5.0), t(">=5"), n(42.0)]), n(42.0));
        assert_eq!(invoke("SUMIF", &g, &[n(4.0), t(">=5"), n(42.0)]), n(0.0));
        assert_eq!(invoke("COUNTIF", &g, &[t("apple"), t("a*")]), n(1.0));
        assert_eq!(invoke("SUMIFS", &g, &[n(7.0), n(3.0), t(">=3")]), n(7.0));
        // (n - offset) must be even.
        assert_eq!(
            invoke("SUMIFS", &g, &[n(7.0), n(3.0), t(">=3"), n(1.0)]),
            Value::Error(ErrorKind::Value)
        );
        assert_eq!(invoke("COUNTIFS", &g, &[n(3.0), t(">2"), n(5.0), t(">4")]), n(1.0));
        assert_eq!(
            invoke("AVERAGEIFS", &g, &[n(8.0), n(1.0), t("<1")]),
            Value::Error(ErrorKind::Div)
        );
        assert_eq!(invoke("MAXIFS", &g, &[n(8.0), n(1.0), n(1.0)]), n(8.0));
        assert_eq!(invoke("MINIFS", &g, &[n(8.0), n(1.0), n(2.0)]), n(0.0));
    }
}
