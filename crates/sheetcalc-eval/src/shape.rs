//! Array shape as a first-class object.
//!
//! Arrays cross the calling convention flattened in row-major order; the
//! shape travels separately. Each array function's shape-aware core takes
//! `ArrayView`s and returns an `ArrayResult` (its shape law); the flat
//! `execute` wrapper returns the result's top-left anchor cell.

use sheetcalc_common::{ErrorKind, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub const fn column(rows: usize) -> Self {
        Self { rows, cols: 1 }
    }

    pub const fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn transposed(&self) -> Self {
        Self { rows: self.cols, cols: self.rows }
    }
}

/// A borrowed rectangular window over row-major values.
#[derive(Debug, Clone, Copy)]
pub struct ArrayView<'a> {
    values: &'a [Value],
    shape: Shape,
}

impl<'a> ArrayView<'a> {
    pub fn new(values: &'a [Value], shape: Shape) -> Result<Self, ErrorKind> {
        if values.len() != shape.len() {
            return Err(ErrorKind::Value);
        }
        Ok(Self { values, shape })
    }

    /// The flat-convention view: every argument one cell of a column.
    pub fn column(values: &'a [Value]) -> Self {
        Self { values, shape: Shape::column(values.len()) }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn get(&self, row: usize, col: usize) -> &'a Value {
        &self.values[row * self.shape.cols + col]
    }

    pub fn row(&self, row: usize) -> &'a [Value] {
        let start = row * self.shape.cols;
        &self.values[start..start + self.shape.cols]
    }

    /// Row-major iteration.
    pub fn iter(&self) -> impl Iterator<Item = &'a Value> + '_ {
        self.values.iter()
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }
}

/// An owned rectangular result plus its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayResult {
    pub values: Vec<Value>,
    pub shape: Shape,
}

impl ArrayResult {
    pub fn new(values: Vec<Value>, shape: Shape) -> Self {
        debug_assert_eq!(values.len(), shape.len());
        Self { values, shape }
    }

    pub fn column(values: Vec<Value>) -> Self {
        let shape = Shape::column(values.len());
        Self { values, shape }
    }

    pub fn scalar(v: Value) -> Self {
        Self { values: vec![v], shape: Shape::new(1, 1) }
    }

    /// The top-left cell — what the flat calling convention returns. An
    /// empty result is `#CALC!`.
    pub fn anchor(mut self) -> Value {
        if self.values.is_empty() {
            Value::Error(ErrorKind::Calc)
        } else {
            self.values.swap_remove(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_indexing_is_row_major() {
        let vals: Vec<Value> = (1..=6).map(|n| Value::Number(n as f64)).collect();
        let view = ArrayView::new(&vals, Shape::new(2, 3)).unwrap();
        assert_eq!(view.get(0, 2), &Value::Number(3.0));
        assert_eq!(view.get(1, 0), &Value::Number(4.0));
        assert_eq!(view.row(1), &vals[3..6]);
        assert!(ArrayView::new(&vals, Shape::new(2, 2)).is_err());
    }

    #[test]
    fn anchor_semantics() {
        let res = ArrayResult::column(vec![Value::Number(9.0), Value::Number(8.0)]);
        assert_eq!(res.anchor(), Value::Number(9.0));
        let empty = ArrayResult::new(vec![], Shape::new(0, 0));
        assert_eq!(empty.anchor(), Value::Error(ErrorKind::Calc));
    }
}
