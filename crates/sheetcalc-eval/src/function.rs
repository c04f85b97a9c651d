//! The shared calling convention every builtin obeys.
//!
//! A function is a plain `fn` plus a descriptor: name, arity bounds, and
//! capability flags. `execute` wraps the handler with the uniform contract
//! (arity check, positional error scan, NaN/∞ normalization) so the
//! handlers themselves only implement their own semantics.

use sheetcalc_common::{ErrorKind, Value};

use crate::coercion::sanitize_numeric;
use crate::context::CellContext;

bitflags::bitflags! {
    /// Properties of a function the dispatch layer needs to know about.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FnCaps: u8 {
        /// Same inputs, same output, no effects. The default.
        const PURE        = 0b0001;
        /// Output may change between calls with identical inputs (RAND,
        /// NOW); the source of change is the context, never process state.
        const VOLATILE    = 0b0010;
        /// The function inspects errors itself; the generic positional
        /// error scan is skipped (IFERROR, IS-predicates, AGGREGATE…).
        const ERROR_AWARE = 0b0100;
        /// Has a shape-aware array core; the flat path returns the anchor.
        const ARRAY       = 0b1000;
    }
}

pub type FnHandler = fn(&dyn CellContext, &[Value]) -> Result<Value, ErrorKind>;

pub struct FunctionDef {
    pub name: &'static str,
    pub min_args: usize,
    /// `None` = variadic above `min_args`.
    pub max_args: Option<usize>,
    pub caps: FnCaps,
    handler: FnHandler,
}

impl FunctionDef {
    pub const fn new(
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        caps: FnCaps,
        handler: FnHandler,
    ) -> Self {
        Self { name, min_args, max_args, caps, handler }
    }

    pub fn volatile(&self) -> bool {
        self.caps.contains(FnCaps::VOLATILE)
    }

    /// The uniform entry point: arity first (`#VALUE!` on mismatch), then
    /// the first error in positional order unless the function is
    /// error-aware, then the handler; numeric results that come back NaN
    /// or infinite surface as `#NUM!`.
    pub fn execute(&self, ctx: &dyn CellContext, args: &[Value]) -> Value {
        if args.len() < self.min_args || self.max_args.is_some_and(|m| args.len() > m) {
            return Value::Error(ErrorKind::Value);
        }
        if !self.caps.contains(FnCaps::ERROR_AWARE) {
            if let Some(e) = args.iter().find_map(Value::error_kind) {
                return Value::Error(e);
            }
        }
        match (self.handler)(ctx, args) {
            Ok(Value::Number(n)) => match sanitize_numeric(n) {
                Ok(n) => Value::Number(n),
                Err(e) => Value::Error(e),
            },
            Ok(v) => v,
            Err(e) => Value::Error(e),
        }
    }
}
