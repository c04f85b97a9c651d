pub mod cashflow;
pub mod depreciation;
pub mod securities;
pub mod tvm;

use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    tvm::register_builtins(reg);
    cashflow::register_builtins(reg);
    depreciation::register_builtins(reg);
    securities::register_builtins(reg);
}
