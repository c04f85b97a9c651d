pub mod bytes;
pub mod core;
pub mod modern;

use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    core::register_builtins(reg);
    bytes::register_builtins(reg);
    modern::register_builtins(reg);
}
