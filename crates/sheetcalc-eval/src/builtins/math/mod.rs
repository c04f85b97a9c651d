pub mod aggregate;
pub mod combinatorics;
pub mod criteria;
pub mod numeric;
pub mod reduction;
pub mod trig;

use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    numeric::register_builtins(reg);
    trig::register_builtins(reg);
    combinatorics::register_builtins(reg);
    reduction::register_builtins(reg);
    aggregate::register_builtins(reg);
    criteria::register_builtins(reg);
}
