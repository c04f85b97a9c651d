pub mod arrays;
pub mod datetime;
pub mod financial;
pub mod info;
pub mod logical;
pub mod math;
pub mod random;
pub mod reference_fns;
pub mod stats;
pub mod text;

pub(crate) mod utils;

use crate::registry::Registry;

pub fn load_builtins(reg: &mut Registry) {
    math::register_builtins(reg);
    stats::register_builtins(reg);
    datetime::register_builtins(reg);
    financial::register_builtins(reg);
    text::register_builtins(reg);
    logical::register_builtins(reg);
    info::register_builtins(reg);
    reference_fns::register_builtins(reg);
    arrays::register_builtins(reg);
    random::register_builtins(reg);
}
