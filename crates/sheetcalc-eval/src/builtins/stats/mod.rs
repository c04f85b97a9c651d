pub mod descriptive;
pub mod distributions;
pub mod forecast;
pub mod rank;
pub mod regression;

use crate::registry::Registry;

pub(crate) fn register_builtins(reg: &mut Registry) {
    descriptive::register_builtins(reg);
    rank::register_builtins(reg);
    regression::register_builtins(reg);
    distributions::register_builtins(reg);
    forecast::register_builtins(reg);
}
