pub mod math;

use crate::engine::FunctionRegistry;

pub fn register_functions(registry: &mut FunctionRegistry) {
    math::register(registry);
}
