use crate::engine::{EngineError, FunctionRegistry};
use reckon_macros::reckon_fn;

pub fn register(registry: &mut FunctionRegistry) {
    registry.register_builtin("sin", SIN_ARITY, sin);
    registry.register_builtin("cos", COS_ARITY, cos);
    registry.register_builtin("tan", TAN_ARITY, tan);
    registry.register_builtin("log", LOG_ARITY, log);
    registry.register_builtin("sqrt", SQRT_ARITY, sqrt);
    registry.register_builtin("abs", ABS_ARITY, abs);
}

#[reckon_fn]
pub fn sin(x: f64) -> f64 {
    x.sin()
}

#[reckon_fn]
pub fn cos(x: f64) -> f64 {
    x.cos()
}

#[reckon_fn]
pub fn tan(x: f64) -> f64 {
    x.tan()
}

/// Natural logarithm.
#[reckon_fn]
pub fn log(x: f64) -> f64 {
    x.ln()
}

#[reckon_fn]
pub fn sqrt(x: f64) -> f64 {
    x.sqrt()
}

#[reckon_fn]
pub fn abs(x: f64) -> f64 {
    x.abs()
}
