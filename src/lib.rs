pub mod calculator;
pub mod config;
pub mod engine;
pub mod functions;
pub mod session;

pub use calculator::{Calculator, SharedRegistry};
pub use config::Config;
pub use engine::{Context, EngineError, Tokens};

/// Evaluates an infix expression against a fresh calculator with the
/// builtin functions.
pub fn evaluate_expression(
    tokens: impl Into<Tokens>,
    context: Option<&Context>,
) -> Result<f64, EngineError> {
    Calculator::new().evaluate(tokens, true, context)
}
