use thiserror::Error;

/// Failures raised while evaluating postfix. Conversion itself never fails.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("operator '{operator}' needs {needed} operands, found {available}")]
    StackUnderflow {
        operator: String,
        needed: usize,
        available: usize,
    },

    #[error("function '{name}' expects {expected} arguments, found {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    /// The stack did not hold exactly one value once the scan finished.
    #[error("malformed expression: {} values left on the stack", .remaining.len())]
    MalformedExpression { remaining: Vec<f64> },

    #[error("unknown token '{0}'")]
    UnknownToken(String),

    #[error("call to '{name}' exceeds the nesting limit of {limit}")]
    RecursionLimitExceeded { name: String, limit: usize },
}
