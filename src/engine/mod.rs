use std::collections::HashMap;

mod classifier;
mod converter;
mod error;
mod evaluator;
mod instruction;
mod registry;

pub use classifier::{is_numeric, Category, Classifier};
pub use converter::Converter;
pub use error::EngineError;
pub use evaluator::{Evaluator, DEFAULT_MAX_DEPTH};
pub use instruction::Instruction;
pub use registry::{FunctionEntry, FunctionKind, FunctionRegistry, NativeFn};

/// Variable bindings visible while a user-defined function body runs.
pub type Context = HashMap<String, f64>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
}

impl Operator {
    pub const fn precedence(&self) -> u8 {
        match self {
            Operator::Add | Operator::Subtract => 1,
            Operator::Multiply | Operator::Divide | Operator::Modulo => 2,
            Operator::Power => 3,
        }
    }

    pub const fn associativity(&self) -> Associativity {
        match self {
            Operator::Power => Associativity::Right,
            _ => Associativity::Left,
        }
    }

    pub const fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
            Operator::Power => "^",
        }
    }

    /// IEEE-754 semantics throughout: no division-by-zero check, and `%` is
    /// the truncating remainder (sign follows the dividend).
    pub fn apply(&self, left: f64, right: f64) -> f64 {
        match self {
            Operator::Add => left + right,
            Operator::Subtract => left - right,
            Operator::Multiply => left * right,
            Operator::Divide => left / right,
            Operator::Modulo => left % right,
            Operator::Power => left.powf(right),
        }
    }
}

impl TryFrom<&str> for Operator {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "+" => Ok(Operator::Add),
            "-" => Ok(Operator::Subtract),
            "*" => Ok(Operator::Multiply),
            "/" => Ok(Operator::Divide),
            "%" => Ok(Operator::Modulo),
            "^" => Ok(Operator::Power),
            _ => Err(EngineError::UnknownToken(value.to_string())),
        }
    }
}

/// An ordered sequence of token atoms.
///
/// The flat string form joins atoms with single spaces; converting from a
/// string splits on `' '` and drops empty atoms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Tokens(Vec<String>);

impl Tokens {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn join(&self) -> String {
        self.0.join(" ")
    }
}

impl From<&str> for Tokens {
    fn from(value: &str) -> Self {
        Self(
            value
                .split(' ')
                .filter(|atom| !atom.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

impl From<String> for Tokens {
    fn from(value: String) -> Self {
        Tokens::from(value.as_str())
    }
}

impl From<&String> for Tokens {
    fn from(value: &String) -> Self {
        Tokens::from(value.as_str())
    }
}

impl From<Vec<String>> for Tokens {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

impl From<Vec<&str>> for Tokens {
    fn from(value: Vec<&str>) -> Self {
        Self(value.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Tokens {
    fn from(value: &[&str]) -> Self {
        Self(value.iter().map(|atom| atom.to_string()).collect())
    }
}

impl From<&[String]> for Tokens {
    fn from(value: &[String]) -> Self {
        Self(value.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for Tokens {
    fn from(value: [&str; N]) -> Self {
        Self(value.iter().map(|atom| atom.to_string()).collect())
    }
}

impl AsRef<[String]> for Tokens {
    fn as_ref(&self) -> &[String] {
        &self.0
    }
}
