use crate::engine::{Category, Classifier, Operator};
use std::fmt;

/// Text form of the percent-of marker in serialized postfix.
pub const PERCENT_OF: &str = "%p";

/// One postfix step. The two meanings of `%` are already told apart here:
/// modulo is `Binary(Operator::Modulo)`, percent-of is `PercentOf`.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Push(f64),
    Load(String),
    Binary(Operator),
    PercentOf,
    Call(String),
    /// Carried through conversion untouched so evaluation can reject it.
    Unknown(String),
}

impl Instruction {
    /// Reads one atom of already-postfix text. A bare `%` is modulo here.
    pub fn from_postfix_text(token: &str, classifier: &Classifier) -> Self {
        if token == PERCENT_OF {
            return Instruction::PercentOf;
        }

        match classifier.classify_atom(token) {
            Category::Number => match token.parse::<f64>() {
                Ok(value) => Instruction::Push(value),
                Err(_) => Instruction::Unknown(token.to_string()),
            },
            Category::Operator(operator) => Instruction::Binary(operator),
            Category::PercentOperator => Instruction::Binary(Operator::Modulo),
            Category::PercentOfOperator => Instruction::PercentOf,
            Category::Identifier => Instruction::Load(token.to_string()),
            Category::FunctionName => Instruction::Call(token.to_string()),
            Category::LeftParen | Category::RightParen | Category::Unknown => {
                Instruction::Unknown(token.to_string())
            }
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Push(value) => write!(f, "{}", value),
            Instruction::Load(name) | Instruction::Call(name) | Instruction::Unknown(name) => {
                f.write_str(name)
            }
            Instruction::Binary(operator) => f.write_str(operator.symbol()),
            Instruction::PercentOf => f.write_str(PERCENT_OF),
        }
    }
}
