use crate::engine::{Context, FunctionRegistry, Operator};
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "engine/token.pest"]
struct LiteralParser;

/// True for a signed or unsigned decimal literal such as `42`, `-3.5`, `.5` or
/// `1e3`. Literals that overflow to infinity are not numeric.
pub fn is_numeric(token: &str) -> bool {
    LiteralParser::parse(Rule::number_token, token).is_ok()
        && token.parse::<f64>().is_ok_and(f64::is_finite)
}

pub fn is_identifier(token: &str) -> bool {
    LiteralParser::parse(Rule::identifier_token, token).is_ok()
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Category {
    Number,
    /// A binary operator other than the two percent forms.
    Operator(Operator),
    LeftParen,
    RightParen,
    Identifier,
    FunctionName,
    /// `%` used as modulo.
    PercentOperator,
    /// `%` used as "percent of the preceding value".
    PercentOfOperator,
    Unknown,
}

/// Decides token categories against a registry snapshot and, while a user
/// function body is being handled, its parameter bindings.
#[derive(Clone, Copy)]
pub struct Classifier<'a> {
    registry: &'a FunctionRegistry,
    bindings: Option<&'a Context>,
}

impl<'a> Classifier<'a> {
    pub fn new(registry: &'a FunctionRegistry) -> Self {
        Self {
            registry,
            bindings: None,
        }
    }

    pub fn with_bindings(mut self, bindings: Option<&'a Context>) -> Self {
        self.bindings = bindings;
        self
    }

    /// Classifies `token` given its neighbours in the infix sequence.
    ///
    /// Only `%` looks at the neighbours: it means "percent of" when the prior
    /// token is an operand and the next token is missing or not a numeric
    /// literal, and modulo otherwise. A following identifier does not make it
    /// modulo.
    pub fn classify(&self, token: &str, prior: Option<&str>, next: Option<&str>) -> Category {
        match self.classify_atom(token) {
            Category::PercentOperator => {
                let after_operand = prior.is_some_and(|prior| self.is_operand(prior));
                let before_number = next.is_some_and(is_numeric);
                if after_operand && !before_number {
                    Category::PercentOfOperator
                } else {
                    Category::PercentOperator
                }
            }
            category => category,
        }
    }

    /// Context-free classification; a bare `%` comes back as modulo.
    pub fn classify_atom(&self, token: &str) -> Category {
        if is_numeric(token) {
            return Category::Number;
        }

        match token {
            "(" => return Category::LeftParen,
            ")" => return Category::RightParen,
            "%" => return Category::PercentOperator,
            _ => {}
        }

        if let Ok(operator) = Operator::try_from(token) {
            return Category::Operator(operator);
        }

        if !is_identifier(token) {
            return Category::Unknown;
        }

        if self.is_bound(token) || self.registry.lookup(token).is_none() {
            Category::Identifier
        } else {
            Category::FunctionName
        }
    }

    pub fn is_operand(&self, token: &str) -> bool {
        matches!(
            self.classify_atom(token),
            Category::Number | Category::Identifier
        )
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.bindings.is_some_and(|bindings| bindings.contains_key(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::register_functions;

    fn setup_registry() -> FunctionRegistry {
        let mut registry = FunctionRegistry::new();
        register_functions(&mut registry);
        registry
    }

    #[test]
    fn test_numeric_literals() {
        for token in ["0", "42", "-3", "+7", "3.25", "-0.5", ".5", "3.", "1e3", "2.5E-2"] {
            assert!(is_numeric(token), "{token} should be numeric");
        }
        for token in [
            "", "-", ".", "e3", "1e", "1.2.3", "inf", "NaN", "12a", " 1", "1e400", "-1e400",
        ] {
            assert!(!is_numeric(token), "{token} should not be numeric");
        }
    }

    #[test]
    fn test_identifier_pattern() {
        assert!(is_identifier("x"));
        assert!(is_identifier("_tmp1"));
        assert!(is_identifier("rate_2"));
        assert!(!is_identifier("2x"));
        assert!(!is_identifier("a-b"));
    }

    #[test]
    fn test_fixed_categories() {
        let registry = setup_registry();
        let classifier = Classifier::new(&registry);

        assert_eq!(classifier.classify("(", None, None), Category::LeftParen);
        assert_eq!(classifier.classify(")", None, None), Category::RightParen);
        assert_eq!(
            classifier.classify("^", None, None),
            Category::Operator(Operator::Power)
        );
        assert_eq!(classifier.classify("-4", None, None), Category::Number);
        assert_eq!(classifier.classify("@@", None, None), Category::Unknown);
    }

    #[test]
    fn test_function_names_and_identifiers() {
        let registry = setup_registry();
        let classifier = Classifier::new(&registry);

        assert_eq!(classifier.classify("sqrt", None, None), Category::FunctionName);
        assert_eq!(classifier.classify("width", None, None), Category::Identifier);
    }

    #[test]
    fn test_bindings_shadow_functions() {
        let registry = setup_registry();
        let bindings = Context::from([("abs".to_string(), 2.0)]);
        let classifier = Classifier::new(&registry).with_bindings(Some(&bindings));

        assert_eq!(classifier.classify("abs", None, None), Category::Identifier);
        assert_eq!(classifier.classify("cos", None, None), Category::FunctionName);
    }

    #[test]
    fn test_percent_depends_on_neighbours() {
        let registry = setup_registry();
        let classifier = Classifier::new(&registry);

        // trailing percent after a number
        assert_eq!(
            classifier.classify("%", Some("10"), None),
            Category::PercentOfOperator
        );
        // followed by an operator
        assert_eq!(
            classifier.classify("%", Some("10"), Some("+")),
            Category::PercentOfOperator
        );
        // between two numbers
        assert_eq!(
            classifier.classify("%", Some("7"), Some("3")),
            Category::PercentOperator
        );
        // after a closing paren
        assert_eq!(
            classifier.classify("%", Some(")"), None),
            Category::PercentOperator
        );
        assert_eq!(
            classifier.classify("%", None, Some("3")),
            Category::PercentOperator
        );
    }

    #[test]
    fn test_percent_before_identifier_is_percent_of() {
        let registry = setup_registry();
        let bindings = Context::from([("y".to_string(), 3.0)]);
        let classifier = Classifier::new(&registry).with_bindings(Some(&bindings));

        assert_eq!(
            classifier.classify("%", Some("10"), Some("y")),
            Category::PercentOfOperator
        );
        assert_eq!(
            classifier.classify("%", Some("y"), Some("3")),
            Category::PercentOperator
        );
        assert_eq!(
            classifier.classify("%", Some("10"), Some("(")),
            Category::PercentOfOperator
        );
    }
}
