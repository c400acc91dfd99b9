use crate::engine::{Associativity, Category, Classifier, Instruction, Operator};
use log::{debug, warn};

/// Percent-of is a postfix operator on the preceding operand, so it binds
/// tighter than every binary operator.
const PERCENT_OF_PRECEDENCE: u8 = 4;

#[derive(Debug, Clone, PartialEq)]
enum StackEntry {
    Operator(Operator),
    PercentOf,
    LeftParen,
    Function(String),
}

impl StackEntry {
    /// `None` for entries that only `)` or the final drain may pop.
    fn precedence(&self) -> Option<u8> {
        match self {
            StackEntry::Operator(operator) => Some(operator.precedence()),
            StackEntry::PercentOf => Some(PERCENT_OF_PRECEDENCE),
            StackEntry::LeftParen | StackEntry::Function(_) => None,
        }
    }

    fn into_instruction(self) -> Option<Instruction> {
        match self {
            StackEntry::Operator(operator) => Some(Instruction::Binary(operator)),
            StackEntry::PercentOf => Some(Instruction::PercentOf),
            StackEntry::Function(name) => Some(Instruction::Call(name)),
            StackEntry::LeftParen => None,
        }
    }
}

/// Shunting-yard conversion from infix tokens to postfix instructions.
///
/// Conversion never fails: unmatched parentheses are tolerated and unknown
/// tokens pass through as [`Instruction::Unknown`] for the evaluator to reject.
pub struct Converter<'a> {
    classifier: Classifier<'a>,
}

impl<'a> Converter<'a> {
    pub fn new(classifier: Classifier<'a>) -> Self {
        Self { classifier }
    }

    pub fn convert<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<Instruction> {
        debug!("Converting tokens: {}", join(tokens.iter().map(|token| token.as_ref())));

        let mut output = Vec::with_capacity(tokens.len());
        let mut operators: Vec<StackEntry> = Vec::new();

        for (index, token) in tokens.iter().enumerate() {
            let token = token.as_ref();
            let prior = index.checked_sub(1).map(|i| tokens[i].as_ref());
            let next = tokens.get(index + 1).map(|next| next.as_ref());

            match self.classifier.classify(token, prior, next) {
                Category::Number => output.push(match token.parse::<f64>() {
                    Ok(value) => Instruction::Push(value),
                    Err(_) => Instruction::Unknown(token.to_string()),
                }),
                Category::Identifier => output.push(Instruction::Load(token.to_string())),
                Category::PercentOfOperator => operators.push(StackEntry::PercentOf),
                Category::PercentOperator => {
                    Self::push_operator(Operator::Modulo, &mut operators, &mut output)
                }
                Category::Operator(operator) => {
                    Self::push_operator(operator, &mut operators, &mut output)
                }
                Category::FunctionName => operators.push(StackEntry::Function(token.to_string())),
                Category::LeftParen => operators.push(StackEntry::LeftParen),
                Category::RightParen => {
                    while let Some(entry) = operators.pop() {
                        if entry == StackEntry::LeftParen {
                            break;
                        }
                        output.extend(entry.into_instruction());
                    }

                    if matches!(operators.last(), Some(StackEntry::Function(_))) {
                        output.extend(operators.pop().and_then(StackEntry::into_instruction));
                    }
                }
                Category::Unknown => {
                    warn!("Invalid token: {}", token);
                    output.push(Instruction::Unknown(token.to_string()));
                }
            }
        }

        while let Some(entry) = operators.pop() {
            output.extend(entry.into_instruction());
        }

        debug!("Postfix: {}", join(output.iter().map(ToString::to_string)));
        output
    }

    fn push_operator(
        operator: Operator,
        operators: &mut Vec<StackEntry>,
        output: &mut Vec<Instruction>,
    ) {
        while let Some(top) = operators.last().and_then(StackEntry::precedence) {
            let pops = top > operator.precedence()
                || (top == operator.precedence()
                    && operator.associativity() == Associativity::Left);
            if !pops {
                break;
            }
            output.extend(operators.pop().and_then(StackEntry::into_instruction));
        }
        operators.push(StackEntry::Operator(operator));
    }
}

fn join<I, S>(atoms: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    atoms
        .into_iter()
        .map(|atom| atom.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Context, FunctionRegistry};

    fn postfix(registry: &FunctionRegistry, infix: &str) -> String {
        let tokens: Vec<&str> = infix.split(' ').collect();
        let instructions = Converter::new(Classifier::new(registry)).convert(&tokens);
        join(instructions.iter().map(ToString::to_string))
    }

    #[test]
    fn test_precedence() {
        let registry = FunctionRegistry::with_builtins();
        assert_eq!(postfix(&registry, "2 + 3 * 4"), "2 3 4 * +");
        assert_eq!(postfix(&registry, "2 * 3 + 4"), "2 3 * 4 +");
        assert_eq!(postfix(&registry, "10 + 2 * 3 - 4 / 2"), "10 2 3 * + 4 2 / -");
    }

    #[test]
    fn test_associativity() {
        let registry = FunctionRegistry::with_builtins();
        assert_eq!(postfix(&registry, "2 ^ 3 ^ 2"), "2 3 2 ^ ^");
        assert_eq!(postfix(&registry, "2 - 3 - 2"), "2 3 - 2 -");
        assert_eq!(postfix(&registry, "8 / 4 / 2"), "8 4 / 2 /");
    }

    #[test]
    fn test_parentheses() {
        let registry = FunctionRegistry::with_builtins();
        assert_eq!(postfix(&registry, "( 2 + 3 ) * 4"), "2 3 + 4 *");
        assert_eq!(
            postfix(&registry, "( ( 10 - 2 ) * 3 ) / ( 4 + 2 )"),
            "10 2 - 3 * 4 2 + /"
        );
    }

    #[test]
    fn test_function_follows_its_argument() {
        let registry = FunctionRegistry::with_builtins();
        assert_eq!(postfix(&registry, "sqrt ( 16 ) + 1"), "16 sqrt 1 +");
        assert_eq!(postfix(&registry, "abs ( cos ( 0 ) - 3 )"), "0 cos 3 - abs");
    }

    #[test]
    fn test_percent_forms() {
        let registry = FunctionRegistry::with_builtins();
        assert_eq!(postfix(&registry, "100 + 10 %"), "100 10 %p +");
        assert_eq!(postfix(&registry, "7 % 3"), "7 3 %");
        assert_eq!(postfix(&registry, "1 + 7 % 3"), "1 7 3 % +");
        assert_eq!(postfix(&registry, "200 10 %"), "200 10 %p");
        assert_eq!(postfix(&registry, "50 % * 2"), "50 %p 2 *");
    }

    #[test]
    fn test_bound_identifier_before_percent_is_an_operand() {
        let registry = FunctionRegistry::with_builtins();
        let bindings = Context::from([("sin".to_string(), 1.0)]);
        let classifier = Classifier::new(&registry).with_bindings(Some(&bindings));
        let instructions = Converter::new(classifier).convert(&["sin", "%", "4"]);
        assert_eq!(
            instructions,
            vec![
                Instruction::Load("sin".to_string()),
                Instruction::Push(4.0),
                Instruction::Binary(Operator::Modulo),
            ]
        );

        // only a numeric literal after `%` makes it modulo
        let instructions = Converter::new(classifier).convert(&["4", "%", "sin"]);
        assert_eq!(
            instructions,
            vec![
                Instruction::Push(4.0),
                Instruction::Load("sin".to_string()),
                Instruction::PercentOf,
            ]
        );
    }

    #[test]
    fn test_unbalanced_parentheses_are_tolerated() {
        let registry = FunctionRegistry::with_builtins();
        assert_eq!(postfix(&registry, "2 + 3 ) * 4"), "2 3 + 4 *");
        assert_eq!(postfix(&registry, "( 2 + 3"), "2 3 +");
    }

    #[test]
    fn test_unknown_tokens_pass_through() {
        let registry = FunctionRegistry::with_builtins();
        assert_eq!(postfix(&registry, "2 + @@"), "2 @@ +");
    }

    #[test]
    fn test_idempotent_on_postfix_output() {
        let registry = FunctionRegistry::with_builtins();
        let once = postfix(&registry, "2 + 3 * 4");
        assert_eq!(postfix(&registry, &once), once);
    }

    #[test]
    fn test_empty_input() {
        let registry = FunctionRegistry::new();
        let tokens: [&str; 0] = [];
        assert!(Converter::new(Classifier::new(&registry))
            .convert(&tokens)
            .is_empty());
    }
}
