use crate::engine::{Classifier, Context, Converter, EngineError, FunctionRegistry, Instruction};
use log::{debug, trace, warn};

/// Default nesting limit for user-defined function calls.
pub const DEFAULT_MAX_DEPTH: usize = 64;

struct ValueStack {
    values: Vec<f64>,
}

impl ValueStack {
    fn new() -> Self {
        Self { values: Vec::new() }
    }

    fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    /// Pops `N` operands, returned in push order.
    fn pop_operands<const N: usize>(&mut self, operator: &str) -> Result<[f64; N], EngineError> {
        let available = self.values.len();
        if available < N {
            return Err(EngineError::StackUnderflow {
                operator: operator.to_string(),
                needed: N,
                available,
            });
        }

        let mut operands = [0.0; N];
        operands.copy_from_slice(&self.values[available - N..]);
        self.values.truncate(available - N);
        Ok(operands)
    }

    fn pop_arguments(&mut self, name: &str, arity: usize) -> Result<Vec<f64>, EngineError> {
        let available = self.values.len();
        if available < arity {
            return Err(EngineError::ArityMismatch {
                name: name.to_string(),
                expected: arity,
                found: available,
            });
        }
        Ok(self.values.split_off(available - arity))
    }

    fn finish(self) -> Result<f64, EngineError> {
        if self.values.len() == 1 {
            Ok(self.values[0])
        } else {
            Err(EngineError::MalformedExpression {
                remaining: self.values,
            })
        }
    }
}

/// Postfix stack machine.
///
/// Borrows one registry snapshot for the whole call, including nested
/// user-defined function bodies. The value stack is local to each
/// [`Evaluator::evaluate`] call.
#[derive(Clone, Copy)]
pub struct Evaluator<'a> {
    registry: &'a FunctionRegistry,
    context: Option<&'a Context>,
    depth: usize,
    max_depth: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(registry: &'a FunctionRegistry) -> Self {
        Self {
            registry,
            context: None,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_context(mut self, context: Option<&'a Context>) -> Self {
        self.context = context;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn classifier(&self) -> Classifier<'a> {
        Classifier::new(self.registry).with_bindings(self.context)
    }

    /// Evaluator for the body of `name`, one level deeper, seeing only `context`.
    pub(crate) fn nested<'b>(
        &self,
        name: &str,
        context: &'b Context,
    ) -> Result<Evaluator<'b>, EngineError>
    where
        'a: 'b,
    {
        if self.depth >= self.max_depth {
            return Err(EngineError::RecursionLimitExceeded {
                name: name.to_string(),
                limit: self.max_depth,
            });
        }

        Ok(Evaluator {
            registry: self.registry,
            context: Some(context),
            depth: self.depth + 1,
            max_depth: self.max_depth,
        })
    }

    /// Converts infix `tokens` and evaluates the result.
    pub fn evaluate_infix<S: AsRef<str>>(&self, tokens: &[S]) -> Result<f64, EngineError> {
        let postfix = Converter::new(self.classifier()).convert(tokens);
        self.evaluate(&postfix)
    }

    /// Evaluates already-postfix text, where `%` is modulo and `%p` is percent-of.
    pub fn evaluate_postfix<S: AsRef<str>>(&self, tokens: &[S]) -> Result<f64, EngineError> {
        let classifier = self.classifier();
        let instructions: Vec<Instruction> = tokens
            .iter()
            .map(|token| Instruction::from_postfix_text(token.as_ref(), &classifier))
            .collect();
        self.evaluate(&instructions)
    }

    pub fn evaluate(&self, instructions: &[Instruction]) -> Result<f64, EngineError> {
        debug!(
            "Evaluating (depth {}): {}",
            self.depth,
            instructions
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        );

        let mut stack = ValueStack::new();

        for instruction in instructions {
            trace!("{:?} <- {}", stack.values, instruction);
            match instruction {
                Instruction::Push(value) => stack.push(*value),

                Instruction::Binary(operator) => {
                    let [a, b] = stack.pop_operands::<2>(operator.symbol())?;
                    stack.push(operator.apply(a, b));
                }

                Instruction::PercentOf => {
                    let [base, percent] = stack.pop_operands::<2>("%")?;
                    stack.push(base);
                    stack.push(base * (percent / 100.0));
                }

                Instruction::Load(name) => match self.binding(name) {
                    Some(value) => stack.push(value),
                    None if self.registry.contains(name) => self.call(name, &mut stack)?,
                    None => return Err(EngineError::UnknownToken(name.clone())),
                },

                Instruction::Call(name) => match self.binding(name) {
                    Some(value) => stack.push(value),
                    None => self.call(name, &mut stack)?,
                },

                Instruction::Unknown(token) => {
                    warn!("Invalid token: {}", token);
                    return Err(EngineError::UnknownToken(token.clone()));
                }
            }
        }

        let result = stack.finish();
        debug!("Evaluated (depth {}): {:?}", self.depth, result);
        result
    }

    fn binding(&self, name: &str) -> Option<f64> {
        self.context
            .and_then(|context| context.get(name))
            .copied()
    }

    fn call(&self, name: &str, stack: &mut ValueStack) -> Result<(), EngineError> {
        let entry = self
            .registry
            .lookup(name)
            .ok_or_else(|| EngineError::UnknownToken(name.to_string()))?;

        let args = stack.pop_arguments(name, entry.arity())?;
        let result = entry.invoke(&args, self)?;
        trace!("{}({:?}) = {}", name, args, result);
        stack.push(result);
        Ok(())
    }
}
