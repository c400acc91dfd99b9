use crate::engine::{Context, EngineError, Evaluator, Tokens};
use log::debug;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub type NativeFn = Arc<dyn Fn(&[f64]) -> Result<f64, EngineError> + Send + Sync>;

#[derive(Clone)]
pub enum FunctionKind {
    Builtin { arity: usize, native: NativeFn },
    UserDefined { parameters: Vec<String>, body: Tokens },
}

#[derive(Clone)]
pub struct FunctionEntry {
    name: String,
    kind: FunctionKind,
}

impl FunctionEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FunctionKind {
        &self.kind
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.kind, FunctionKind::Builtin { .. })
    }

    pub fn arity(&self) -> usize {
        match &self.kind {
            FunctionKind::Builtin { arity, .. } => *arity,
            FunctionKind::UserDefined { parameters, .. } => parameters.len(),
        }
    }

    /// Calls the function with `args` in left-to-right order.
    ///
    /// A user-defined body is converted and evaluated with a fresh context
    /// binding each parameter to its positional argument, one nesting level
    /// below `evaluator`.
    pub fn invoke(&self, args: &[f64], evaluator: &Evaluator) -> Result<f64, EngineError> {
        if args.len() != self.arity() {
            return Err(EngineError::ArityMismatch {
                name: self.name.clone(),
                expected: self.arity(),
                found: args.len(),
            });
        }

        match &self.kind {
            FunctionKind::Builtin { native, .. } => native(args),
            FunctionKind::UserDefined { parameters, body } => {
                let context: Context = parameters
                    .iter()
                    .cloned()
                    .zip(args.iter().copied())
                    .collect();
                evaluator
                    .nested(&self.name, &context)?
                    .evaluate_infix(body.as_slice())
            }
        }
    }
}

impl fmt::Debug for FunctionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FunctionKind::Builtin { arity, .. } => f
                .debug_struct("Builtin")
                .field("name", &self.name)
                .field("arity", arity)
                .finish(),
            FunctionKind::UserDefined { parameters, body } => f
                .debug_struct("UserDefined")
                .field("name", &self.name)
                .field("parameters", parameters)
                .field("body", &body.join())
                .finish(),
        }
    }
}

/// Name to function mapping shared by conversion and evaluation.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, FunctionEntry>,
    generation: u64,
}

impl FunctionRegistry {
    /// Creates an empty registry. See [`FunctionRegistry::with_builtins`].
    pub fn new() -> Self {
        Self {
            functions: BTreeMap::new(),
            generation: 0,
        }
    }

    /// Creates a registry seeded with `sin, cos, tan, log, sqrt, abs`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::functions::register_functions(&mut registry);
        registry
    }

    pub fn lookup(&self, name: &str) -> Option<&FunctionEntry> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Bumped by every registration. Conversions made against an older
    /// generation may classify names differently.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Registers a native function with a fixed arity.
    pub fn register_builtin<F>(&mut self, name: &str, arity: usize, native: F)
    where
        F: Fn(&[f64]) -> Result<f64, EngineError> + Send + Sync + 'static,
    {
        let entry = FunctionEntry {
            name: name.to_string(),
            kind: FunctionKind::Builtin {
                arity,
                native: Arc::new(native),
            },
        };
        self.functions.insert(name.to_string(), entry);
        self.generation += 1;
    }

    /// Defines (or silently redefines) a function whose body is an infix
    /// token sequence over `parameters`.
    pub fn define(
        &mut self,
        name: &str,
        parameters: Vec<String>,
        body: impl Into<Tokens>,
    ) -> FunctionEntry {
        let body = body.into();
        debug!(
            "Defining function {}({}) = {}",
            name,
            parameters.join(", "),
            body.join()
        );

        let entry = FunctionEntry {
            name: name.to_string(),
            kind: FunctionKind::UserDefined { parameters, body },
        };
        if self.functions.insert(name.to_string(), entry.clone()).is_some() {
            debug!("Replaced previous definition of {}", name);
        }
        self.generation += 1;
        entry
    }

    /// Registered names in alphabetical order.
    pub fn names(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
