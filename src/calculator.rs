use crate::config::Config;
use crate::engine::{
    is_numeric, Classifier, Context, Converter, EngineError, Evaluator, FunctionEntry,
    FunctionRegistry, Instruction, Tokens,
};
use log::debug;
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Registry handle shared between calculators and threads.
pub type SharedRegistry = Arc<RwLock<FunctionRegistry>>;

/// Postfix conversions valid for one registry generation.
struct ConversionCache {
    generation: u64,
    entries: LruCache<Tokens, Arc<[Instruction]>>,
}

impl ConversionCache {
    fn new(size: NonZeroUsize) -> Self {
        Self {
            generation: 0,
            entries: LruCache::new(size),
        }
    }

    /// Drops everything converted against another registry generation.
    fn sync(&mut self, generation: u64) {
        if self.generation != generation {
            if !self.entries.is_empty() {
                debug!(
                    "Registry changed ({} -> {}), dropping {} cached conversions",
                    self.generation,
                    generation,
                    self.entries.len()
                );
            }
            self.entries.clear();
            self.generation = generation;
        }
    }
}

/// Entry point for collaborators: conversion, evaluation, function
/// definition and introspection over one shared registry.
///
/// Every call holds a read guard on the registry for its whole duration, so a
/// concurrent [`Calculator::define`] never lands mid-evaluation. Cached
/// conversions are tagged with the registry generation, so registrations made
/// through any handle to the registry invalidate them.
pub struct Calculator {
    registry: SharedRegistry,
    cache: Option<Mutex<ConversionCache>>,
    max_depth: usize,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator {
    /// Calculator with the built-in functions and default configuration.
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        let registry = Arc::new(RwLock::new(FunctionRegistry::with_builtins()));
        Self::with_registry(registry, config)
    }

    /// Calculator over an existing registry handle.
    pub fn with_registry(registry: SharedRegistry, config: &Config) -> Self {
        let cache = NonZeroUsize::new(config.conversion_cache_size)
            .map(|size| Mutex::new(ConversionCache::new(size)));
        Self {
            registry,
            cache,
            max_depth: config.max_recursion_depth,
        }
    }

    pub fn registry(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }

    /// Infix to postfix, in text form. Percent-of is rendered as `%p`.
    pub fn convert(&self, tokens: impl Into<Tokens>) -> Vec<String> {
        self.compile(tokens)
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Infix to postfix instructions, served from the conversion cache when possible.
    pub fn compile(&self, tokens: impl Into<Tokens>) -> Arc<[Instruction]> {
        let registry = self.registry.read();
        self.compile_with(&registry, tokens.into())
    }

    /// Evaluates `tokens`, converting them from infix first when
    /// `requires_conversion` is set. `context` binds identifiers.
    pub fn evaluate(
        &self,
        tokens: impl Into<Tokens>,
        requires_conversion: bool,
        context: Option<&Context>,
    ) -> Result<f64, EngineError> {
        let tokens = tokens.into();
        let registry = self.registry.read();
        let evaluator = Evaluator::new(&registry)
            .with_context(context)
            .with_max_depth(self.max_depth);

        if !requires_conversion {
            return evaluator.evaluate_postfix(tokens.as_slice());
        }

        match context {
            // bindings change classification, so these skip the cache
            Some(_) => evaluator.evaluate_infix(tokens.as_slice()),
            None => {
                let postfix = self.compile_with(&registry, tokens);
                evaluator.evaluate(&postfix)
            }
        }
    }

    /// Evaluates independent infix expressions in parallel.
    pub fn evaluate_batch(&self, expressions: &[Tokens]) -> Vec<Result<f64, EngineError>> {
        expressions
            .par_iter()
            .map(|tokens| self.evaluate(tokens.clone(), true, None))
            .collect()
    }

    /// Registers (or replaces) a user-defined function. `body` may be a token
    /// sequence or a string split on single spaces.
    pub fn define<P, S>(&self, name: &str, parameters: P, body: impl Into<Tokens>) -> FunctionEntry
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parameters = parameters.into_iter().map(Into::into).collect();
        self.registry.write().define(name, parameters, body)
    }

    pub fn is_numeric(token: &str) -> bool {
        is_numeric(token)
    }

    /// Registered function names in alphabetical order.
    pub fn list_functions(&self) -> Vec<String> {
        self.registry.read().names()
    }

    fn compile_with(&self, registry: &FunctionRegistry, tokens: Tokens) -> Arc<[Instruction]> {
        if let Some(cache) = &self.cache {
            let mut cache = cache.lock();
            cache.sync(registry.generation());
            if let Some(postfix) = cache.entries.get(&tokens) {
                debug!("Conversion cache hit: {}", tokens.join());
                return Arc::clone(postfix);
            }
        }

        let postfix: Arc<[Instruction]> = Converter::new(Classifier::new(registry))
            .convert(tokens.as_slice())
            .into();

        // the read guard pins the generation, so this entry cannot be stale
        if let Some(cache) = &self.cache {
            let mut cache = cache.lock();
            cache.sync(registry.generation());
            cache.entries.put(tokens, Arc::clone(&postfix));
        }
        postfix
    }
}
