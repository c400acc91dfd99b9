use crate::engine::DEFAULT_MAX_DEPTH;
use log::warn;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const MAX_DEPTH_VAR: &str = "RECKON_MAX_DEPTH";
pub const CACHE_SIZE_VAR: &str = "RECKON_CACHE_SIZE";
pub const MEMORY_VAR: &str = "RECKON_MEMORY";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Deepest allowed chain of nested user-defined function calls.
    pub max_recursion_depth: usize,
    /// Entries kept in the conversion cache; 0 disables it.
    pub conversion_cache_size: usize,
    /// File backing the saved-results memory; `None` keeps it in memory.
    pub memory_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_recursion_depth: DEFAULT_MAX_DEPTH,
            conversion_cache_size: 100,
            memory_path: None,
        }
    }
}

impl Config {
    /// Defaults overridden by `RECKON_MAX_DEPTH`, `RECKON_CACHE_SIZE` and
    /// `RECKON_MEMORY`. Unparsable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            max_recursion_depth: parse_or(&lookup, MAX_DEPTH_VAR, defaults.max_recursion_depth),
            conversion_cache_size: parse_or(
                &lookup,
                CACHE_SIZE_VAR,
                defaults.conversion_cache_size,
            ),
            memory_path: lookup(MEMORY_VAR)
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    pub fn with_conversion_cache_size(mut self, size: usize) -> Self {
        self.conversion_cache_size = size;
        self
    }

    pub fn with_memory_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.memory_path = Some(path.into());
        self
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring {}={:?}: not a valid number", key, raw);
            default
        }),
        None => default,
    }
}
