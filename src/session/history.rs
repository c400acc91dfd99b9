use log::debug;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const ID_LENGTH: usize = 16;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history storage: {0}")]
    Io(#[from] io::Error),

    #[error("history format: {0}")]
    Json(#[from] serde_json::Error),
}

/// One evaluated expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    /// Infix tokens that were evaluated.
    pub expr: Vec<String>,
    /// The input line as it was displayed.
    pub input: String,
    #[serde(with = "float_repr")]
    pub result: f64,
}

impl HistoryEntry {
    pub fn new(expr: Vec<String>, input: String, result: f64) -> Self {
        Self {
            id: random_id(ID_LENGTH),
            expr,
            input,
            result,
        }
    }
}

fn random_id(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Ordered list of past results, optionally mirrored to a JSON file after
/// every change.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
    path: Option<PathBuf>,
}

impl History {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens a persistent history, loading `path` if it exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(data) if data.trim().is_empty() => Vec::new(),
            Ok(data) => serde_json::from_str(&data)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        debug!("Loaded {} history entries from {}", entries.len(), path.display());

        Ok(Self {
            entries,
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn push(&mut self, entry: HistoryEntry) -> Result<(), HistoryError> {
        self.entries.push(entry);
        self.save()
    }

    pub fn pop(&mut self) -> Result<Option<HistoryEntry>, HistoryError> {
        let entry = self.entries.pop();
        if entry.is_some() {
            self.save()?;
        }
        Ok(entry)
    }

    pub fn remove(&mut self, id: &str) -> Result<Option<HistoryEntry>, HistoryError> {
        let Some(index) = self.entries.iter().position(|entry| entry.id == id) else {
            return Ok(None);
        };
        let entry = self.entries.remove(index);
        self.save()?;
        Ok(Some(entry))
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn save(&self) -> Result<(), HistoryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}

/// JSON has no inf/NaN, so non-finite results are stored as text.
mod float_repr {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_str(&value.to_string())
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Text(text) => text.parse().map_err(D::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(expr: &str, result: f64) -> HistoryEntry {
        HistoryEntry::new(
            expr.split(' ').map(str::to_string).collect(),
            expr.replace(' ', ""),
            result,
        )
    }

    #[test]
    fn test_random_id() {
        let id = random_id(16);
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(random_id(16), id);
    }

    #[test]
    fn test_in_memory_operations() {
        let mut history = History::in_memory();
        let first = entry("1 + 1", 2.0);
        let second = entry("2 * 3", 6.0);
        let first_id = first.id.clone();

        history.push(first).unwrap();
        history.push(second.clone()).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.get(&first_id).unwrap().result, 2.0);

        assert_eq!(history.remove(&first_id).unwrap().unwrap().input, "1+1");
        assert!(history.remove("missing").unwrap().is_none());
        assert_eq!(history.pop().unwrap(), Some(second));
        assert!(history.is_empty());
        assert_eq!(history.pop().unwrap(), None);
    }

    #[test]
    fn test_persistent_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");

        let mut history = History::open(&path).unwrap();
        assert!(history.is_empty());
        history.push(entry("100 + 10 %", 110.0)).unwrap();
        history.push(entry("1 / 0", f64::INFINITY)).unwrap();

        let reopened = History::open(&path).unwrap();
        let results: Vec<f64> = reopened.iter().map(|entry| entry.result).collect();
        assert_eq!(results, vec![110.0, f64::INFINITY]);
        assert_eq!(reopened.path(), Some(path.as_path()));
    }

    #[test]
    fn test_nan_survives_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");

        History::open(&path)
            .unwrap()
            .push(entry("0 / 0", f64::NAN))
            .unwrap();
        let reopened = History::open(&path).unwrap();
        assert!(reopened.iter().next().unwrap().result.is_nan());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(History::open(&path), Err(HistoryError::Json(_))));
    }
}
