//! Keystroke-driven calculator session: an input buffer feeding the
//! calculator. Evaluated results go to a session history, and entries the
//! user saves are kept in a separate memory list that is usually persisted.

mod history;
mod input;

pub use history::{History, HistoryEntry, HistoryError};
pub use input::InputBuffer;

use crate::calculator::Calculator;
use crate::engine::EngineError;
use log::debug;
use std::f64::consts::PI;

#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    /// Live result of the current input.
    Preview(f64),
    /// `=` succeeded; the input now holds the result.
    Evaluated(f64),
    /// `=` failed; the input is left untouched.
    Failed(EngineError),
    Idle,
}

pub struct Session {
    calculator: Calculator,
    input: InputBuffer,
    history: History,
    memory: History,
}

impl Session {
    /// Starts with an empty in-memory history. `memory` holds saved entries
    /// and is normally opened from disk.
    pub fn new(calculator: Calculator, memory: History) -> Self {
        Self {
            calculator,
            input: InputBuffer::new(),
            history: History::in_memory(),
            memory,
        }
    }

    pub fn calculator(&self) -> &Calculator {
        &self.calculator
    }

    pub fn input(&self) -> &InputBuffer {
        &self.input
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn memory(&self) -> &History {
        &self.memory
    }

    /// Handles one key. Errors only come from history storage.
    pub fn press(&mut self, key: &str) -> Result<KeyOutcome, HistoryError> {
        match key {
            "=" => return self.equals(),
            "trace" => {}
            "clear" | "c" => {
                self.input.clear();
                return Ok(KeyOutcome::Idle);
            }
            "backspace" | "clear-one" => self.input.backspace(),
            "." => self.input.push_decimal_point(),
            "pi" => self.input.push_token(PI.to_string()),
            _ => self.input.push(key),
        }
        Ok(self.trace())
    }

    /// Evaluates the input without committing it. Failures are expected
    /// while typing and yield `Idle`.
    pub fn trace(&self) -> KeyOutcome {
        if self.input.is_empty() {
            return KeyOutcome::Idle;
        }

        match self.calculator.evaluate(self.input.to_tokens(), true, None) {
            Ok(value) => KeyOutcome::Preview(value),
            Err(err) => {
                debug!("No preview for '{}': {}", self.input.display(), err);
                KeyOutcome::Idle
            }
        }
    }

    pub fn equals(&mut self) -> Result<KeyOutcome, HistoryError> {
        if self.input.is_empty() {
            return Ok(KeyOutcome::Idle);
        }

        match self.calculator.evaluate(self.input.to_tokens(), true, None) {
            Ok(value) => {
                let entry = HistoryEntry::new(
                    self.input.tokens().to_vec(),
                    self.input.display(),
                    value,
                );
                self.history.push(entry)?;
                self.input.replace(vec![value.to_string()]);
                Ok(KeyOutcome::Evaluated(value))
            }
            Err(err) => Ok(KeyOutcome::Failed(err)),
        }
    }

    /// Copies a history entry into memory. Returns `false` when the id is not
    /// in the history or is already saved.
    pub fn save_to_memory(&mut self, id: &str) -> Result<bool, HistoryError> {
        if self.memory.get(id).is_some() {
            return Ok(false);
        }
        let Some(entry) = self.history.get(id) else {
            return Ok(false);
        };
        self.memory.push(entry.clone())?;
        Ok(true)
    }

    /// Deletes an entry from the history, or from memory when the history
    /// has no such id.
    pub fn remove(&mut self, id: &str) -> Result<Option<HistoryEntry>, HistoryError> {
        match self.history.remove(id)? {
            Some(entry) => Ok(Some(entry)),
            None => self.memory.remove(id),
        }
    }

    /// Deletes the most recent history entry.
    pub fn remove_last(&mut self) -> Result<Option<HistoryEntry>, HistoryError> {
        self.history.pop()
    }

    /// Restores the tokens of a history or memory entry into the input.
    pub fn recall(&mut self, id: &str) -> Option<f64> {
        let entry = self.history.get(id).or_else(|| self.memory.get(id))?;
        self.input.replace(entry.expr.clone());
        Some(entry.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup_session() -> Session {
        Session::new(Calculator::new(), History::in_memory())
    }

    fn press_all(session: &mut Session, keys: &[&str]) -> KeyOutcome {
        let mut outcome = KeyOutcome::Idle;
        for key in keys {
            outcome = session.press(key).unwrap();
        }
        outcome
    }

    #[test]
    fn test_typing_previews_result() {
        let mut session = setup_session();
        assert_eq!(
            press_all(&mut session, &["1", "2", "+", "3"]),
            KeyOutcome::Preview(15.0)
        );
        assert_eq!(session.input().display(), "12+3");
        assert_eq!(session.press("+").unwrap(), KeyOutcome::Idle);
    }

    #[test]
    fn test_equals_records_history() {
        let mut session = setup_session();
        let outcome = press_all(&mut session, &["1", "0", "0", "+", "1", "0", "%", "="]);
        assert_eq!(outcome, KeyOutcome::Evaluated(110.0));
        assert_eq!(session.input().tokens(), &["110"]);

        let entry = session.history().iter().next().unwrap();
        assert_eq!(entry.expr, vec!["100", "+", "10", "%"]);
        assert_eq!(entry.input, "100+10%");
        assert_eq!(entry.result, 110.0);
    }

    #[test]
    fn test_result_feeds_next_expression() {
        let mut session = setup_session();
        press_all(&mut session, &["6", "*", "7", "="]);
        assert_eq!(
            press_all(&mut session, &["-", "2", "="]),
            KeyOutcome::Evaluated(40.0)
        );
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn test_failed_equals_keeps_input() {
        let mut session = setup_session();
        let outcome = press_all(&mut session, &["2", "*", "="]);
        assert!(matches!(
            outcome,
            KeyOutcome::Failed(EngineError::StackUnderflow { .. })
        ));
        assert_eq!(session.input().tokens(), &["2", "*"]);
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_functions_and_constants() {
        let mut session = setup_session();
        assert_eq!(
            press_all(&mut session, &["sqrt", "(", "8", "1", ")"]),
            KeyOutcome::Preview(9.0)
        );
        session.press("c").unwrap();
        assert!(session.input().is_empty());
        match press_all(&mut session, &["cos", "(", "pi", ")"]) {
            KeyOutcome::Preview(value) => assert!((value + 1.0).abs() < 1e-12),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_backspace_updates_preview() {
        let mut session = setup_session();
        press_all(&mut session, &["9", "+", "1", "2"]);
        assert_eq!(session.press("backspace").unwrap(), KeyOutcome::Preview(10.0));
    }

    #[test]
    fn test_user_function_through_session() {
        let mut session = setup_session();
        session.calculator().define("custom", ["x"], "x + 5");
        assert_eq!(
            press_all(&mut session, &["custom", "(", "3", ")", "="]),
            KeyOutcome::Evaluated(8.0)
        );
    }

    #[test]
    fn test_history_is_not_memory() {
        let mut session = setup_session();
        press_all(&mut session, &["1", "+", "2", "="]);
        assert_eq!(session.history().len(), 1);
        assert!(session.memory().is_empty());
    }

    #[test]
    fn test_save_to_memory() {
        let mut session = setup_session();
        press_all(&mut session, &["6", "*", "7", "="]);
        let id = session.history().iter().next().unwrap().id.clone();

        assert!(session.save_to_memory(&id).unwrap());
        assert!(!session.save_to_memory(&id).unwrap());
        assert!(!session.save_to_memory("missing").unwrap());
        assert_eq!(session.memory().len(), 1);
        assert_eq!(session.memory().get(&id).unwrap().result, 42.0);

        // deleting from history keeps the saved copy
        assert!(session.remove(&id).unwrap().is_some());
        assert!(session.history().is_empty());
        assert_eq!(session.recall(&id), Some(42.0));

        assert!(session.remove(&id).unwrap().is_some());
        assert!(session.memory().is_empty());
        assert!(session.remove(&id).unwrap().is_none());
    }

    #[test]
    fn test_memory_persists_across_sessions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("memory.json");

        let mut session = Session::new(Calculator::new(), History::open(&path).unwrap());
        press_all(&mut session, &["2", "^", "8", "="]);
        press_all(&mut session, &["+", "1", "="]);
        let id = session.history().iter().next().unwrap().id.clone();
        session.save_to_memory(&id).unwrap();

        let mut reopened = Session::new(Calculator::new(), History::open(&path).unwrap());
        assert!(reopened.history().is_empty());
        assert_eq!(reopened.memory().len(), 1);
        assert_eq!(reopened.recall(&id), Some(256.0));
        assert_eq!(reopened.input().tokens(), &["2", "^", "8"]);
    }

    #[test]
    fn test_remove_last() {
        let mut session = setup_session();
        press_all(&mut session, &["1", "=", "c", "2", "="]);
        assert_eq!(session.remove_last().unwrap().map(|entry| entry.result), Some(2.0));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_recall() {
        let mut session = setup_session();
        press_all(&mut session, &["2", "^", "1", "0", "="]);
        let id = session.history().iter().next().unwrap().id.clone();
        session.press("clear").unwrap();

        assert_eq!(session.recall(&id), Some(1024.0));
        assert_eq!(session.input().tokens(), &["2", "^", "10"]);
        assert_eq!(session.recall("missing"), None);
    }
}
