use crate::engine::{is_numeric, Tokens};

/// Assembles keystroke atoms into calculator tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputBuffer {
    tokens: Vec<String>,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn to_tokens(&self) -> Tokens {
        Tokens::from(self.tokens.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The atoms as typed, without separators.
    pub fn display(&self) -> String {
        self.tokens.concat()
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    pub fn replace(&mut self, tokens: Vec<String>) {
        self.tokens = tokens;
    }

    /// Pushes a complete token without merging it into its neighbour.
    pub fn push_token(&mut self, token: String) {
        self.tokens.push(token);
    }

    /// Pushes one keystroke atom.
    ///
    /// Digits extend the number being typed, and a digit right after a
    /// leading `-` (at the start or after `(`) becomes a negative literal.
    /// Everything else starts a new token.
    pub fn push(&mut self, atom: &str) {
        if atom == "." {
            return self.push_decimal_point();
        }

        if !is_numeric(atom) {
            self.tokens.push(atom.to_string());
            return;
        }

        let sign_position = self.at_sign_position();
        match self.tokens.last_mut() {
            Some(last) if is_numeric(last) => {
                // a lone zero is replaced: `0` then `7` reads `7`, not `07`
                if last == "0" || last == "-0" {
                    if atom != "00" && atom != "0" {
                        last.pop();
                        last.push_str(atom);
                    }
                } else {
                    last.push_str(atom);
                }
            }
            Some(last) if sign_position => {
                last.push_str(if atom == "00" { "0" } else { atom });
            }
            _ => self
                .tokens
                .push(if atom == "00" { "0" } else { atom }.to_string()),
        }
    }

    pub fn push_decimal_point(&mut self) {
        let sign_position = self.at_sign_position();
        match self.tokens.last_mut() {
            Some(last) if is_numeric(last) => {
                if !last.contains(['.', 'e', 'E']) {
                    last.push('.');
                }
            }
            Some(last) if sign_position => last.push_str("0."),
            _ => self.tokens.push("0.".to_string()),
        }
    }

    /// Removes the last typed character.
    pub fn backspace(&mut self) {
        if let Some(mut last) = self.tokens.pop() {
            if last.chars().count() >= 2 {
                last.pop();
                self.tokens.push(last);
            }
        }
    }

    /// True when the last token is a `-` that can only be a sign.
    fn at_sign_position(&self) -> bool {
        match self.tokens.as_slice() {
            [.., last] if last != "-" => false,
            [_] => true,
            [.., before, _] => before == "(",
            [] => false,
        }
    }
}
