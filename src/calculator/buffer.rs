//! Expression input state machine.
//!
//! Holds the in-progress expression text and the error sentinel. The buffer
//! accepts any interleaving of digits and operators; validity is deferred to
//! evaluation time, so none of these operations can fail.

/// A logical input token as delivered by the surrounding UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputToken {
    /// Reset the buffer (`"C"`).
    Clear,
    /// Remove the last character, or clear an error (`"Backspace"`).
    Backspace,
    /// Evaluate the current expression (`"="`).
    Submit,
    /// Append a single character to the expression.
    Char(char),
}

impl InputToken {
    /// Parse a raw token string from the input surface.
    ///
    /// Returns `None` for multi-character strings that are not one of the
    /// named tokens; those have no defined meaning.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "C" => Some(Self::Clear),
            "Backspace" => Some(Self::Backspace),
            "=" => Some(Self::Submit),
            _ => {
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Self::Char(c)),
                    _ => None,
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum State {
    /// An in-progress (possibly empty) expression.
    Text(String),
    /// The error sentinel; cleared by the next input token.
    Error,
}

/// The in-progress expression owned by the calculator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpressionBuffer {
    state: State,
}

impl Default for ExpressionBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionBuffer {
    pub fn new() -> Self {
        Self {
            state: State::Text(String::new()),
        }
    }

    /// Reset to an empty expression.
    pub fn clear(&mut self) {
        self.state = State::Text(String::new());
    }

    /// Remove the last character; in the error state, reset to empty instead
    /// of truncating the sentinel.
    pub fn backspace(&mut self) {
        match &mut self.state {
            State::Error => self.clear(),
            State::Text(text) => {
                text.pop();
            }
        }
    }

    /// Append a character. Entering anything while in the error state first
    /// discards the error and starts a fresh expression.
    pub fn push(&mut self, c: char) {
        if self.is_error() {
            self.clear();
        }
        if let State::Text(text) = &mut self.state {
            text.push(c);
        }
    }

    /// Replace the buffer content with an evaluation result.
    pub fn set_text(&mut self, text: String) {
        self.state = State::Text(text);
    }

    /// Enter the error sentinel state.
    pub fn set_error(&mut self) {
        self.state = State::Error;
    }

    pub fn is_error(&self) -> bool {
        self.state == State::Error
    }

    pub fn is_empty(&self) -> bool {
        matches!(&self.state, State::Text(text) if text.is_empty())
    }

    /// The current expression text, if not in the error state.
    pub fn expression(&self) -> Option<&str> {
        match &self.state {
            State::Text(text) => Some(text),
            State::Error => None,
        }
    }

    /// The value the UI should render: `"0"` for an empty buffer, `"Error"`
    /// for the sentinel, the expression text otherwise.
    pub fn display(&self) -> String {
        match &self.state {
            State::Error => "Error".to_string(),
            State::Text(text) if text.is_empty() => "0".to_string(),
            State::Text(text) => text.clone(),
        }
    }
}
