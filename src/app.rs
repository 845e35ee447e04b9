//! Application state and token dispatch.
//!
//! [`Calculator`] owns what the original UI kept as ambient globals: the
//! expression buffer, the history store, and the haptic channel. All logic
//! runs to completion per token on the caller's thread; nothing here blocks
//! or suspends.

use crate::calculator::{ExpressionBuffer, InputToken, evaluate, format_number};
use crate::haptics::{Haptics, NoHaptics};
use crate::history::{HistoryEntry, HistoryError, HistoryStore};
use tracing::{debug, warn};

/// The calculator core behind the input surface.
pub struct Calculator<H: Haptics = NoHaptics> {
    buffer: ExpressionBuffer,
    history: HistoryStore,
    haptics: H,
    haptic_strength: u32,
}

impl Calculator<NoHaptics> {
    pub fn new(history: HistoryStore) -> Self {
        Self::with_haptics(history, NoHaptics, 0)
    }
}

impl<H: Haptics> Calculator<H> {
    pub fn with_haptics(history: HistoryStore, haptics: H, haptic_strength: u32) -> Self {
        Self {
            buffer: ExpressionBuffer::new(),
            history,
            haptics,
            haptic_strength,
        }
    }

    /// Handle one logical input token and return the new display value.
    ///
    /// Never fails: unknown tokens are ignored, invalid expressions surface
    /// as the error sentinel at submit time, and a history persistence
    /// failure downgrades to a warning rather than masking a valid result.
    pub fn handle_input(&mut self, raw: &str) -> String {
        let Some(token) = InputToken::parse(raw) else {
            warn!(token = raw, "ignoring unknown input token");
            return self.display();
        };
        self.pulse();
        match token {
            InputToken::Clear => self.buffer.clear(),
            InputToken::Backspace => self.buffer.backspace(),
            InputToken::Char(c) => self.buffer.push(c),
            InputToken::Submit => self.submit(),
        }
        self.display()
    }

    /// The value the UI should render.
    pub fn display(&self) -> String {
        self.buffer.display()
    }

    /// The persisted history, newest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.load_all()
    }

    /// Drop the persisted history. Counts as a logical input for haptics.
    pub fn clear_history(&mut self) -> Result<(), HistoryError> {
        self.pulse();
        self.history.clear()
    }

    /// One haptic pulse, suppressed at strength 0. The surrounding UI calls
    /// this for interactions outside the token surface (panel toggles).
    pub fn pulse(&self) {
        if self.haptic_strength > 0 {
            self.haptics.pulse(self.haptic_strength);
        }
    }

    pub fn set_haptic_strength(&mut self, strength: u32) {
        self.haptic_strength = strength;
    }

    fn submit(&mut self) {
        let Some(expression) = self.buffer.expression().map(str::to_string) else {
            // Submitting the error sentinel changes nothing.
            return;
        };
        if expression.is_empty() {
            return;
        }
        match evaluate(&expression) {
            Ok(result) => {
                debug!(expression, result, "evaluated expression");
                let entry = HistoryEntry {
                    expression,
                    result,
                };
                if let Err(err) = self.history.append(entry) {
                    warn!(%err, "failed to persist history entry");
                }
                self.buffer.set_text(format_number(result));
            }
            Err(err) => {
                debug!(expression, %err, "evaluation failed");
                self.buffer.set_error();
            }
        }
    }
}
