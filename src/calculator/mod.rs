//! Expression input and safe arithmetic evaluation.
//!
//! The buffer is a pure state machine over logical input tokens; the
//! evaluator is a self-contained tokenizer and recursive-descent parser
//! restricted to numeric literals and the four binary operators. There is
//! deliberately no general-purpose expression engine behind it.

mod buffer;
mod evaluation;

pub use buffer::{ExpressionBuffer, InputToken};
pub use evaluation::{EvalError, evaluate, format_number, round_result};
