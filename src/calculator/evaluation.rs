//! Safe evaluation of finished expressions.
//!
//! A small tokenizer plus recursive-descent parser over digits, `.`, and the
//! four binary operators, with conventional precedence and left
//! associativity. Results are rounded to 8 decimal places to suppress binary
//! floating-point artifacts (`0.1 + 0.2` renders as `0.3`).

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    /// Matches expressions containing only the accepted character set.
    static ref ALLOWED_CHARS: Regex = Regex::new(r"^[0-9+\-*/.]+$").unwrap();
}

/// Why an expression failed to evaluate.
///
/// All variants present identically to the user (the opaque error sentinel);
/// they are distinguished for diagnostics and tests.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EvalError {
    /// A character outside `[0-9+-*/.]` was present.
    #[error("expression contains characters outside the accepted set")]
    InvalidCharacter,
    /// The expression is malformed (missing operand, bad literal, ...).
    #[error("malformed expression: {0}")]
    Syntax(&'static str),
    /// The raw result is not a finite number (division by zero, overflow).
    #[error("result is not a finite number")]
    NonFinite,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            '+' => {
                tokens.push(Token::Plus);
                chars.next();
            }
            '-' => {
                tokens.push(Token::Minus);
                chars.next();
            }
            '*' => {
                tokens.push(Token::Star);
                chars.next();
            }
            '/' => {
                tokens.push(Token::Slash);
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &expr[start..end];
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| EvalError::Syntax("invalid numeric literal"))?;
                tokens.push(Token::Number(value));
            }
            _ => return Err(EvalError::InvalidCharacter),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, EvalError> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.next();
                    value += self.term()?;
                }
                Token::Minus => {
                    self.next();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    /// term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Result<f64, EvalError> {
        let mut value = self.factor()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.next();
                    value *= self.factor()?;
                }
                Token::Slash => {
                    self.next();
                    value /= self.factor()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    /// factor := ('+' | '-')? number
    fn factor(&mut self) -> Result<f64, EvalError> {
        match self.next() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::Plus) => self.number(),
            Some(Token::Minus) => Ok(-self.number()?),
            Some(_) => Err(EvalError::Syntax("operator where operand expected")),
            None => Err(EvalError::Syntax("expression ends with an operator")),
        }
    }

    fn number(&mut self) -> Result<f64, EvalError> {
        match self.next() {
            Some(Token::Number(value)) => Ok(value),
            Some(_) => Err(EvalError::Syntax("operator where operand expected")),
            None => Err(EvalError::Syntax("expression ends with an operator")),
        }
    }
}

/// Evaluate a finished expression.
///
/// Rejects characters outside the accepted set before parsing; division by
/// zero and overflow surface as [`EvalError::NonFinite`]. The successful
/// result is already rounded via [`round_result`].
pub fn evaluate(expr: &str) -> Result<f64, EvalError> {
    if expr.is_empty() {
        return Err(EvalError::Syntax("empty expression"));
    }
    if !ALLOWED_CHARS.is_match(expr) {
        return Err(EvalError::InvalidCharacter);
    }

    let mut parser = Parser {
        tokens: tokenize(expr)?,
        pos: 0,
    };
    let raw = parser.expr()?;
    if parser.peek().is_some() {
        return Err(EvalError::Syntax("trailing input after expression"));
    }

    if !raw.is_finite() {
        return Err(EvalError::NonFinite);
    }

    Ok(round_result(raw))
}

/// Round to 8 decimal places to hide binary floating-point artifacts.
///
/// Values at or above 1e15 carry no fractional part an f64 can represent, and
/// scaling them would overflow; they pass through unchanged. Idempotent:
/// rounding an already-rounded value is a no-op.
pub fn round_result(value: f64) -> f64 {
    if value.abs() >= 1e15 {
        return value;
    }
    (value * 1e8).round() / 1e8
}

/// Format a result for the display and for re-entry into the buffer.
///
/// Integer-valued results render without a decimal point; fractional results
/// render with trailing zeros trimmed. The output always satisfies the input
/// character grammar, so a result can be operated on further.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let formatted = format!("{:.8}", value);
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_addition() {
        assert_eq!(evaluate("1+1"), Ok(2.0));
    }

    #[test]
    fn test_operator_precedence() {
        assert_eq!(evaluate("2+3*4"), Ok(14.0));
        assert_eq!(evaluate("20-10/2"), Ok(15.0));
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(evaluate("8/2/2"), Ok(2.0));
        assert_eq!(evaluate("10-3-4"), Ok(3.0));
    }

    #[test]
    fn test_unary_sign() {
        assert_eq!(evaluate("-5+3"), Ok(-2.0));
        assert_eq!(evaluate("5*-3"), Ok(-15.0));
        assert_eq!(evaluate("2--2"), Ok(4.0));
    }

    #[test]
    fn test_floating_point_artifact_suppressed() {
        // The classic 0.30000000000000004 case.
        assert_eq!(evaluate("0.1+0.2"), Ok(0.3));
        assert_eq!(format_number(evaluate("0.1+0.2").unwrap()), "0.3");
    }

    #[test]
    fn test_division_by_zero_is_non_finite() {
        assert_eq!(evaluate("5/0"), Err(EvalError::NonFinite));
        assert_eq!(evaluate("0/0"), Err(EvalError::NonFinite));
    }

    #[test]
    fn test_invalid_characters_rejected() {
        assert_eq!(evaluate("2+x"), Err(EvalError::InvalidCharacter));
        assert_eq!(evaluate("sin(0)"), Err(EvalError::InvalidCharacter));
        assert_eq!(evaluate("1 + 1"), Err(EvalError::InvalidCharacter));
    }

    #[test]
    fn test_malformed_expressions_rejected() {
        assert!(matches!(evaluate("5+"), Err(EvalError::Syntax(_))));
        assert!(matches!(evaluate("*5"), Err(EvalError::Syntax(_))));
        assert!(matches!(evaluate("1.2.3"), Err(EvalError::Syntax(_))));
        assert!(matches!(evaluate("."), Err(EvalError::Syntax(_))));
        assert!(matches!(evaluate(""), Err(EvalError::Syntax(_))));
        assert!(matches!(evaluate("2*/3"), Err(EvalError::Syntax(_))));
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let first = evaluate("3.14*2-0.28");
        let second = evaluate("3.14*2-0.28");
        assert_eq!(first, second);
    }

    #[test]
    fn test_rounding_is_idempotent() {
        for raw in [0.1 + 0.2, 1.0 / 3.0, -2.675, 12345.000000015, 1e16] {
            let once = round_result(raw);
            assert_eq!(round_result(once), once);
        }
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(-15.0), "-15");
        assert_eq!(format_number(0.3), "0.3");
        assert_eq!(format_number(-0.5), "-0.5");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(0.33333333), "0.33333333");
    }

    #[test]
    fn test_result_reenters_grammar() {
        // A displayed result must be a valid expression prefix again.
        let rendered = format_number(evaluate("1/3").unwrap());
        assert!(evaluate(&rendered).is_ok());
    }
}
