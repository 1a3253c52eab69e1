//! Scan and parse diagnostics.

use std::fmt;

use thiserror::Error;

use crate::token::{Token, TokenKind};

/// Line number (starting at one).
pub type Position = u32;

/// A scan or parse fault together with where it happened.
#[derive(Debug, PartialEq, Clone, Error)]
#[error("[line {pos}] Error{location}: {error}")]
pub struct Diagnostic {
    pub pos: Position,
    pub location: Location,
    pub error: ParseError,
}

impl Diagnostic {
    /// Diagnostic raised by the scanner, which has no token to point at.
    pub fn at_line(pos: Position, error: ParseError) -> Diagnostic {
        Diagnostic {
            pos,
            location: Location::Line,
            error,
        }
    }

    /// Diagnostic raised by the parser while looking at `token`.
    pub fn at_token(token: &Token, error: ParseError) -> Diagnostic {
        let location = match token.kind {
            TokenKind::Eof => Location::End,
            _ => Location::Lexeme(token.lexeme.clone()),
        };
        Diagnostic {
            pos: token.line,
            location,
            error,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Location {
    Line,
    End,
    Lexeme(String),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Line => Ok(()),
            Location::End => write!(f, " at end"),
            Location::Lexeme(lexeme) => write!(f, " at '{}'", lexeme),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Error)]
pub enum ParseError {
    #[error("unexpected character '{0}'")]
    BadChar(char),
    #[error("unterminated string")]
    UnterminatedString,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("expected {0}")]
    Expected(&'static str),
    #[error("expected expression")]
    ExpectedPrimary,
    #[error("invalid assignment target")]
    ExpectedLvalue,
    #[error("missing left-hand operand")]
    MissingLeftOperand,
    #[error("'break' must be inside a loop")]
    BreakOutsideLoop,
    #[error("'return' must be inside a function")]
    ReturnOutsideFunction,
    #[error("can't have more than {0} arguments")]
    TooManyArguments(usize),
    #[error("can't have more than {0} parameters")]
    TooManyParameters(usize),
}

/// All diagnostics of one run, in source order.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Diagnostics(pub Vec<Diagnostic>);

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}
