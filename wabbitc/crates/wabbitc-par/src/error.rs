//! Parse error type.

use thiserror::Error;
use wabbitc_lex::Token;

/// A fatal parse error: the diagnostic string plus the offending token.
#[derive(Debug, Error, PartialEq)]
#[error("line {}: {message}, found {found}", .found.line)]
pub struct ParseError {
    pub message: String,
    pub found: Token,
}
