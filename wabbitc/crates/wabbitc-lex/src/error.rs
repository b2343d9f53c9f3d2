//! Lexical error type.

use thiserror::Error;

/// Errors produced while scanning. Every variant carries the line the
/// offending byte was found on; the first error aborts the scan.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("line {line}: unexpected character '{ch}'")]
    UnexpectedChar { ch: char, line: u32 },

    #[error("line {line}: unterminated character literal")]
    UnterminatedChar { line: u32 },

    #[error("line {line}: unterminated block comment")]
    UnterminatedComment { line: u32 },

    #[error("line {line}: expected '&&' (single '&' is not an operator)")]
    LoneAmpersand { line: u32 },

    #[error("line {line}: expected '||' (single '|' is not an operator)")]
    LonePipe { line: u32 },
}
