//! wabbitc-lex - Lexical analysis for the Wabbit language.
//!
//! Transforms a source string into a stream of [`Token`]s terminated by an
//! end-of-input token. The lexer is a single forward pass: each call to the
//! scanner resets the token start, consumes one character, and dispatches on
//! it. Lexemes are retained verbatim so later phases can reinterpret them;
//! the one exception is character literals, whose quotes are stripped and
//! whose escapes are normalized here.

pub mod cursor;
pub mod error;
pub mod lexer;
pub mod token;

mod edge_cases;

pub use error::LexError;
pub use lexer::{scan_tokens, Lexer};
pub use token::{Token, TokenKind};
