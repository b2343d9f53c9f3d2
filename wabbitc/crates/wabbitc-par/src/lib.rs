//! wabbitc-par - Recursive-descent parser for the Wabbit language.
//!
//! Builds an AST from the token stream produced by `wabbitc-lex`. Operator
//! precedence is encoded structurally: each binary precedence level is one
//! method that loops over its operators and calls the next-tighter level,
//! so all binary operators are left-associative by construction. There is
//! no error recovery; the first mismatch aborts parsing.

pub mod ast;
pub mod error;

mod edge_cases;
mod expr;
mod stmt;

pub use ast::*;
pub use error::ParseError;

use wabbitc_lex::{Token, TokenKind};

/// Parses a whole program into its top-level block.
///
/// # Example
///
/// ```
/// use wabbitc_lex::scan_tokens;
/// use wabbitc_par::parse;
///
/// let tokens = scan_tokens("var x int = 1;").unwrap();
/// let program = parse(tokens).unwrap();
/// assert_eq!(program.statements.len(), 1);
/// ```
pub fn parse(tokens: Vec<Token>) -> Result<Block, ParseError> {
    Parser::new(tokens).parse()
}

/// Recursive-descent parser over a token stream.
pub struct Parser {
    /// Token stream from the lexer, ending in `Eof`.
    tokens: Vec<Token>,

    /// Current position in the token stream.
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// program := statement*
    pub fn parse(mut self) -> Result<Block, ParseError> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.push(self.parse_stmt()?);
        }
        Ok(Block { statements })
    }

    // =========================================================================
    // Token stream helpers
    // =========================================================================

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position - 1]
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    pub(crate) fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous().clone()
    }

    /// Consumes the current token if it has the given kind.
    pub(crate) fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Consumes the current token if its kind is in `kinds`, returning it.
    pub(crate) fn match_any(&mut self, kinds: &[TokenKind]) -> Option<Token> {
        if kinds.iter().any(|&k| self.check(k)) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consumes a token of the given kind or fails with `message`.
    pub(crate) fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(message))
        }
    }

    /// Consumes a type-name keyword or fails with `message`.
    pub(crate) fn expect_type_name(&mut self, message: &str) -> Result<Ty, ParseError> {
        if let Some(ty) = Ty::from_token(self.current().kind) {
            self.advance();
            Ok(ty)
        } else {
            Err(self.error(message))
        }
    }

    /// Consumes a type-name keyword if one is present.
    pub(crate) fn match_type_name(&mut self) -> Option<Ty> {
        let ty = Ty::from_token(self.current().kind)?;
        self.advance();
        Some(ty)
    }

    pub(crate) fn error(&self, message: &str) -> ParseError {
        ParseError {
            message: message.to_string(),
            found: self.current().clone(),
        }
    }
}
