//! The scanner.
//!
//! A single forward pass over the source. Each iteration records the token
//! start, consumes one character, and dispatches on it; multi-character
//! tokens (two-char operators, comments, literals, identifiers) consume the
//! rest of their lexeme before the next iteration.

use crate::cursor::Cursor;
use crate::error::LexError;
use crate::token::{Token, TokenKind};

/// Scans `source` into a token sequence terminated by [`TokenKind::Eof`].
///
/// # Example
///
/// ```
/// use wabbitc_lex::{scan_tokens, TokenKind};
///
/// let tokens = scan_tokens("var x int = 1;").unwrap();
/// assert_eq!(tokens[0].kind, TokenKind::Var);
/// assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
/// ```
pub fn scan_tokens(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).scan_tokens()
}

/// Valid first character of an identifier.
fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

/// Valid continuation character of an identifier.
fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Lexer for Wabbit source code.
pub struct Lexer<'a> {
    cursor: Cursor<'a>,

    /// Byte offset where the current token starts.
    token_start: usize,

    /// Line the current token starts on.
    token_line: u32,

    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            token_start: 0,
            token_line: 1,
            tokens: Vec::new(),
        }
    }

    /// Runs the scan to completion, returning all tokens or the first error.
    pub fn scan_tokens(mut self) -> Result<Vec<Token>, LexError> {
        while !self.cursor.is_at_end() {
            self.token_start = self.cursor.position();
            self.token_line = self.cursor.line();
            self.scan_token()?;
        }

        let line = self.cursor.line();
        self.tokens.push(Token::new(TokenKind::Eof, "", line));
        Ok(self.tokens)
    }

    fn scan_token(&mut self) -> Result<(), LexError> {
        let c = self.cursor.bump();
        match c {
            '(' => self.add_token(TokenKind::LParen),
            ')' => self.add_token(TokenKind::RParen),
            '{' => self.add_token(TokenKind::LBrace),
            '}' => self.add_token(TokenKind::RBrace),
            ',' => self.add_token(TokenKind::Comma),
            ';' => self.add_token(TokenKind::Semicolon),
            '+' => self.add_token(TokenKind::Plus),
            '-' => self.add_token(TokenKind::Minus),
            '*' => self.add_token(TokenKind::Star),

            '!' => {
                let kind = if self.cursor.match_char('=') {
                    TokenKind::BangEq
                } else {
                    TokenKind::Bang
                };
                self.add_token(kind);
            },
            '=' => {
                let kind = if self.cursor.match_char('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                };
                self.add_token(kind);
            },
            '<' => {
                let kind = if self.cursor.match_char('=') {
                    TokenKind::LessEq
                } else {
                    TokenKind::Less
                };
                self.add_token(kind);
            },
            '>' => {
                let kind = if self.cursor.match_char('=') {
                    TokenKind::GreaterEq
                } else {
                    TokenKind::Greater
                };
                self.add_token(kind);
            },

            '&' => {
                if !self.cursor.match_char('&') {
                    return Err(LexError::LoneAmpersand {
                        line: self.token_line,
                    });
                }
                self.add_token(TokenKind::AndAnd);
            },
            '|' => {
                if !self.cursor.match_char('|') {
                    return Err(LexError::LonePipe {
                        line: self.token_line,
                    });
                }
                self.add_token(TokenKind::OrOr);
            },

            '/' => self.lex_slash()?,

            // Whitespace; the cursor counts newlines.
            ' ' | '\r' | '\t' | '\n' => {},

            '\'' => self.lex_char()?,

            c if c.is_ascii_digit() => self.lex_number(),
            c if is_ident_start(c) => self.lex_identifier(),

            c => {
                return Err(LexError::UnexpectedChar {
                    ch: c,
                    line: self.token_line,
                })
            },
        }
        Ok(())
    }

    /// Division operator, line comment, or block comment.
    fn lex_slash(&mut self) -> Result<(), LexError> {
        if self.cursor.match_char('/') {
            while self.cursor.current_char() != '\n' && !self.cursor.is_at_end() {
                self.cursor.advance();
            }
            return Ok(());
        }

        if self.cursor.match_char('*') {
            // Block comments do not nest.
            loop {
                if self.cursor.is_at_end() {
                    return Err(LexError::UnterminatedComment {
                        line: self.token_line,
                    });
                }
                if self.cursor.current_char() == '*' && self.cursor.char_at(1) == '/' {
                    self.cursor.advance();
                    self.cursor.advance();
                    return Ok(());
                }
                self.cursor.advance();
            }
        }

        self.add_token(TokenKind::Slash);
        Ok(())
    }

    /// Character literal. The stored lexeme is the character itself with the
    /// quotes stripped; a backslash followed by any alphabetic character is
    /// normalized to a newline.
    fn lex_char(&mut self) -> Result<(), LexError> {
        if self.cursor.is_at_end() {
            return Err(LexError::UnterminatedChar {
                line: self.token_line,
            });
        }

        let mut value = self.cursor.bump();
        if value == '\\' && self.cursor.current_char().is_alphabetic() {
            self.cursor.advance();
            value = '\n';
        }

        if !self.cursor.match_char('\'') {
            return Err(LexError::UnterminatedChar {
                line: self.token_line,
            });
        }

        self.tokens
            .push(Token::new(TokenKind::Char, value.to_string(), self.token_line));
        Ok(())
    }

    /// Integer or float literal. A `.` turns the token into a float only
    /// when a digit follows it.
    fn lex_number(&mut self) {
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }

        let mut kind = TokenKind::Int;
        if self.cursor.current_char() == '.' && self.cursor.char_at(1).is_ascii_digit() {
            kind = TokenKind::Float;
            self.cursor.advance();
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
        }

        self.add_token(kind);
    }

    /// Identifier or reserved word.
    fn lex_identifier(&mut self) {
        while is_ident_continue(self.cursor.current_char()) {
            self.cursor.advance();
        }

        let lexeme = self.cursor.slice_from(self.token_start);
        let kind = TokenKind::keyword(lexeme).unwrap_or(TokenKind::Ident);
        self.add_token(kind);
    }

    fn add_token(&mut self, kind: TokenKind) {
        let lexeme = self.cursor.slice_from(self.token_start);
        self.tokens.push(Token::new(kind, lexeme, self.token_line));
    }
}
