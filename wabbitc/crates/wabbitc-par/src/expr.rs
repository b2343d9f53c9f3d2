//! Expression parsing.
//!
//! One method per precedence level, lowest first:
//!
//! | Level      | Operators              |
//! |------------|------------------------|
//! | or_term    | `\|\|`                 |
//! | and_term   | `&&`                   |
//! | rel_term   | `< <= > >= == !=`      |
//! | sum_term   | `+ -`                  |
//! | mul_term   | `* /`                  |
//! | factor     | prefix `! -`           |
//! | call       | `f(args)`              |
//! | primary    | literals, names, `( )` |
//!
//! Every level loops on its own operators, so `a - b - c` builds
//! `(a - b) - c` and `a + b * c` builds `a + (b * c)`.

use wabbitc_lex::TokenKind;

use crate::ast::*;
use crate::{ParseError, Parser};

/// The six relational/equality operators of `rel_term`.
const REL_OPS: [TokenKind; 6] = [
    TokenKind::Less,
    TokenKind::LessEq,
    TokenKind::Greater,
    TokenKind::GreaterEq,
    TokenKind::EqEq,
    TokenKind::BangEq,
];

impl Parser {
    /// expression := or_term (assignment is handled in statement position)
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_or_term()
    }

    /// or_term := and_term ("||" and_term)*
    fn parse_or_term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_and_term()?;
        while self.check(TokenKind::OrOr) {
            let op = self.advance();
            let rhs = self.parse_and_term()?;
            lhs = Expr::Logical(LogicalExpr {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
            });
        }
        Ok(lhs)
    }

    /// and_term := rel_term ("&&" rel_term)*
    fn parse_and_term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_rel_term()?;
        while self.check(TokenKind::AndAnd) {
            let op = self.advance();
            let rhs = self.parse_rel_term()?;
            lhs = Expr::Logical(LogicalExpr {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
            });
        }
        Ok(lhs)
    }

    /// rel_term := sum_term (REL_OP sum_term)*
    fn parse_rel_term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_sum_term()?;
        while let Some(op) = self.match_any(&REL_OPS) {
            let rhs = self.parse_sum_term()?;
            lhs = Expr::Compare(CompareExpr {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
                ty: None,
            });
        }
        Ok(lhs)
    }

    /// sum_term := mul_term (("+" | "-") mul_term)*
    fn parse_sum_term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_mul_term()?;
        while let Some(op) = self.match_any(&[TokenKind::Plus, TokenKind::Minus]) {
            let rhs = self.parse_mul_term()?;
            lhs = Expr::Binary(BinaryExpr {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
                ty: None,
            });
        }
        Ok(lhs)
    }

    /// mul_term := factor (("*" | "/") factor)*
    fn parse_mul_term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_factor()?;
        while let Some(op) = self.match_any(&[TokenKind::Star, TokenKind::Slash]) {
            let rhs = self.parse_factor()?;
            lhs = Expr::Binary(BinaryExpr {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
                ty: None,
            });
        }
        Ok(lhs)
    }

    /// factor := ("!" | "-") factor | call
    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        if let Some(op) = self.match_any(&[TokenKind::Bang, TokenKind::Minus]) {
            let operand = self.parse_factor()?;
            return Ok(Expr::Unary(UnaryExpr {
                op,
                operand: Box::new(operand),
                ty: None,
            }));
        }
        self.parse_call()
    }

    /// call := primary ("(" arg_list? ")")?
    fn parse_call(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_primary()?;

        if self.match_kind(TokenKind::LParen) {
            let mut args = Vec::new();
            if !self.check(TokenKind::RParen) {
                loop {
                    args.push(self.parse_expression()?);
                    if !self.match_kind(TokenKind::Comma) {
                        break;
                    }
                    // Trailing comma before the closing paren is tolerated.
                    if self.check(TokenKind::RParen) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RParen, "expected ')' after call arguments")?;
            return Ok(Expr::Call(CallExpr {
                callee: Box::new(expr),
                args,
                ty: None,
            }));
        }

        Ok(expr)
    }

    /// primary := INT | FLOAT | CHAR | BOOL | IDENT | TYPE_NAME
    ///          | "(" expression ")"
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.current().kind {
            TokenKind::True | TokenKind::False => {
                let token = self.advance();
                Ok(Expr::Literal(Literal {
                    value: LitValue::Bool(token.kind == TokenKind::True),
                    line: token.line,
                }))
            },
            TokenKind::Int => {
                let token = self.advance();
                let value: i32 = token
                    .lexeme
                    .parse()
                    .map_err(|_| ParseError {
                        message: "integer literal out of range".to_string(),
                        found: token.clone(),
                    })?;
                Ok(Expr::Literal(Literal {
                    value: LitValue::Int(value),
                    line: token.line,
                }))
            },
            TokenKind::Float => {
                let token = self.advance();
                let value: f32 = token
                    .lexeme
                    .parse()
                    .map_err(|_| ParseError {
                        message: "malformed float literal".to_string(),
                        found: token.clone(),
                    })?;
                Ok(Expr::Literal(Literal {
                    value: LitValue::Float(value),
                    line: token.line,
                }))
            },
            TokenKind::Char => {
                let token = self.advance();
                let value = token.lexeme.chars().next().unwrap_or_default() as u8;
                Ok(Expr::Literal(Literal {
                    value: LitValue::Char(value),
                    line: token.line,
                }))
            },
            TokenKind::Ident => {
                let token = self.advance();
                Ok(Expr::Name(NameExpr { token, ty: None }))
            },
            // A type name in expression position parses as a name; the
            // checker rejects it as undeclared.
            kind if kind.is_type_name() => {
                let token = self.advance();
                Ok(Expr::Name(NameExpr { token, ty: None }))
            },
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen, "expected ')' after grouped expression")?;
                Ok(Expr::Grouping(Box::new(inner)))
            },
            _ => Err(self.error("expected expression")),
        }
    }
}
