//! Statement parsing.

use wabbitc_lex::TokenKind;

use crate::ast::*;
use crate::{ParseError, Parser};

impl Parser {
    /// statement := if | while | print | return | var_decl | const_decl
    ///            | break | continue | func_decl | block | expr_stmt
    pub(crate) fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.current().kind {
            TokenKind::If => {
                self.advance();
                self.parse_if_stmt()
            },
            TokenKind::While => {
                self.advance();
                self.parse_while_stmt()
            },
            TokenKind::Print => {
                self.advance();
                self.parse_print_stmt()
            },
            TokenKind::Return => {
                let keyword = self.advance();
                self.parse_return_stmt(keyword.line)
            },
            TokenKind::Var => {
                self.advance();
                self.parse_var_decl()
            },
            TokenKind::Const => {
                self.advance();
                self.parse_const_decl()
            },
            TokenKind::Break => {
                let keyword = self.advance();
                self.expect(TokenKind::Semicolon, "expected ';' after 'break'")?;
                Ok(Stmt::Break(BreakStmt { line: keyword.line }))
            },
            TokenKind::Continue => {
                let keyword = self.advance();
                self.expect(TokenKind::Semicolon, "expected ';' after 'continue'")?;
                Ok(Stmt::Continue(ContinueStmt { line: keyword.line }))
            },
            TokenKind::Func => {
                self.advance();
                self.parse_func_decl()
            },
            TokenKind::LBrace => {
                self.advance();
                Ok(Stmt::Block(self.parse_block()?))
            },
            _ => self.parse_expr_stmt(),
        }
    }

    /// block := "{" statement* "}" - the opening brace is already consumed.
    pub(crate) fn parse_block(&mut self) -> Result<Block, ParseError> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            statements.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace, "expected '}' to close block")?;
        Ok(Block { statements })
    }

    /// expr_stmt := expression ";" | IDENT "=" expression ";"
    ///
    /// Assignment is recognized here: after parsing an expression, an `=`
    /// turns it into an assignment statement, provided the left-hand side
    /// is a bare name.
    fn parse_expr_stmt(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.parse_expression()?;

        if self.check(TokenKind::Eq) {
            let equals = self.advance();
            let name = match expr {
                Expr::Name(name) => name.token,
                _ => {
                    return Err(ParseError {
                        message: "invalid assignment target, expected a name".to_string(),
                        found: equals,
                    })
                },
            };
            let value = self.parse_expression()?;
            self.expect(TokenKind::Semicolon, "expected ';' after assignment")?;
            return Ok(Stmt::Assign(AssignStmt { name, value }));
        }

        self.expect(TokenKind::Semicolon, "expected ';' after expression")?;
        Ok(Stmt::Expr(ExprStmt { expr }))
    }

    /// if_stmt := "if" expression block ("else" statement)?
    ///
    /// The else arm accepts any statement so that `else if` chains parse
    /// naturally; a dangling else binds to the nearest if.
    fn parse_if_stmt(&mut self) -> Result<Stmt, ParseError> {
        let condition = self.parse_expression()?;
        self.expect(TokenKind::LBrace, "expected '{' after if condition")?;
        let then_branch = self.parse_block()?;

        let else_branch = if self.match_kind(TokenKind::Else) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };

        Ok(Stmt::If(IfStmt {
            condition,
            then_branch,
            else_branch,
        }))
    }

    /// while_stmt := "while" expression block
    fn parse_while_stmt(&mut self) -> Result<Stmt, ParseError> {
        let condition = self.parse_expression()?;
        self.expect(TokenKind::LBrace, "expected '{' after while condition")?;
        let body = self.parse_block()?;
        Ok(Stmt::While(WhileStmt { condition, body }))
    }

    fn parse_print_stmt(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "expected ';' after print value")?;
        Ok(Stmt::Print(PrintStmt { expr }))
    }

    fn parse_return_stmt(&mut self, line: u32) -> Result<Stmt, ParseError> {
        let expr = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "expected ';' after return value")?;
        Ok(Stmt::Return(ReturnStmt { expr, line }))
    }

    /// var_decl := "var" IDENT TYPE_NAME? ("=" expression)? ";"
    ///
    /// At least one of the type annotation and the initializer must be
    /// present.
    fn parse_var_decl(&mut self) -> Result<Stmt, ParseError> {
        let name = self.expect(TokenKind::Ident, "expected identifier after 'var'")?;
        let ty = self.match_type_name();

        if ty.is_none() && !self.check(TokenKind::Eq) {
            return Err(self.error("var declaration requires a type annotation or an initializer"));
        }

        let init = if self.match_kind(TokenKind::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.expect(TokenKind::Semicolon, "expected ';' after variable declaration")?;
        Ok(Stmt::Var(VarDecl { name, ty, init }))
    }

    /// const_decl := "const" IDENT TYPE_NAME? "=" expression ";"
    fn parse_const_decl(&mut self) -> Result<Stmt, ParseError> {
        let name = self.expect(TokenKind::Ident, "expected identifier after 'const'")?;
        let ty = self.match_type_name();

        self.expect(TokenKind::Eq, "const declaration requires an initializer")?;
        let init = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "expected ';' after const declaration")?;

        Ok(Stmt::Const(ConstDecl { name, ty, init }))
    }

    /// func_decl := "func" IDENT "(" params? ")" TYPE_NAME block
    /// params    := IDENT TYPE_NAME ("," IDENT TYPE_NAME)*
    fn parse_func_decl(&mut self) -> Result<Stmt, ParseError> {
        let name = self.expect(TokenKind::Ident, "expected function name after 'func'")?;
        self.expect(TokenKind::LParen, "expected '(' after function name")?;

        let mut params = Vec::new();
        if self.check(TokenKind::Ident) {
            loop {
                let param_name = self.expect(TokenKind::Ident, "expected parameter name")?;
                let param_ty = self.expect_type_name("expected parameter type")?;
                params.push(Param {
                    name: param_name,
                    ty: param_ty,
                });
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "expected ')' after parameters")?;

        let return_ty = self.expect_type_name("expected return type after parameter list")?;
        self.expect(TokenKind::LBrace, "expected '{' before function body")?;
        let body = self.parse_block()?;

        Ok(Stmt::Func(FuncDecl {
            name,
            params,
            return_ty,
            body,
        }))
    }
}
