//! wabbitc-sem - Static type checking for Wabbit.
//!
//! Walks the AST in evaluation order, assigns a type to every expression,
//! validates declarations and uses, and writes inferred types back into
//! declaration nodes. On success the AST is fully annotated: every
//! expression reachable from a statement reports `Some(ty)`.
//!
//! The checker enforces:
//! - arithmetic on identical int/float operands only
//! - comparisons on identical int/float/char operands (equality also on
//!   bool), always producing bool
//! - `-` on numeric operands, `!` on bool
//! - assignment to existing, non-const names of the same type
//! - declaration typing (annotation and initializer must agree; a missing
//!   annotation is inferred from the initializer)
//! - function signatures, arity and argument types at calls, return type
//!   agreement, and a return on every path through a function body
//! - bool conditions on `if` and `while`
//! - `break`/`continue` only inside loops; `func` only at top level

pub mod error;
pub mod scope;

mod edge_cases;

pub use error::TypeError;
pub use scope::{FuncSig, Resolved, Scopes};

use wabbitc_lex::TokenKind;
use wabbitc_par::ast::*;

/// Type-checks a whole program, annotating it in place.
///
/// # Example
///
/// ```
/// use wabbitc_lex::scan_tokens;
/// use wabbitc_par::parse;
/// use wabbitc_sem::check;
///
/// let mut program = parse(scan_tokens("var x int = 1; print x;").unwrap()).unwrap();
/// check(&mut program).unwrap();
/// ```
pub fn check(program: &mut Block) -> Result<(), TypeError> {
    Checker::new().check_program(program)
}

/// The type checker. One instance checks one program.
pub struct Checker {
    scopes: Scopes,

    /// Declared return type of the function currently being checked.
    expected_return: Option<Ty>,

    /// Number of enclosing `while` bodies.
    loop_depth: u32,
}

impl Checker {
    pub fn new() -> Self {
        Self {
            scopes: Scopes::new(),
            expected_return: None,
            loop_depth: 0,
        }
    }

    /// Checks the top-level statement list. Top level is the global scope;
    /// no block maps are pushed for it.
    pub fn check_program(&mut self, program: &mut Block) -> Result<(), TypeError> {
        for stmt in &mut program.statements {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    fn check_stmt(&mut self, stmt: &mut Stmt) -> Result<(), TypeError> {
        match stmt {
            Stmt::Var(decl) => self.check_var_decl(decl),
            Stmt::Const(decl) => self.check_const_decl(decl),
            Stmt::Assign(assign) => self.check_assign(assign),
            Stmt::Print(print) => {
                // print accepts any type
                self.check_expr(&mut print.expr)?;
                Ok(())
            },
            Stmt::If(if_stmt) => self.check_if(if_stmt),
            Stmt::While(while_stmt) => self.check_while(while_stmt),
            Stmt::Return(ret) => self.check_return(ret),
            Stmt::Break(brk) => {
                if self.loop_depth == 0 {
                    return Err(TypeError::OutsideLoop {
                        keyword: "break".to_string(),
                        line: brk.line,
                    });
                }
                Ok(())
            },
            Stmt::Continue(cont) => {
                if self.loop_depth == 0 {
                    return Err(TypeError::OutsideLoop {
                        keyword: "continue".to_string(),
                        line: cont.line,
                    });
                }
                Ok(())
            },
            Stmt::Func(func) => self.check_func_decl(func),
            Stmt::Block(block) => self.check_block(block),
            Stmt::Expr(stmt) => {
                self.check_expr(&mut stmt.expr)?;
                Ok(())
            },
        }
    }

    fn check_block(&mut self, block: &mut Block) -> Result<(), TypeError> {
        self.scopes.enter_block();
        let result = block
            .statements
            .iter_mut()
            .try_for_each(|stmt| self.check_stmt(stmt));
        self.scopes.exit_block();
        result
    }

    fn check_var_decl(&mut self, decl: &mut VarDecl) -> Result<(), TypeError> {
        let init_ty = match decl.init.as_mut() {
            Some(init) => Some(self.check_expr(init)?),
            None => None,
        };

        let ty = match (decl.ty, init_ty) {
            (Some(annotated), Some(inferred)) => {
                if annotated != inferred {
                    return Err(TypeError::Mismatch {
                        expected: annotated,
                        found: inferred,
                        line: decl.name.line,
                    });
                }
                annotated
            },
            (Some(annotated), None) => annotated,
            (None, Some(inferred)) => inferred,
            // The parser guarantees a type or an initializer.
            (None, None) => {
                return Err(TypeError::Undeclared {
                    name: decl.name.lexeme.clone(),
                    line: decl.name.line,
                })
            },
        };

        decl.ty = Some(ty);
        self.scopes.declare_var(&decl.name.lexeme, ty, decl.name.line)
    }

    fn check_const_decl(&mut self, decl: &mut ConstDecl) -> Result<(), TypeError> {
        let init_ty = self.check_expr(&mut decl.init)?;

        let ty = match decl.ty {
            Some(annotated) => {
                if annotated != init_ty {
                    return Err(TypeError::Mismatch {
                        expected: annotated,
                        found: init_ty,
                        line: decl.name.line,
                    });
                }
                annotated
            },
            None => init_ty,
        };

        decl.ty = Some(ty);
        self.scopes
            .declare_const(&decl.name.lexeme, ty, decl.name.line)
    }

    fn check_assign(&mut self, assign: &mut AssignStmt) -> Result<(), TypeError> {
        let resolved = self.scopes.lookup(&assign.name.lexeme).ok_or_else(|| {
            TypeError::Undeclared {
                name: assign.name.lexeme.clone(),
                line: assign.name.line,
            }
        })?;

        if resolved.is_const {
            return Err(TypeError::AssignToConst {
                name: assign.name.lexeme.clone(),
                line: assign.name.line,
            });
        }

        let value_ty = self.check_expr(&mut assign.value)?;
        if value_ty != resolved.ty {
            return Err(TypeError::Mismatch {
                expected: resolved.ty,
                found: value_ty,
                line: assign.name.line,
            });
        }
        Ok(())
    }

    fn check_if(&mut self, if_stmt: &mut IfStmt) -> Result<(), TypeError> {
        let cond_ty = self.check_expr(&mut if_stmt.condition)?;
        if cond_ty != Ty::Bool {
            return Err(TypeError::NonBoolCondition {
                found: cond_ty,
                line: if_stmt.condition.line(),
            });
        }

        self.check_block(&mut if_stmt.then_branch)?;
        if let Some(else_branch) = if_stmt.else_branch.as_deref_mut() {
            self.check_stmt(else_branch)?;
        }
        Ok(())
    }

    fn check_while(&mut self, while_stmt: &mut WhileStmt) -> Result<(), TypeError> {
        let cond_ty = self.check_expr(&mut while_stmt.condition)?;
        if cond_ty != Ty::Bool {
            return Err(TypeError::NonBoolCondition {
                found: cond_ty,
                line: while_stmt.condition.line(),
            });
        }

        self.loop_depth += 1;
        let result = self.check_block(&mut while_stmt.body);
        self.loop_depth -= 1;
        result
    }

    fn check_return(&mut self, ret: &mut ReturnStmt) -> Result<(), TypeError> {
        let expected = self
            .expected_return
            .ok_or(TypeError::ReturnOutsideFunction { line: ret.line })?;

        let found = self.check_expr(&mut ret.expr)?;
        if found != expected {
            return Err(TypeError::ReturnMismatch {
                expected,
                found,
                line: ret.line,
            });
        }
        Ok(())
    }

    fn check_func_decl(&mut self, func: &mut FuncDecl) -> Result<(), TypeError> {
        if self.expected_return.is_some() || !self.scopes.at_global_scope() {
            return Err(TypeError::NestedFunction {
                line: func.name.line,
            });
        }

        // The function is registered before its body is checked so that it
        // can call itself.
        let sig = FuncSig {
            params: func.params.iter().map(|p| p.ty).collect(),
            ret: func.return_ty,
        };
        self.scopes
            .declare_function(&func.name.lexeme, sig, func.name.line)?;

        for param in &func.params {
            self.scopes
                .declare_param(&param.name.lexeme, param.ty, param.name.line)?;
        }

        self.expected_return = Some(func.return_ty);
        let result = self.check_block(&mut func.body);
        self.expected_return = None;
        self.scopes.clear_params();
        result?;

        if !block_returns(&func.body) {
            return Err(TypeError::MissingReturn {
                name: func.name.lexeme.clone(),
            });
        }
        Ok(())
    }

    fn check_expr(&mut self, expr: &mut Expr) -> Result<Ty, TypeError> {
        match expr {
            Expr::Literal(lit) => Ok(lit.value.ty()),

            Expr::Name(name) => {
                let resolved = self.scopes.lookup(&name.token.lexeme).ok_or_else(|| {
                    TypeError::Undeclared {
                        name: name.token.lexeme.clone(),
                        line: name.token.line,
                    }
                })?;
                name.ty = Some(resolved.ty);
                Ok(resolved.ty)
            },

            Expr::Grouping(inner) => self.check_expr(inner),

            Expr::Unary(unary) => {
                let operand_ty = self.check_expr(&mut unary.operand)?;
                match unary.op.kind {
                    TokenKind::Minus if operand_ty.is_numeric() => {},
                    TokenKind::Bang if operand_ty == Ty::Bool => {},
                    _ => {
                        return Err(TypeError::BadOperandType {
                            op: unary.op.lexeme.clone(),
                            ty: operand_ty,
                            line: unary.op.line,
                        })
                    },
                }
                let ty = if unary.op.kind == TokenKind::Bang {
                    Ty::Bool
                } else {
                    operand_ty
                };
                unary.ty = Some(ty);
                Ok(ty)
            },

            Expr::Binary(binary) => {
                let lhs_ty = self.check_expr(&mut binary.lhs)?;
                let rhs_ty = self.check_expr(&mut binary.rhs)?;
                if lhs_ty != rhs_ty {
                    return Err(TypeError::OperandMismatch {
                        op: binary.op.lexeme.clone(),
                        lhs: lhs_ty,
                        rhs: rhs_ty,
                        line: binary.op.line,
                    });
                }
                if !lhs_ty.is_numeric() {
                    return Err(TypeError::BadOperandType {
                        op: binary.op.lexeme.clone(),
                        ty: lhs_ty,
                        line: binary.op.line,
                    });
                }
                binary.ty = Some(lhs_ty);
                Ok(lhs_ty)
            },

            Expr::Compare(compare) => {
                let lhs_ty = self.check_expr(&mut compare.lhs)?;
                let rhs_ty = self.check_expr(&mut compare.rhs)?;
                if lhs_ty != rhs_ty {
                    return Err(TypeError::OperandMismatch {
                        op: compare.op.lexeme.clone(),
                        lhs: lhs_ty,
                        rhs: rhs_ty,
                        line: compare.op.line,
                    });
                }

                // Equality is defined for every type; the orderings exclude
                // bool.
                let is_equality =
                    matches!(compare.op.kind, TokenKind::EqEq | TokenKind::BangEq);
                if lhs_ty == Ty::Bool && !is_equality {
                    return Err(TypeError::BadOperandType {
                        op: compare.op.lexeme.clone(),
                        ty: lhs_ty,
                        line: compare.op.line,
                    });
                }

                compare.ty = Some(Ty::Bool);
                Ok(Ty::Bool)
            },

            Expr::Logical(logical) => Err(TypeError::UnsupportedLogical {
                op: logical.op.lexeme.clone(),
                line: logical.op.line,
            }),

            Expr::Call(call) => {
                let name = match call.callee.as_mut() {
                    Expr::Name(name) => name,
                    other => {
                        return Err(TypeError::CalleeNotAName { line: other.line() })
                    },
                };

                let sig = self
                    .scopes
                    .lookup_function(&name.token.lexeme)
                    .cloned()
                    .ok_or_else(|| TypeError::UndefinedFunction {
                        name: name.token.lexeme.clone(),
                        line: name.token.line,
                    })?;

                if call.args.len() != sig.params.len() {
                    return Err(TypeError::ArityMismatch {
                        name: name.token.lexeme.clone(),
                        expected: sig.params.len(),
                        found: call.args.len(),
                        line: name.token.line,
                    });
                }

                for (index, (arg, &param_ty)) in
                    call.args.iter_mut().zip(sig.params.iter()).enumerate()
                {
                    let arg_ty = self.check_expr(arg)?;
                    if arg_ty != param_ty {
                        return Err(TypeError::ArgumentMismatch {
                            name: name.token.lexeme.clone(),
                            index,
                            expected: param_ty,
                            found: arg_ty,
                            line: arg.line(),
                        });
                    }
                }

                name.ty = Some(sig.ret);
                call.ty = Some(sig.ret);
                Ok(sig.ret)
            },
        }
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

/// True if the block returns on every path: it contains a plain `return`,
/// or an `if` whose both arms return.
fn block_returns(block: &Block) -> bool {
    block.statements.iter().any(stmt_returns)
}

fn stmt_returns(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Return(_) => true,
        Stmt::Block(block) => block_returns(block),
        Stmt::If(if_stmt) => match if_stmt.else_branch.as_deref() {
            Some(else_branch) => {
                block_returns(&if_stmt.then_branch) && stmt_returns(else_branch)
            },
            None => false,
        },
        _ => false,
    }
}
