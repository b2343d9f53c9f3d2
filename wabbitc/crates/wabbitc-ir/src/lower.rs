//! AST to IR lowering.
//!
//! The lowerer walks the checked AST and builds a [`Module`]. It keeps one
//! symbol map from source names to IR bindings:
//!
//! - local variables and parameters bind to an `alloca` pointer; reads go
//!   through `load`, writes through `store`
//! - local constants bind to their lowered operand directly, with no
//!   memory cell
//! - globals bind to a global handle; reads go through `load`
//! - functions bind to their function id
//!
//! Top-level statements other than declarations are collected into a
//! synthesized `main` function returning 0. Entering a function snapshots
//! the symbol map and restores it afterwards, as does every nested block.

use rustc_hash::FxHashMap;
use wabbitc_lex::TokenKind;
use wabbitc_par::ast::*;

use crate::builder::FuncBuilder;
use crate::error::LowerError;
// `ir::Block` would collide with the AST's `Block`, so the IR types are
// imported by name.
use crate::ir::{
    BlockId, Callee, Constant, ExternId, FloatOp, FloatPredicate, FuncId, Global, GlobalId,
    Instr, IntOp, IntPredicate, IrType, Module, Operand, Terminator,
};

/// Lowers a checked program to an IR module.
///
/// Preconditions the type checker establishes (annotated expressions,
/// resolved names, agreeing types) are internal errors here if violated.
pub fn lower(program: &Block) -> Result<Module, LowerError> {
    Lowerer::new().lower_program(program)
}

/// Branch targets of the innermost enclosing loop.
struct LoopBlocks {
    entry: BlockId,
    end: BlockId,
}

/// What a source name stands for during lowering.
#[derive(Clone)]
enum Binding {
    /// Stack slot; reads load, writes store.
    Slot { ptr: Operand, ty: Ty },
    /// The evaluated operand itself (local constants).
    Direct { value: Operand, ty: Ty },
    /// Module global; reads load through the handle.
    Global { id: GlobalId, ty: Ty },
    /// Function definition.
    Func { id: FuncId, ret: Ty },
}

struct Lowerer {
    module: Module,
    bindings: FxHashMap<String, Binding>,

    /// Handle of the external `print_char` declaration.
    print_char: ExternId,

    /// Monotonic suffix for fresh block labels.
    label_counter: u32,

    loop_stack: Vec<LoopBlocks>,
}

impl Lowerer {
    fn new() -> Self {
        let mut module = Module::new();
        // The runtime's character printer is declared once per module,
        // before any user code is lowered.
        let print_char = module.declare_extern("print_char", vec![IrType::I8], IrType::Void);

        Self {
            module,
            bindings: FxHashMap::default(),
            print_char,
            label_counter: 0,
            loop_stack: Vec::new(),
        }
    }

    fn lower_program(mut self, program: &Block) -> Result<Module, LowerError> {
        let mut main = FuncBuilder::new("main", Vec::new(), IrType::I32);

        for stmt in &program.statements {
            match stmt {
                Stmt::Func(decl) => self.lower_function(decl)?,
                Stmt::Var(decl) => self.lower_global_var(decl)?,
                Stmt::Const(decl) => self.lower_global_const(decl)?,
                other => {
                    if !main.is_terminated() {
                        self.lower_stmt(&mut main, other)?;
                    }
                },
            }
        }

        if !main.is_terminated() {
            let zero = main.emit_const(Constant::I32(0));
            main.terminate(Terminator::Ret(zero));
        }
        self.module.functions.push(main.finish(Constant::I32(0)));

        Ok(self.module)
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn lower_global_var(&mut self, decl: &VarDecl) -> Result<(), LowerError> {
        let ty = declared_ty(decl.ty)?;
        let init = match &decl.init {
            Some(expr) => const_eval(expr).ok_or_else(|| LowerError::NonConstantGlobalInit {
                name: decl.name.lexeme.clone(),
            })?,
            None => Constant::zero(ty),
        };

        let id = self.module.define_global(Global {
            name: decl.name.lexeme.clone(),
            ty: ty.into(),
            init,
            constant: false,
        });
        self.bindings
            .insert(decl.name.lexeme.clone(), Binding::Global { id, ty });
        Ok(())
    }

    fn lower_global_const(&mut self, decl: &ConstDecl) -> Result<(), LowerError> {
        let ty = declared_ty(decl.ty)?;
        let init = const_eval(&decl.init).ok_or_else(|| LowerError::NonConstantGlobalInit {
            name: decl.name.lexeme.clone(),
        })?;

        let id = self.module.define_global(Global {
            name: decl.name.lexeme.clone(),
            ty: ty.into(),
            init,
            constant: true,
        });
        self.bindings
            .insert(decl.name.lexeme.clone(), Binding::Global { id, ty });
        Ok(())
    }

    fn lower_function(&mut self, decl: &FuncDecl) -> Result<(), LowerError> {
        let name = decl.name.lexeme.clone();
        let ret = decl.return_ty;

        // The function is bound before its body is lowered so it can call
        // itself; the binding survives the snapshot restore below.
        let id = FuncId(self.module.functions.len() as u32);
        self.bindings.insert(name.clone(), Binding::Func { id, ret });

        let snapshot = self.bindings.clone();

        let param_types: Vec<IrType> = decl.params.iter().map(|p| p.ty.into()).collect();
        let mut builder = FuncBuilder::new(name, param_types, ret.into());

        // Each parameter gets a stack slot holding the incoming argument.
        for (index, param) in decl.params.iter().enumerate() {
            let slot = builder.emit(Instr::Alloca(param.ty.into()), IrType::Ptr);
            builder.emit_store(Operand::Arg(index as u32), slot);
            self.bindings.insert(
                param.name.lexeme.clone(),
                Binding::Slot {
                    ptr: slot,
                    ty: param.ty,
                },
            );
        }

        let result = self.lower_block(&mut builder, &decl.body);
        self.bindings = snapshot;
        result?;

        self.module.functions.push(builder.finish(Constant::zero(ret)));
        Ok(())
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn lower_block(&mut self, builder: &mut FuncBuilder, block: &Block) -> Result<(), LowerError> {
        let snapshot = self.bindings.clone();
        for stmt in &block.statements {
            // Statements after a break, continue, or return in the same
            // block are unreachable and dropped.
            if builder.is_terminated() {
                break;
            }
            self.lower_stmt(builder, stmt)?;
        }
        self.bindings = snapshot;
        Ok(())
    }

    fn lower_stmt(&mut self, builder: &mut FuncBuilder, stmt: &Stmt) -> Result<(), LowerError> {
        match stmt {
            Stmt::Var(decl) => {
                let ty = declared_ty(decl.ty)?;
                let init = match &decl.init {
                    Some(expr) => self.lower_expr(builder, expr)?.0,
                    // Uninitialized variables read as zero.
                    None => builder.emit_const(Constant::zero(ty)),
                };
                let slot = builder.emit(Instr::Alloca(ty.into()), IrType::Ptr);
                builder.emit_store(init, slot);
                self.bindings
                    .insert(decl.name.lexeme.clone(), Binding::Slot { ptr: slot, ty });
                Ok(())
            },

            Stmt::Const(decl) => {
                let ty = declared_ty(decl.ty)?;
                let (value, _) = self.lower_expr(builder, &decl.init)?;
                self.bindings
                    .insert(decl.name.lexeme.clone(), Binding::Direct { value, ty });
                Ok(())
            },

            Stmt::Assign(assign) => {
                let (value, _) = self.lower_expr(builder, &assign.value)?;
                match self.bindings.get(&assign.name.lexeme) {
                    Some(Binding::Slot { ptr, .. }) => {
                        let ptr = *ptr;
                        builder.emit_store(value, ptr);
                        Ok(())
                    },
                    Some(Binding::Global { id, .. }) => {
                        let ptr = Operand::Global(*id);
                        builder.emit_store(value, ptr);
                        Ok(())
                    },
                    _ => Err(LowerError::internal(format!(
                        "assignment to unknown symbol '{}'",
                        assign.name.lexeme
                    ))),
                }
            },

            Stmt::Print(print) => {
                let (value, ty) = self.lower_expr(builder, &print.expr)?;
                if ty != Ty::Char {
                    return Err(LowerError::UnsupportedPrint { ty });
                }
                builder.emit(
                    Instr::Call {
                        callee: Callee::Extern(self.print_char),
                        args: vec![value],
                    },
                    IrType::Void,
                );
                Ok(())
            },

            Stmt::If(if_stmt) => self.lower_if(builder, if_stmt),
            Stmt::While(while_stmt) => self.lower_while(builder, while_stmt),

            Stmt::Return(ret) => {
                let (value, _) = self.lower_expr(builder, &ret.expr)?;
                builder.terminate(Terminator::Ret(value));
                Ok(())
            },

            Stmt::Break(_) => {
                let target = self
                    .loop_stack
                    .last()
                    .map(|blocks| blocks.end)
                    .ok_or_else(|| LowerError::internal("break outside of a loop"))?;
                builder.terminate(Terminator::Br(target));
                Ok(())
            },

            Stmt::Continue(_) => {
                let target = self
                    .loop_stack
                    .last()
                    .map(|blocks| blocks.entry)
                    .ok_or_else(|| LowerError::internal("continue outside of a loop"))?;
                builder.terminate(Terminator::Br(target));
                Ok(())
            },

            Stmt::Block(block) => self.lower_block(builder, block),

            Stmt::Expr(stmt) => {
                self.lower_expr(builder, &stmt.expr)?;
                Ok(())
            },

            Stmt::Func(_) => Err(LowerError::internal(
                "function declaration below top level",
            )),
        }
    }

    fn lower_if(&mut self, builder: &mut FuncBuilder, if_stmt: &IfStmt) -> Result<(), LowerError> {
        let (cond, _) = self.lower_expr(builder, &if_stmt.condition)?;
        let suffix = self.fresh_label();

        let then_block = builder.create_block(format!("then_{}", suffix));

        if let Some(else_stmt) = if_stmt.else_branch.as_deref() {
            let else_block = builder.create_block(format!("else_{}", suffix));
            let end_block = builder.create_block(format!("endif_{}", suffix));

            builder.terminate(Terminator::CondBr {
                cond,
                then_block,
                else_block,
            });

            builder.position_at(then_block);
            self.lower_block(builder, &if_stmt.then_branch)?;
            builder.terminate(Terminator::Br(end_block));

            builder.position_at(else_block);
            self.lower_stmt(builder, else_stmt)?;
            builder.terminate(Terminator::Br(end_block));

            builder.position_at(end_block);
        } else {
            let end_block = builder.create_block(format!("endif_{}", suffix));

            builder.terminate(Terminator::CondBr {
                cond,
                then_block,
                else_block: end_block,
            });

            builder.position_at(then_block);
            self.lower_block(builder, &if_stmt.then_branch)?;
            builder.terminate(Terminator::Br(end_block));

            builder.position_at(end_block);
        }

        Ok(())
    }

    /// The conventional loop shape: the entry block evaluates the condition
    /// and branches, the body jumps back to the entry, and lowering
    /// continues in the end block.
    fn lower_while(
        &mut self,
        builder: &mut FuncBuilder,
        while_stmt: &WhileStmt,
    ) -> Result<(), LowerError> {
        let suffix = self.fresh_label();
        let entry = builder.create_block(format!("while_entry_{}", suffix));
        let body = builder.create_block(format!("while_body_{}", suffix));
        let end = builder.create_block(format!("while_end_{}", suffix));

        builder.terminate(Terminator::Br(entry));

        builder.position_at(entry);
        let (cond, _) = self.lower_expr(builder, &while_stmt.condition)?;
        builder.terminate(Terminator::CondBr {
            cond,
            then_block: body,
            else_block: end,
        });

        builder.position_at(body);
        self.loop_stack.push(LoopBlocks { entry, end });
        let result = self.lower_block(builder, &while_stmt.body);
        self.loop_stack.pop();
        result?;
        builder.terminate(Terminator::Br(entry));

        builder.position_at(end);
        Ok(())
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn lower_expr(
        &mut self,
        builder: &mut FuncBuilder,
        expr: &Expr,
    ) -> Result<(Operand, Ty), LowerError> {
        match expr {
            Expr::Literal(lit) => {
                let constant = constant_of(lit.value);
                Ok((builder.emit_const(constant), lit.value.ty()))
            },

            Expr::Name(name) => match self.bindings.get(&name.token.lexeme) {
                Some(Binding::Slot { ptr, ty }) => {
                    let (ptr, ty) = (*ptr, *ty);
                    let value = builder.emit(Instr::Load { ptr, ty: ty.into() }, ty.into());
                    Ok((value, ty))
                },
                Some(Binding::Direct { value, ty }) => Ok((*value, *ty)),
                Some(Binding::Global { id, ty }) => {
                    let (id, ty) = (*id, *ty);
                    let value = builder.emit(
                        Instr::Load {
                            ptr: Operand::Global(id),
                            ty: ty.into(),
                        },
                        ty.into(),
                    );
                    Ok((value, ty))
                },
                _ => Err(LowerError::internal(format!(
                    "read of unknown symbol '{}'",
                    name.token.lexeme
                ))),
            },

            Expr::Grouping(inner) => self.lower_expr(builder, inner),

            Expr::Unary(unary) => match (unary.op.kind, unary.operand.as_ref()) {
                // Only literal operands have an encoding: a negated
                // constant is materialized directly.
                (TokenKind::Minus, Expr::Literal(lit)) => match lit.value {
                    LitValue::Int(v) => Ok((builder.emit_const(Constant::I32(-v)), Ty::Int)),
                    LitValue::Float(v) => Ok((builder.emit_const(Constant::F32(-v)), Ty::Float)),
                    _ => Err(LowerError::UnsupportedOp {
                        op: unary.op.lexeme.clone(),
                        ty: lit.value.ty(),
                    }),
                },
                _ => {
                    let ty = expr_ty(&unary.operand)?;
                    Err(LowerError::UnsupportedOp {
                        op: unary.op.lexeme.clone(),
                        ty,
                    })
                },
            },

            Expr::Binary(binary) => {
                let (lhs, lhs_ty) = self.lower_expr(builder, &binary.lhs)?;
                let (rhs, _) = self.lower_expr(builder, &binary.rhs)?;

                match lhs_ty {
                    Ty::Int => {
                        let op = match binary.op.kind {
                            TokenKind::Plus => IntOp::Add,
                            TokenKind::Minus => IntOp::Sub,
                            TokenKind::Star => IntOp::Mul,
                            // There is no integer division instruction.
                            _ => {
                                return Err(LowerError::UnsupportedOp {
                                    op: binary.op.lexeme.clone(),
                                    ty: lhs_ty,
                                })
                            },
                        };
                        let value = builder.emit(Instr::IntBin { op, lhs, rhs }, IrType::I32);
                        Ok((value, Ty::Int))
                    },
                    Ty::Float => {
                        let op = match binary.op.kind {
                            TokenKind::Plus => FloatOp::FAdd,
                            TokenKind::Minus => FloatOp::FSub,
                            TokenKind::Star => FloatOp::FMul,
                            TokenKind::Slash => FloatOp::FDiv,
                            _ => {
                                return Err(LowerError::UnsupportedOp {
                                    op: binary.op.lexeme.clone(),
                                    ty: lhs_ty,
                                })
                            },
                        };
                        let value = builder.emit(Instr::FloatBin { op, lhs, rhs }, IrType::F32);
                        Ok((value, Ty::Float))
                    },
                    other => Err(LowerError::UnsupportedOp {
                        op: binary.op.lexeme.clone(),
                        ty: other,
                    }),
                }
            },

            Expr::Compare(compare) => {
                let (lhs, lhs_ty) = self.lower_expr(builder, &compare.lhs)?;
                let (rhs, _) = self.lower_expr(builder, &compare.rhs)?;

                let value = if lhs_ty == Ty::Float {
                    let pred = float_predicate(compare.op.kind)?;
                    builder.emit(Instr::FCmp { pred, lhs, rhs }, IrType::I1)
                } else {
                    // int, char, and bool equality all compare as signed
                    // integers
                    let pred = int_predicate(compare.op.kind)?;
                    builder.emit(Instr::ICmp { pred, lhs, rhs }, IrType::I1)
                };
                Ok((value, Ty::Bool))
            },

            Expr::Logical(logical) => Err(LowerError::UnsupportedOp {
                op: logical.op.lexeme.clone(),
                ty: Ty::Bool,
            }),

            Expr::Call(call) => {
                let name = match call.callee.as_ref() {
                    Expr::Name(name) => &name.token.lexeme,
                    _ => return Err(LowerError::internal("callee is not a name")),
                };
                let (id, ret) = match self.bindings.get(name) {
                    Some(Binding::Func { id, ret }) => (*id, *ret),
                    _ => {
                        return Err(LowerError::internal(format!(
                            "call of unknown function '{}'",
                            name
                        )))
                    },
                };

                let mut args = Vec::with_capacity(call.args.len());
                for arg in &call.args {
                    args.push(self.lower_expr(builder, arg)?.0);
                }

                let value = builder.emit(
                    Instr::Call {
                        callee: Callee::Func(id),
                        args,
                    },
                    ret.into(),
                );
                Ok((value, ret))
            },
        }
    }

    fn fresh_label(&mut self) -> u32 {
        self.label_counter += 1;
        self.label_counter
    }
}

fn declared_ty(ty: Option<Ty>) -> Result<Ty, LowerError> {
    ty.ok_or_else(|| LowerError::internal("declaration reached lowering without a type"))
}

fn expr_ty(expr: &Expr) -> Result<Ty, LowerError> {
    expr.ty()
        .ok_or_else(|| LowerError::internal("expression reached lowering without a type"))
}

fn constant_of(value: LitValue) -> Constant {
    match value {
        LitValue::Int(v) => Constant::I32(v),
        LitValue::Float(v) => Constant::F32(v),
        LitValue::Char(v) => Constant::I8(v),
        LitValue::Bool(v) => Constant::I1(v),
    }
}

/// Evaluates the constant expressions global initializers are restricted
/// to: literals, grouping, and negation of numeric literals.
fn const_eval(expr: &Expr) -> Option<Constant> {
    match expr {
        Expr::Literal(lit) => Some(constant_of(lit.value)),
        Expr::Grouping(inner) => const_eval(inner),
        Expr::Unary(unary) if unary.op.kind == TokenKind::Minus => {
            match const_eval(&unary.operand)? {
                Constant::I32(v) => Some(Constant::I32(-v)),
                Constant::F32(v) => Some(Constant::F32(-v)),
                _ => None,
            }
        },
        _ => None,
    }
}

fn int_predicate(kind: TokenKind) -> Result<IntPredicate, LowerError> {
    match kind {
        TokenKind::Less => Ok(IntPredicate::Slt),
        TokenKind::LessEq => Ok(IntPredicate::Sle),
        TokenKind::Greater => Ok(IntPredicate::Sgt),
        TokenKind::GreaterEq => Ok(IntPredicate::Sge),
        TokenKind::EqEq => Ok(IntPredicate::Eq),
        TokenKind::BangEq => Ok(IntPredicate::Ne),
        _ => Err(LowerError::internal("not a comparison operator")),
    }
}

fn float_predicate(kind: TokenKind) -> Result<FloatPredicate, LowerError> {
    match kind {
        TokenKind::Less => Ok(FloatPredicate::Olt),
        TokenKind::LessEq => Ok(FloatPredicate::Ole),
        TokenKind::Greater => Ok(FloatPredicate::Ogt),
        TokenKind::GreaterEq => Ok(FloatPredicate::Oge),
        TokenKind::EqEq => Ok(FloatPredicate::Oeq),
        TokenKind::BangEq => Ok(FloatPredicate::One),
        _ => Err(LowerError::internal("not a comparison operator")),
    }
}
