//! Statement formatter for `--dump-ast`.
//!
//! Renders parsed statements back as indented source text. This is a
//! diagnostic aid, not a pretty-printer contract: the output is meant to be
//! read next to the input when inspecting what the parser built.

use wabbitc_par::ast::*;

/// Formats a whole program.
pub fn format_program(program: &Block) -> String {
    let mut formatter = Formatter::new();
    for stmt in &program.statements {
        formatter.stmt(stmt);
    }
    formatter.out
}

struct Formatter {
    out: String,
    indent: usize,
}

impl Formatter {
    fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn block_body(&mut self, block: &Block) {
        self.indent += 1;
        for stmt in &block.statements {
            self.stmt(stmt);
        }
        self.indent -= 1;
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Var(decl) => {
                let mut text = format!("var {}", decl.name.lexeme);
                if let Some(ty) = decl.ty {
                    text.push_str(&format!(" {}", ty));
                }
                if let Some(init) = &decl.init {
                    text.push_str(&format!(" = {}", expr_text(init)));
                }
                text.push(';');
                self.line(&text);
            },
            Stmt::Const(decl) => {
                let mut text = format!("const {}", decl.name.lexeme);
                if let Some(ty) = decl.ty {
                    text.push_str(&format!(" {}", ty));
                }
                text.push_str(&format!(" = {};", expr_text(&decl.init)));
                self.line(&text);
            },
            Stmt::Assign(assign) => {
                self.line(&format!("{} = {};", assign.name.lexeme, expr_text(&assign.value)));
            },
            Stmt::Print(print) => {
                self.line(&format!("print {};", expr_text(&print.expr)));
            },
            Stmt::If(if_stmt) => self.if_stmt(if_stmt, ""),
            Stmt::While(while_stmt) => {
                self.line(&format!("while {} {{", expr_text(&while_stmt.condition)));
                self.block_body(&while_stmt.body);
                self.line("}");
            },
            Stmt::Return(ret) => {
                self.line(&format!("return {};", expr_text(&ret.expr)));
            },
            Stmt::Break(_) => self.line("break;"),
            Stmt::Continue(_) => self.line("continue;"),
            Stmt::Func(func) => {
                let params = func
                    .params
                    .iter()
                    .map(|p| format!("{} {}", p.name.lexeme, p.ty))
                    .collect::<Vec<_>>()
                    .join(", ");
                self.line(&format!(
                    "func {}({}) {} {{",
                    func.name.lexeme, params, func.return_ty
                ));
                self.block_body(&func.body);
                self.line("}");
            },
            Stmt::Block(block) => {
                self.line("{");
                self.block_body(block);
                self.line("}");
            },
            Stmt::Expr(stmt) => {
                self.line(&format!("{};", expr_text(&stmt.expr)));
            },
        }
    }

    fn if_stmt(&mut self, if_stmt: &IfStmt, prefix: &str) {
        self.line(&format!(
            "{}if {} {{",
            prefix,
            expr_text(&if_stmt.condition)
        ));
        self.block_body(&if_stmt.then_branch);

        match if_stmt.else_branch.as_deref() {
            None => self.line("}"),
            Some(Stmt::If(nested)) => self.if_stmt(nested, "} else "),
            Some(Stmt::Block(block)) => {
                self.line("} else {");
                self.block_body(block);
                self.line("}");
            },
            Some(other) => {
                self.line("} else {");
                self.indent += 1;
                self.stmt(other);
                self.indent -= 1;
                self.line("}");
            },
        }
    }
}

fn expr_text(expr: &Expr) -> String {
    match expr {
        Expr::Literal(lit) => lit.value.to_string(),
        Expr::Name(name) => name.token.lexeme.clone(),
        Expr::Grouping(inner) => format!("({})", expr_text(inner)),
        Expr::Unary(unary) => format!("{}{}", unary.op.lexeme, expr_text(&unary.operand)),
        Expr::Binary(binary) => format!(
            "{} {} {}",
            expr_text(&binary.lhs),
            binary.op.lexeme,
            expr_text(&binary.rhs)
        ),
        Expr::Compare(compare) => format!(
            "{} {} {}",
            expr_text(&compare.lhs),
            compare.op.lexeme,
            expr_text(&compare.rhs)
        ),
        Expr::Logical(logical) => format!(
            "{} {} {}",
            expr_text(&logical.lhs),
            logical.op.lexeme,
            expr_text(&logical.rhs)
        ),
        Expr::Call(call) => {
            let args = call
                .args
                .iter()
                .map(expr_text)
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}({})", expr_text(&call.callee), args)
        },
    }
}
