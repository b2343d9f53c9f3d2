//! wabbitc-interp - Tree-walking interpreter backend.
//!
//! Walks the checked AST directly, applying host operators to host values.
//! Shares the lexer, parser, and type checker with the compiling backend;
//! only the final phase differs. Program output goes to an injected
//! [`Write`] sink so the driver can point it at stdout and tests at a
//! buffer.
//!
//! `print` writes chars as the bare character and every other value as its
//! own line. Control flow (break, continue, return) propagates as a flow
//! signal through block execution; user-defined function calls swap in a
//! fresh local scope stack, so recursion behaves.

pub mod error;
pub mod value;

mod edge_cases;

pub use error::RuntimeError;
pub use value::Value;

use std::io::Write;

use rustc_hash::FxHashMap;
use wabbitc_lex::TokenKind;
use wabbitc_par::ast::*;

/// Interprets a checked program, writing its output to `out`.
///
/// # Example
///
/// ```
/// use wabbitc_lex::scan_tokens;
/// use wabbitc_par::parse;
/// use wabbitc_sem::check;
/// use wabbitc_interp::interpret;
///
/// let mut program = parse(scan_tokens("print 'h'; print 'i';").unwrap()).unwrap();
/// check(&mut program).unwrap();
/// let mut out = Vec::new();
/// interpret(&program, &mut out).unwrap();
/// assert_eq!(out, b"hi");
/// ```
pub fn interpret<W: Write>(program: &Block, out: W) -> Result<(), RuntimeError> {
    Interpreter::new(out).run(program)
}

/// Control-flow signal threaded through statement execution.
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// Variable environment: the global map plus a stack of block scopes.
/// Lookup goes innermost block outward, then to the globals.
#[derive(Default)]
struct Env {
    globals: FxHashMap<String, Value>,
    scopes: Vec<FxHashMap<String, Value>>,
}

impl Env {
    fn define(&mut self, name: &str, value: Value) {
        match self.scopes.last_mut() {
            Some(scope) => scope.insert(name.to_string(), value),
            None => self.globals.insert(name.to_string(), value),
        };
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        for scope in self.scopes.iter().rev() {
            if let Some(&value) = scope.get(name) {
                return Some(value);
            }
        }
        self.globals.get(name).copied()
    }

    fn assign(&mut self, name: &str, value: Value) -> bool {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                *slot = value;
                return true;
            }
        }
        if let Some(slot) = self.globals.get_mut(name) {
            *slot = value;
            return true;
        }
        false
    }
}

/// The interpreter. One instance runs one program.
pub struct Interpreter<W: Write> {
    out: W,
    env: Env,
    functions: FxHashMap<String, FuncDecl>,
}

impl<W: Write> Interpreter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            env: Env::default(),
            functions: FxHashMap::default(),
        }
    }

    /// Runs the program to completion.
    pub fn run(&mut self, program: &Block) -> Result<(), RuntimeError> {
        for stmt in &program.statements {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {},
                _ => return Err(RuntimeError::internal("control flow escaped top level")),
            }
        }
        Ok(())
    }

    fn exec_block(&mut self, block: &Block) -> Result<Flow, RuntimeError> {
        self.env.scopes.push(FxHashMap::default());
        let mut flow = Flow::Normal;
        for stmt in &block.statements {
            flow = self.exec_stmt(stmt)?;
            if !matches!(flow, Flow::Normal) {
                break;
            }
        }
        self.env.scopes.pop();
        Ok(flow)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Var(decl) => {
                let value = match (&decl.init, decl.ty) {
                    (Some(init), _) => self.eval(init)?,
                    (None, Some(ty)) => Value::zero(ty),
                    (None, None) => {
                        return Err(RuntimeError::internal("untyped declaration"))
                    },
                };
                self.env.define(&decl.name.lexeme, value);
                Ok(Flow::Normal)
            },

            Stmt::Const(decl) => {
                let value = self.eval(&decl.init)?;
                self.env.define(&decl.name.lexeme, value);
                Ok(Flow::Normal)
            },

            Stmt::Assign(assign) => {
                let value = self.eval(&assign.value)?;
                if !self.env.assign(&assign.name.lexeme, value) {
                    return Err(RuntimeError::internal(format!(
                        "assignment to undeclared variable '{}'",
                        assign.name.lexeme
                    )));
                }
                Ok(Flow::Normal)
            },

            Stmt::Print(print) => {
                let value = self.eval(&print.expr)?;
                match value {
                    // chars print as the bare character, the way the
                    // compiled runtime's print_char behaves
                    Value::Char(c) => write!(self.out, "{}", c as char)?,
                    other => writeln!(self.out, "{}", other)?,
                }
                Ok(Flow::Normal)
            },

            Stmt::If(if_stmt) => {
                if self.eval_condition(&if_stmt.condition)? {
                    self.exec_block(&if_stmt.then_branch)
                } else if let Some(else_branch) = if_stmt.else_branch.as_deref() {
                    self.exec_stmt(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            },

            Stmt::While(while_stmt) => {
                while self.eval_condition(&while_stmt.condition)? {
                    match self.exec_block(&while_stmt.body)? {
                        Flow::Normal | Flow::Continue => {},
                        Flow::Break => break,
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            },

            Stmt::Return(ret) => Ok(Flow::Return(self.eval(&ret.expr)?)),
            Stmt::Break(_) => Ok(Flow::Break),
            Stmt::Continue(_) => Ok(Flow::Continue),

            Stmt::Func(func) => {
                self.functions
                    .insert(func.name.lexeme.clone(), func.clone());
                Ok(Flow::Normal)
            },

            Stmt::Block(block) => self.exec_block(block),

            Stmt::Expr(stmt) => {
                self.eval(&stmt.expr)?;
                Ok(Flow::Normal)
            },
        }
    }

    fn eval_condition(&mut self, condition: &Expr) -> Result<bool, RuntimeError> {
        match self.eval(condition)? {
            Value::Bool(b) => Ok(b),
            other => Err(RuntimeError::internal(format!(
                "condition evaluated to {} instead of bool",
                other.ty()
            ))),
        }
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(lit) => Ok(lit.value.into()),

            Expr::Name(name) => self.env.lookup(&name.token.lexeme).ok_or_else(|| {
                RuntimeError::internal(format!("read of undeclared name '{}'", name.token.lexeme))
            }),

            Expr::Grouping(inner) => self.eval(inner),

            Expr::Unary(unary) => {
                let operand = self.eval(&unary.operand)?;
                match (unary.op.kind, operand) {
                    (TokenKind::Minus, Value::Int(v)) => Ok(Value::Int(v.wrapping_neg())),
                    (TokenKind::Minus, Value::Float(v)) => Ok(Value::Float(-v)),
                    (TokenKind::Bang, Value::Bool(v)) => Ok(Value::Bool(!v)),
                    _ => Err(RuntimeError::internal(format!(
                        "operator '{}' applied to {}",
                        unary.op.lexeme,
                        operand.ty()
                    ))),
                }
            },

            Expr::Binary(binary) => {
                let lhs = self.eval(&binary.lhs)?;
                let rhs = self.eval(&binary.rhs)?;
                self.apply_binary(binary.op.kind, &binary.op.lexeme, lhs, rhs)
            },

            Expr::Compare(compare) => {
                let lhs = self.eval(&compare.lhs)?;
                let rhs = self.eval(&compare.rhs)?;
                self.apply_compare(compare.op.kind, &compare.op.lexeme, lhs, rhs)
            },

            Expr::Logical(logical) => Err(RuntimeError::internal(format!(
                "logical operator '{}' is not evaluated",
                logical.op.lexeme
            ))),

            Expr::Call(call) => self.eval_call(call),
        }
    }

    fn apply_binary(
        &self,
        op: TokenKind,
        lexeme: &str,
        lhs: Value,
        rhs: Value,
    ) -> Result<Value, RuntimeError> {
        match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => {
                let result = match op {
                    TokenKind::Plus => a.wrapping_add(b),
                    TokenKind::Minus => a.wrapping_sub(b),
                    TokenKind::Star => a.wrapping_mul(b),
                    TokenKind::Slash => {
                        if b == 0 {
                            return Err(RuntimeError::DivisionByZero);
                        }
                        a.wrapping_div(b)
                    },
                    _ => return Err(self.bad_operator(lexeme, lhs)),
                };
                Ok(Value::Int(result))
            },
            (Value::Float(a), Value::Float(b)) => {
                let result = match op {
                    TokenKind::Plus => a + b,
                    TokenKind::Minus => a - b,
                    TokenKind::Star => a * b,
                    TokenKind::Slash => a / b,
                    _ => return Err(self.bad_operator(lexeme, lhs)),
                };
                Ok(Value::Float(result))
            },
            _ => Err(self.bad_operator(lexeme, lhs)),
        }
    }

    fn apply_compare(
        &self,
        op: TokenKind,
        lexeme: &str,
        lhs: Value,
        rhs: Value,
    ) -> Result<Value, RuntimeError> {
        let result = match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => compare_ordered(op, a.partial_cmp(&b)),
            (Value::Float(a), Value::Float(b)) => compare_ordered(op, a.partial_cmp(&b)),
            (Value::Char(a), Value::Char(b)) => compare_ordered(op, a.partial_cmp(&b)),
            (Value::Bool(a), Value::Bool(b)) => match op {
                TokenKind::EqEq => Some(a == b),
                TokenKind::BangEq => Some(a != b),
                _ => None,
            },
            _ => None,
        };

        result
            .map(Value::Bool)
            .ok_or_else(|| self.bad_operator(lexeme, lhs))
    }

    fn eval_call(&mut self, call: &CallExpr) -> Result<Value, RuntimeError> {
        let name = match call.callee.as_ref() {
            Expr::Name(name) => &name.token.lexeme,
            _ => return Err(RuntimeError::internal("callee is not a name")),
        };
        let func = self
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::internal(format!("call of unknown function '{}'", name)))?;

        let mut frame = FxHashMap::default();
        for (param, arg) in func.params.iter().zip(call.args.iter()) {
            frame.insert(param.name.lexeme.clone(), self.eval(arg)?);
        }

        // The callee sees its own scope stack: parameters at the bottom,
        // globals still reachable underneath.
        let saved = std::mem::take(&mut self.env.scopes);
        self.env.scopes.push(frame);
        let flow = self.exec_block(&func.body);
        self.env.scopes = saved;

        match flow? {
            Flow::Return(value) => Ok(value),
            _ => Err(RuntimeError::internal(format!(
                "function '{}' finished without returning",
                name
            ))),
        }
    }

    fn bad_operator(&self, lexeme: &str, operand: Value) -> RuntimeError {
        RuntimeError::internal(format!(
            "operator '{}' applied to {}",
            lexeme,
            operand.ty()
        ))
    }
}

/// Applies a comparison token to an ordering; `None` ordering (NaN) makes
/// every comparison false except `!=`.
fn compare_ordered(op: TokenKind, ordering: Option<std::cmp::Ordering>) -> Option<bool> {
    use std::cmp::Ordering;

    let result = match op {
        TokenKind::Less => ordering == Some(Ordering::Less),
        TokenKind::LessEq => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        TokenKind::Greater => ordering == Some(Ordering::Greater),
        TokenKind::GreaterEq => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        TokenKind::EqEq => ordering == Some(Ordering::Equal),
        TokenKind::BangEq => ordering != Some(Ordering::Equal),
        _ => return None,
    };
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wabbitc_lex::scan_tokens;
    use wabbitc_par::parse;
    use wabbitc_sem::check;

    fn run(source: &str) -> String {
        let mut program = parse(scan_tokens(source).unwrap()).unwrap();
        check(&mut program).unwrap();
        let mut out = Vec::new();
        interpret(&program, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn run_err(source: &str) -> RuntimeError {
        let mut program = parse(scan_tokens(source).unwrap()).unwrap();
        check(&mut program).unwrap();
        interpret(&program, &mut Vec::new()).unwrap_err()
    }

    #[test]
    fn test_print_char_writes_bare_character() {
        assert_eq!(run("print 'w'; print 'a'; print 'b';"), "wab");
    }

    #[test]
    fn test_print_newline_escape() {
        assert_eq!(run(r"print '\n';"), "\n");
    }

    #[test]
    fn test_print_numbers_one_per_line() {
        assert_eq!(run("print 1 + 2; print 2.5; print true;"), "3\n2.5\ntrue\n");
    }

    #[test]
    fn test_factorial_loop() {
        let out = run(
            "var x int = 1; var fact int = 1;\n\
             while x < 11 { fact = fact * x; x = x + 1; print fact; }",
        );
        assert_eq!(
            out,
            "1\n2\n6\n24\n120\n720\n5040\n40320\n362880\n3628800\n"
        );
    }

    #[test]
    fn test_if_else_selects_branch() {
        let out = run("var a int = 2; var b int = 3; if a < b { print 'L'; } else { print 'G'; }");
        assert_eq!(out, "L");
    }

    #[test]
    fn test_const_perimeter() {
        let out = run(
            "const pi float = 3.14; var r float = 2.0; var p float; p = 2.0 * r * pi; print p;",
        );
        assert_eq!(out, "12.56\n");
    }

    #[test]
    fn test_isprime() {
        let source = "func isprime(n int) bool {\n\
                          var f int = 2;\n\
                          while f <= n / 2 {\n\
                              if f * (n / f) == n { return false; }\n\
                              f = f + 1;\n\
                          }\n\
                          return true;\n\
                      }\n\
                      print isprime(15); print isprime(37);";
        assert_eq!(run(source), "false\ntrue\n");
    }

    #[test]
    fn test_recursion() {
        let source = "func fact(n int) int { if n < 2 { return 1; } return n * fact(n - 1); }\n\
                      print fact(10);";
        assert_eq!(run(source), "3628800\n");
    }

    #[test]
    fn test_break_and_continue() {
        let source = "var i int = 0; var total int = 0;\n\
                      while i < 10 {\n\
                          i = i + 1;\n\
                          if i == 3 { continue; }\n\
                          if i == 6 { break; }\n\
                          total = total + i;\n\
                      }\n\
                      print total;";
        // 1 + 2 + 4 + 5
        assert_eq!(run(source), "12\n");
    }

    #[test]
    fn test_uninitialized_variable_reads_zero() {
        assert_eq!(run("var x int; print x; var f float; print f;"), "0\n0.0\n");
    }

    #[test]
    fn test_integer_division_truncates() {
        assert_eq!(run("print 7 / 2; print -7 / 2;"), "3\n-3\n");
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(run_err("var z int = 0; print 1 / z;"), RuntimeError::DivisionByZero);
    }

    #[test]
    fn test_block_scope_shadowing() {
        let out = run("var x int = 1; { var x int = 2; print x; } print x;");
        assert_eq!(out, "2\n1\n");
    }

    #[test]
    fn test_globals_visible_in_functions() {
        let source = "const base int = 100; func bump(n int) int { return base + n; } print bump(5);";
        assert_eq!(run(source), "105\n");
    }

    #[test]
    fn test_caller_locals_not_visible_in_callee() {
        // the callee's scope stack starts from its own frame, so the
        // checker-validated program only ever reads params and globals
        let source = "func double(n int) int { return n + n; }\n\
                      var n int = 3; print double(n + 1);";
        assert_eq!(run(source), "8\n");
    }

    #[test]
    fn test_char_comparison() {
        assert_eq!(run("print 'a' < 'b'; print 'z' == 'z';"), "true\ntrue\n");
    }
}
