//! AST node definitions.
//!
//! Every node is a variant of one of two sum types: [`Expr`] for
//! expressions, [`Stmt`] for statements. Expression nodes carry a `ty` slot
//! that starts out `None` and is filled in by the type checker; literals
//! know their type from the moment they are parsed.

use std::fmt;

use wabbitc_lex::{Token, TokenKind};

/// One of the four primitive types.
///
/// This is the AST-level type tag: declarations carry it as an annotation,
/// and the type checker infers it onto every expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    /// 32-bit signed integer
    Int,
    /// 32-bit IEEE-754 float
    Float,
    /// 8-bit unsigned character
    Char,
    /// Boolean
    Bool,
}

impl Ty {
    /// Maps a type-name keyword token to its type.
    pub fn from_token(kind: TokenKind) -> Option<Ty> {
        match kind {
            TokenKind::TyInt => Some(Ty::Int),
            TokenKind::TyFloat => Some(Ty::Float),
            TokenKind::TyChar => Some(Ty::Char),
            TokenKind::TyBool => Some(Ty::Bool),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Ty::Int | Ty::Float)
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Ty::Int => "int",
            Ty::Float => "float",
            Ty::Char => "char",
            Ty::Bool => "bool",
        };
        f.write_str(s)
    }
}

/// A parsed literal value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LitValue {
    Int(i32),
    Float(f32),
    Char(u8),
    Bool(bool),
}

impl LitValue {
    /// The primitive type of the value; known without inference.
    pub fn ty(self) -> Ty {
        match self {
            LitValue::Int(_) => Ty::Int,
            LitValue::Float(_) => Ty::Float,
            LitValue::Char(_) => Ty::Char,
            LitValue::Bool(_) => Ty::Bool,
        }
    }
}

impl fmt::Display for LitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LitValue::Int(v) => write!(f, "{}", v),
            LitValue::Float(v) => write!(f, "{:?}", v),
            LitValue::Char(v) => write!(f, "'{}'", *v as char),
            LitValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// Expression node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Integer, float, char, or bool literal
    Literal(Literal),
    /// Reference to a declared name
    Name(NameExpr),
    /// Parenthesized expression
    Grouping(Box<Expr>),
    /// Prefix `-` or `!`
    Unary(UnaryExpr),
    /// Arithmetic: `+ - * /`
    Binary(BinaryExpr),
    /// Relational and equality: `< <= > >= == !=`
    Compare(CompareExpr),
    /// `&&` / `||` - recognized by the grammar, rejected by the checker
    Logical(LogicalExpr),
    /// Function call
    Call(CallExpr),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Literal {
    pub value: LitValue,
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NameExpr {
    /// The identifier token (or a type-name token used in expression
    /// position, which the checker rejects as undeclared).
    pub token: Token,
    pub ty: Option<Ty>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnaryExpr {
    pub op: Token,
    pub operand: Box<Expr>,
    pub ty: Option<Ty>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BinaryExpr {
    pub lhs: Box<Expr>,
    pub op: Token,
    pub rhs: Box<Expr>,
    pub ty: Option<Ty>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompareExpr {
    pub lhs: Box<Expr>,
    pub op: Token,
    pub rhs: Box<Expr>,
    pub ty: Option<Ty>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogicalExpr {
    pub lhs: Box<Expr>,
    pub op: Token,
    pub rhs: Box<Expr>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CallExpr {
    /// The callee expression; the checker requires it to be a [`NameExpr`]
    /// naming a function.
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
    pub ty: Option<Ty>,
}

impl Expr {
    /// The type annotation, once the checker has run. Groupings are
    /// transparent and report their inner expression's type.
    pub fn ty(&self) -> Option<Ty> {
        match self {
            Expr::Literal(lit) => Some(lit.value.ty()),
            Expr::Name(name) => name.ty,
            Expr::Grouping(inner) => inner.ty(),
            Expr::Unary(unary) => unary.ty,
            Expr::Binary(binary) => binary.ty,
            Expr::Compare(compare) => compare.ty,
            Expr::Logical(_) => None,
            Expr::Call(call) => call.ty,
        }
    }

    /// Source line of the leftmost token, for diagnostics.
    pub fn line(&self) -> u32 {
        match self {
            Expr::Literal(lit) => lit.line,
            Expr::Name(name) => name.token.line,
            Expr::Grouping(inner) => inner.line(),
            Expr::Unary(unary) => unary.op.line,
            Expr::Binary(binary) => binary.lhs.line(),
            Expr::Compare(compare) => compare.lhs.line(),
            Expr::Logical(logical) => logical.lhs.line(),
            Expr::Call(call) => call.callee.line(),
        }
    }
}

/// Statement node.
#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Var(VarDecl),
    Const(ConstDecl),
    Assign(AssignStmt),
    Print(PrintStmt),
    If(IfStmt),
    While(WhileStmt),
    Return(ReturnStmt),
    Break(BreakStmt),
    Continue(ContinueStmt),
    Func(FuncDecl),
    Block(Block),
    Expr(ExprStmt),
}

/// `var NAME [type] [= expr] ;` - at least one of type/initializer present.
#[derive(Clone, Debug, PartialEq)]
pub struct VarDecl {
    pub name: Token,
    /// Annotated type, or the initializer's type once inferred.
    pub ty: Option<Ty>,
    pub init: Option<Expr>,
}

/// `const NAME [type] = expr ;`
#[derive(Clone, Debug, PartialEq)]
pub struct ConstDecl {
    pub name: Token,
    pub ty: Option<Ty>,
    pub init: Expr,
}

/// `NAME = expr ;`
#[derive(Clone, Debug, PartialEq)]
pub struct AssignStmt {
    pub name: Token,
    pub value: Expr,
}

/// `print expr ;`
#[derive(Clone, Debug, PartialEq)]
pub struct PrintStmt {
    pub expr: Expr,
}

/// `if expr { ... } [else statement]` - the else arm is either a block or
/// another if, so a dangling else binds to the nearest if.
#[derive(Clone, Debug, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Block,
    pub else_branch: Option<Box<Stmt>>,
}

/// `while expr { ... }`
#[derive(Clone, Debug, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Block,
}

/// `return expr ;`
#[derive(Clone, Debug, PartialEq)]
pub struct ReturnStmt {
    pub expr: Expr,
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BreakStmt {
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContinueStmt {
    pub line: u32,
}

/// Function parameter; name and type are both mandatory.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: Token,
    pub ty: Ty,
}

/// `func NAME ( params ) type { ... }`
#[derive(Clone, Debug, PartialEq)]
pub struct FuncDecl {
    pub name: Token,
    pub params: Vec<Param>,
    pub return_ty: Ty,
    pub body: Block,
}

/// `{ statement* }`
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

/// A bare expression in statement position.
#[derive(Clone, Debug, PartialEq)]
pub struct ExprStmt {
    pub expr: Expr,
}
