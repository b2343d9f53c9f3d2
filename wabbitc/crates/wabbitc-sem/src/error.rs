//! Type checking errors.

use thiserror::Error;
use wabbitc_par::Ty;

/// The first type error terminates checking.
#[derive(Debug, Error, PartialEq)]
pub enum TypeError {
    #[error("line {line}: undeclared name '{name}'")]
    Undeclared { name: String, line: u32 },

    #[error("line {line}: '{name}' is already declared in this scope")]
    Redeclaration { name: String, line: u32 },

    #[error("line {line}: cannot assign to constant '{name}'")]
    AssignToConst { name: String, line: u32 },

    #[error("line {line}: operator '{op}' expects matching operand types, got {lhs} and {rhs}")]
    OperandMismatch { op: String, lhs: Ty, rhs: Ty, line: u32 },

    #[error("line {line}: operator '{op}' is not defined for {ty}")]
    BadOperandType { op: String, ty: Ty, line: u32 },

    #[error("line {line}: logical operator '{op}' is not supported")]
    UnsupportedLogical { op: String, line: u32 },

    #[error("line {line}: type mismatch, expected {expected} but found {found}")]
    Mismatch { expected: Ty, found: Ty, line: u32 },

    #[error("line {line}: condition must be bool, found {found}")]
    NonBoolCondition { found: Ty, line: u32 },

    #[error("line {line}: tried to call undefined function '{name}'")]
    UndefinedFunction { name: String, line: u32 },

    #[error("line {line}: callee must be a function name")]
    CalleeNotAName { line: u32 },

    #[error(
        "line {line}: function '{name}' takes {expected} argument(s) but {found} were supplied"
    )]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        line: u32,
    },

    #[error(
        "line {line}: argument {index} of '{name}' expects {expected} but found {found}"
    )]
    ArgumentMismatch {
        name: String,
        index: usize,
        expected: Ty,
        found: Ty,
        line: u32,
    },

    #[error("line {line}: function returns {found} but its declared return type is {expected}")]
    ReturnMismatch { expected: Ty, found: Ty, line: u32 },

    #[error("line {line}: 'return' outside of a function")]
    ReturnOutsideFunction { line: u32 },

    #[error("line {line}: '{keyword}' outside of a loop")]
    OutsideLoop { keyword: String, line: u32 },

    #[error("line {line}: function declarations are only allowed at the top level")]
    NestedFunction { line: u32 },

    #[error("function '{name}' can reach the end of its body without returning")]
    MissingReturn { name: String },
}
