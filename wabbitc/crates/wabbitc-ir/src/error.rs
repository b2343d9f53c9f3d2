//! Lowering errors.
//!
//! The type checker is expected to have rejected every user mistake before
//! lowering starts; anything it cannot rule out (constructs the IR simply
//! has no encoding for) surfaces here, and everything else is an internal
//! error.

use thiserror::Error;
use wabbitc_par::Ty;

#[derive(Debug, Error, PartialEq)]
pub enum LowerError {
    #[error("global initializer for '{name}' is not a constant expression")]
    NonConstantGlobalInit { name: String },

    #[error("operator '{op}' is not supported for {ty} operands")]
    UnsupportedOp { op: String, ty: Ty },

    #[error("print of a {ty} value is not supported by the native runtime")]
    UnsupportedPrint { ty: Ty },

    #[error("internal error: {0}")]
    Internal(String),
}

impl LowerError {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        LowerError::Internal(message.into())
    }
}
