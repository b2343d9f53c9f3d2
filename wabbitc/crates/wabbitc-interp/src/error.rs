//! Runtime errors.

use thiserror::Error;

/// Errors raised while interpreting. User programs can only trigger the
/// arithmetic variants; everything else means the checker let something
/// through.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("failed to write program output: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RuntimeError {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        RuntimeError::Internal(message.into())
    }
}

impl PartialEq for RuntimeError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RuntimeError::DivisionByZero, RuntimeError::DivisionByZero) => true,
            (RuntimeError::Internal(a), RuntimeError::Internal(b)) => a == b,
            // io::Error is not comparable
            _ => false,
        }
    }
}
