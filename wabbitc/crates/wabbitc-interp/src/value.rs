//! Runtime values.

use std::fmt;

use wabbitc_par::{LitValue, Ty};

/// A runtime value, one per primitive type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Char(u8),
    Bool(bool),
}

impl Value {
    pub fn ty(self) -> Ty {
        match self {
            Value::Int(_) => Ty::Int,
            Value::Float(_) => Ty::Float,
            Value::Char(_) => Ty::Char,
            Value::Bool(_) => Ty::Bool,
        }
    }

    /// What a declared-but-uninitialized variable reads as.
    pub fn zero(ty: Ty) -> Value {
        match ty {
            Ty::Int => Value::Int(0),
            Ty::Float => Value::Float(0.0),
            Ty::Char => Value::Char(0),
            Ty::Bool => Value::Bool(false),
        }
    }
}

impl From<LitValue> for Value {
    fn from(value: LitValue) -> Value {
        match value {
            LitValue::Int(v) => Value::Int(v),
            LitValue::Float(v) => Value::Float(v),
            LitValue::Char(v) => Value::Char(v),
            LitValue::Bool(v) => Value::Bool(v),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            // Debug keeps the decimal point on round floats.
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Char(v) => write!(f, "{}", *v as char),
            Value::Bool(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Char(b'L').to_string(), "L");
        assert_eq!(Value::Bool(false).to_string(), "false");
    }

    #[test]
    fn test_zero_values() {
        assert_eq!(Value::zero(Ty::Int), Value::Int(0));
        assert_eq!(Value::zero(Ty::Float), Value::Float(0.0));
        assert_eq!(Value::zero(Ty::Char), Value::Char(0));
        assert_eq!(Value::zero(Ty::Bool), Value::Bool(false));
    }
}
