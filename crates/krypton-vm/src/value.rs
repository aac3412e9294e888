//! Runtime values and their operators.

use std::cmp::Ordering;
use std::fmt;

use krypton_ir::Constant;
use serde::{Deserialize, Serialize};

use crate::error::{RuntimeError, RuntimeResult};

/// A value on the evaluation stack or bound to a local.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
        }
    }

    /// Bools as is, numbers when non-zero, strings when non-empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Bool(b) => *b,
            Value::Str(s) => !s.is_empty(),
        }
    }

    /// Interpret text that looks like a numeric literal.
    pub fn parse_numeric(text: &str) -> Option<Value> {
        if !text.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
        text.parse()
            .map(Value::Int)
            .ok()
            .or_else(|| text.parse().map(Value::Float).ok())
    }

    fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            other => other.as_int().map(|v| v as f64),
        }
    }

    /// `ADD SUB MUL DIV`.
    ///
    /// Int and Bool operands stay Int with overflow checks, a Float operand
    /// promotes, and `ADD` concatenates when either side is a string.
    pub(crate) fn arithmetic(op: Arith, a: Value, b: Value) -> RuntimeResult<Value> {
        if let (Arith::Add, Value::Str(_), _) | (Arith::Add, _, Value::Str(_)) = (op, &a, &b) {
            return Ok(Value::Str(format!("{a}{b}")));
        }

        if let (Some(x), Some(y)) = (a.as_int(), b.as_int()) {
            if op == Arith::Div && y == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            return op
                .int(x, y)
                .map(Value::Int)
                .ok_or(RuntimeError::IntegerOverflow { opcode: op.opcode() });
        }

        match (a.as_float(), b.as_float()) {
            (Some(_), Some(y)) if op == Arith::Div && y == 0.0 => Err(RuntimeError::DivisionByZero),
            (Some(x), Some(y)) => Ok(Value::Float(op.float(x, y))),
            _ => Err(mismatch(op.opcode(), &a, &b)),
        }
    }

    /// `LT GT LE GE` over numbers or over two strings.
    pub(crate) fn compare(op: Compare, a: &Value, b: &Value) -> RuntimeResult<Value> {
        let ordering = match (a, b) {
            (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
            _ => match (a.as_int(), b.as_int()) {
                (Some(x), Some(y)) => Some(x.cmp(&y)),
                _ => match (a.as_float(), b.as_float()) {
                    (Some(x), Some(y)) => x.partial_cmp(&y),
                    _ => return Err(mismatch(op.opcode(), a, b)),
                },
            },
        };
        // NaN compares false under every operator.
        Ok(Value::Bool(ordering.is_some_and(|o| op.holds(o))))
    }

    /// `EQ` semantics: numbers compare by value across kinds, other kinds
    /// only equal themselves.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Str(x), Value::Str(y)) => x == y,
            (Value::Str(_), _) | (_, Value::Str(_)) => false,
            _ => match (self.as_int(), other.as_int()) {
                (Some(x), Some(y)) => x == y,
                _ => self.as_float() == other.as_float(),
            },
        }
    }

    pub(crate) fn negate(self) -> RuntimeResult<Value> {
        match self {
            Value::Float(v) => Ok(Value::Float(-v)),
            Value::Str(_) => Err(RuntimeError::TypeMismatch {
                opcode: "NEG",
                operands: self.type_name().to_string(),
            }),
            other => other
                .as_int()
                .and_then(i64::checked_neg)
                .map(Value::Int)
                .ok_or(RuntimeError::IntegerOverflow { opcode: "NEG" }),
        }
    }
}

fn mismatch(opcode: &'static str, a: &Value, b: &Value) -> RuntimeError {
    RuntimeError::TypeMismatch {
        opcode,
        operands: format!("{} and {}", a.type_name(), b.type_name()),
    }
}

impl From<&Constant> for Value {
    fn from(constant: &Constant) -> Self {
        match constant {
            Constant::Int(v) => Value::Int(*v),
            Constant::Float(v) => Value::Float(*v),
            Constant::Bool(b) => Value::Bool(*b),
            Constant::Str(s) => Value::Str(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Arith {
    Add,
    Sub,
    Mul,
    Div,
}

impl Arith {
    pub(crate) fn opcode(self) -> &'static str {
        match self {
            Arith::Add => "ADD",
            Arith::Sub => "SUB",
            Arith::Mul => "MUL",
            Arith::Div => "DIV",
        }
    }

    fn int(self, x: i64, y: i64) -> Option<i64> {
        match self {
            Arith::Add => x.checked_add(y),
            Arith::Sub => x.checked_sub(y),
            Arith::Mul => x.checked_mul(y),
            Arith::Div => x.checked_div(y),
        }
    }

    fn float(self, x: f64, y: f64) -> f64 {
        match self {
            Arith::Add => x + y,
            Arith::Sub => x - y,
            Arith::Mul => x * y,
            Arith::Div => x / y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Compare {
    Lt,
    Gt,
    LtEq,
    GtEq,
}

impl Compare {
    pub(crate) fn opcode(self) -> &'static str {
        match self {
            Compare::Lt => "LT",
            Compare::Gt => "GT",
            Compare::LtEq => "LE",
            Compare::GtEq => "GE",
        }
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Compare::Lt => ordering.is_lt(),
            Compare::Gt => ordering.is_gt(),
            Compare::LtEq => ordering.is_le(),
            Compare::GtEq => ordering.is_ge(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_arithmetic() {
        assert_eq!(
            Value::arithmetic(Arith::Add, Value::Int(2), Value::Int(3)).unwrap(),
            Value::Int(5)
        );
        assert_eq!(
            Value::arithmetic(Arith::Div, Value::Int(7), Value::Int(2)).unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            Value::arithmetic(Arith::Add, Value::Bool(true), Value::Int(1)).unwrap(),
            Value::Int(2)
        );
    }

    #[test]
    fn test_float_promotion() {
        assert_eq!(
            Value::arithmetic(Arith::Mul, Value::Int(2), Value::Float(1.5)).unwrap(),
            Value::Float(3.0)
        );
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(
            Value::arithmetic(Arith::Add, Value::Str("n=".into()), Value::Int(4)).unwrap(),
            Value::Str("n=4".into())
        );
        assert!(matches!(
            Value::arithmetic(Arith::Sub, Value::Str("a".into()), Value::Int(1)),
            Err(RuntimeError::TypeMismatch { opcode: "SUB", .. })
        ));
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(
            Value::arithmetic(Arith::Div, Value::Int(1), Value::Int(0)),
            Err(RuntimeError::DivisionByZero)
        ));
        assert!(matches!(
            Value::arithmetic(Arith::Div, Value::Float(1.0), Value::Int(0)),
            Err(RuntimeError::DivisionByZero)
        ));
    }

    #[test]
    fn test_overflow() {
        assert!(matches!(
            Value::arithmetic(Arith::Mul, Value::Int(i64::MAX), Value::Int(2)),
            Err(RuntimeError::IntegerOverflow { opcode: "MUL" })
        ));
        assert!(matches!(
            Value::Int(i64::MIN).negate(),
            Err(RuntimeError::IntegerOverflow { .. })
        ));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            Value::compare(Compare::Lt, &Value::Int(1), &Value::Float(1.5)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            Value::compare(Compare::GtEq, &Value::Str("b".into()), &Value::Str("a".into())).unwrap(),
            Value::Bool(true)
        );
        assert!(Value::compare(Compare::Gt, &Value::Str("b".into()), &Value::Int(1)).is_err());
    }

    #[test]
    fn test_loose_eq() {
        assert!(Value::Int(2).loose_eq(&Value::Float(2.0)));
        assert!(Value::Bool(true).loose_eq(&Value::Int(1)));
        assert!(!Value::Str("2".into()).loose_eq(&Value::Int(2)));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Float(0.5).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(Value::Str("0".into()).is_truthy());
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!(Value::parse_numeric("42"), Some(Value::Int(42)));
        assert_eq!(Value::parse_numeric("2.5"), Some(Value::Float(2.5)));
        assert_eq!(Value::parse_numeric("x1"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(5).to_string(), "5");
        assert_eq!(Value::Float(3.0).to_string(), "3.0");
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::Str("hi".into()).to_string(), "hi");
    }
}
