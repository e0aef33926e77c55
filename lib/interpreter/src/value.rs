use std::fmt::{self, Display, Formatter};

use scanner::{CompareOp, Operator};

use crate::RuntimeError;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::From)]
pub enum Value {
    Integer(i64),
    Str(String),
}

impl Value {
    /// Arithmetic on two integers, concatenation as soon as either side is a string.
    pub fn apply(self, operator: Operator, rhs: Value) -> Result<Value, RuntimeError> {
        match (self, rhs) {
            (Value::Integer(l), Value::Integer(r)) => {
                arithmetic(operator, l, r).map(Value::Integer)
            }
            (l, r) => match operator {
                Operator::Add => Ok(Value::Str(format!("{}{}", l, r))),
                _ => Err(RuntimeError::UnsupportedStringOperator(operator)),
            },
        }
    }

    /// Integers compare numerically. Anything involving a string compares textual forms,
    /// and only for (in)equality.
    pub fn compare(&self, operator: CompareOp, rhs: &Value) -> Result<bool, RuntimeError> {
        match (self, rhs) {
            (Value::Integer(l), Value::Integer(r)) => Ok(match operator {
                CompareOp::Less => l < r,
                CompareOp::Greater => l > r,
                CompareOp::Equal => l == r,
                CompareOp::NotEqual => l != r,
                CompareOp::LessEqual => l <= r,
                CompareOp::GreaterEqual => l >= r,
            }),
            (l, r) if operator.is_equality() => {
                Ok((l.to_string() == r.to_string()) == (operator == CompareOp::Equal))
            }
            _ => Err(RuntimeError::UnsupportedStringComparison(operator)),
        }
    }
}

fn arithmetic(operator: Operator, l: i64, r: i64) -> Result<i64, RuntimeError> {
    let result = match operator {
        Operator::Add => l.checked_add(r),
        Operator::Subtract => l.checked_sub(r),
        Operator::Multiply => l.checked_mul(r),
        Operator::Divide if r == 0 => return Err(RuntimeError::DivisionByZero),
        Operator::Divide => floor_div(l, r),
    };
    result.ok_or(RuntimeError::IntegerOverflow { left: l, operator, right: r })
}

/// Rounds toward negative infinity, unlike `/` which truncates toward zero.
fn floor_div(l: i64, r: i64) -> Option<i64> {
    let quotient = l.checked_div(r)?;
    if l % r != 0 && (l < 0) != (r < 0) {
        Some(quotient - 1)
    } else {
        Some(quotient)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}
