use std::fmt;

use rust_decimal::Decimal;

use crate::{ArithmeticError, Expression};

/// One of the four binary arithmetic operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    pub const ALL: [Self; 4] = [Self::Add, Self::Sub, Self::Mul, Self::Div];

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Self::Add),
            '-' => Some(Self::Sub),
            '*' => Some(Self::Mul),
            '/' => Some(Self::Div),
            _ => None,
        }
    }

    pub fn is_defined(symbol: char) -> bool {
        Self::from_symbol(symbol).is_some()
    }

    pub fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
        }
    }

    /// Higher binds tighter. All operators are left-associative.
    pub fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div => 2,
        }
    }

    /// Builds the tree node combining `lhs` and `rhs` with this operator.
    pub fn apply(self, lhs: Expression, rhs: Expression) -> Expression {
        Expression::Binary(self, Box::new(lhs), Box::new(rhs))
    }

    /// Computes `lhs <op> rhs` exactly, failing instead of saturating.
    pub fn combine(self, lhs: Decimal, rhs: Decimal) -> Result<Decimal, ArithmeticError> {
        let op: fn(Decimal, Decimal) -> Option<Decimal> = match self {
            Self::Add => |lhs, rhs| lhs.checked_add(rhs),
            Self::Sub => |lhs, rhs| lhs.checked_sub(rhs),
            Self::Mul => |lhs, rhs| lhs.checked_mul(rhs),
            Self::Div => {
                if rhs.is_zero() {
                    return Err(ArithmeticError::DivisionByZero);
                }
                |lhs, rhs| lhs.checked_div(rhs)
            }
        };
        op(lhs, rhs).ok_or(ArithmeticError::Overflow {
            operator: self.symbol(),
        })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
