use std::convert::Infallible;
use std::fmt;
use std::mem;

use rust_decimal::Decimal;

use crate::Operator;

/// A node of the parsed expression tree.
///
/// Chains like `1 + 2 + ... + n` nest one level per operator, so every walk
/// over the tree (evaluation, cloning, comparison, formatting and dropping)
/// uses an explicit stack instead of recursion.
pub enum Expression {
    // Constant.
    Literal(Decimal),

    // Input variable.
    Variable(VariableId),

    // Binary decimal ops.
    Binary(Operator, Box<Expression>, Box<Expression>),
}

/// Index into the positional argument vector an expression is evaluated with.
///
/// Ids are handed out in order of each variable's first occurrence in the
/// source text, so `b * a + b` binds `b` to 0 and `a` to 1.
pub type VariableId = usize;

enum Step<'e> {
    Visit(&'e Expression),
    Combine(Operator),
}

impl Expression {
    /// Post-order fold over the tree: leaves are mapped by `literal` and
    /// `variable`, then combined bottom-up by `combine`. Left operands are
    /// always folded before right ones.
    pub(crate) fn fold<T, E>(
        &self,
        mut literal: impl FnMut(Decimal) -> Result<T, E>,
        mut variable: impl FnMut(VariableId) -> Result<T, E>,
        mut combine: impl FnMut(Operator, T, T) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut steps = vec![Step::Visit(self)];
        let mut values = Vec::new();
        while let Some(step) = steps.pop() {
            match step {
                Step::Visit(Self::Literal(value)) => values.push(literal(*value)?),
                Step::Visit(Self::Variable(id)) => values.push(variable(*id)?),
                Step::Visit(Self::Binary(op, lhs, rhs)) => {
                    steps.push(Step::Combine(*op));
                    steps.push(Step::Visit(&**rhs));
                    steps.push(Step::Visit(&**lhs));
                }
                Step::Combine(op) => {
                    let (Some(rhs), Some(lhs)) = (values.pop(), values.pop()) else {
                        unreachable!("binary node folded without two operands");
                    };
                    values.push(combine(op, lhs, rhs)?);
                }
            }
        }
        let Some(value) = values.pop() else {
            unreachable!("fold produced no value");
        };
        Ok(value)
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, debug: bool) -> fmt::Result {
        enum Piece<'e> {
            Node(&'e Expression),
            Operator(Operator),
            Text(&'static str),
        }

        let mut pieces = vec![Piece::Node(self)];
        while let Some(piece) = pieces.pop() {
            match piece {
                Piece::Text(text) => f.write_str(text)?,
                Piece::Operator(op) if debug => write!(f, "{op:?}, ")?,
                Piece::Operator(op) => write!(f, " {op} ")?,
                Piece::Node(Self::Literal(value)) if debug => write!(f, "Literal({value:?})")?,
                Piece::Node(Self::Literal(value)) => write!(f, "{value}")?,
                Piece::Node(Self::Variable(id)) if debug => write!(f, "Variable({id})")?,
                Piece::Node(Self::Variable(id)) => write!(f, "${id}")?,
                Piece::Node(Self::Binary(op, lhs, rhs)) if debug => {
                    f.write_str("Binary(")?;
                    pieces.push(Piece::Text(")"));
                    pieces.push(Piece::Node(&**rhs));
                    pieces.push(Piece::Text(", "));
                    pieces.push(Piece::Node(&**lhs));
                    pieces.push(Piece::Operator(*op));
                }
                Piece::Node(Self::Binary(op, lhs, rhs)) => {
                    f.write_str("(")?;
                    pieces.push(Piece::Text(")"));
                    pieces.push(Piece::Node(&**rhs));
                    pieces.push(Piece::Operator(*op));
                    pieces.push(Piece::Node(&**lhs));
                }
            }
        }
        Ok(())
    }
}

impl Clone for Expression {
    fn clone(&self) -> Self {
        let cloned: Result<Self, Infallible> = self.fold(
            |value| Ok(Self::Literal(value)),
            |id| Ok(Self::Variable(id)),
            |op, lhs, rhs| Ok(op.apply(lhs, rhs)),
        );
        match cloned {
            Ok(expression) => expression,
            Err(never) => match never {},
        }
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        let mut pairs = vec![(self, other)];
        while let Some(pair) = pairs.pop() {
            match pair {
                (Self::Literal(a), Self::Literal(b)) if a == b => {}
                (Self::Variable(a), Self::Variable(b)) if a == b => {}
                (Self::Binary(op_a, lhs_a, rhs_a), Self::Binary(op_b, lhs_b, rhs_b))
                    if op_a == op_b =>
                {
                    pairs.push((&**rhs_a, &**rhs_b));
                    pairs.push((&**lhs_a, &**lhs_b));
                }
                _ => return false,
            }
        }
        true
    }
}

impl Drop for Expression {
    fn drop(&mut self) {
        let Self::Binary(_, lhs, rhs) = self else {
            return;
        };
        if !matches!(**lhs, Self::Binary(..)) && !matches!(**rhs, Self::Binary(..)) {
            return;
        }
        // Detach children so each box is freed with only leaves below it.
        let mut detached = vec![detach(lhs), detach(rhs)];
        while let Some(mut node) = detached.pop() {
            if let Self::Binary(_, lhs, rhs) = &mut node {
                detached.push(detach(lhs));
                detached.push(detach(rhs));
            }
        }
    }
}

fn detach(node: &mut Expression) -> Expression {
    mem::replace(node, Expression::Literal(Decimal::ZERO))
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, true)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, false)
    }
}

/// The parser's output: an expression tree paired with the ordered names of
/// the variables it reads.
///
/// Immutable once built. It holds no bound values, so one instance can be
/// executed any number of times, from any number of threads.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledExpression {
    pub(crate) root: Expression,
    pub(crate) variables: Vec<String>,
}

impl CompiledExpression {
    pub(crate) fn new(root: Expression, variables: Vec<String>) -> Self {
        Self { root, variables }
    }

    /// The value of an empty expression.
    pub fn zero() -> Self {
        Self::new(Expression::Literal(Decimal::ZERO), Vec::new())
    }

    pub fn root(&self) -> &Expression {
        &self.root
    }

    /// Variable names in first-occurrence order. Position `i` in this list is
    /// [`VariableId`] `i`.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

impl fmt::Display for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root, f)
    }
}
