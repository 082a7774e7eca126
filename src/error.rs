use thiserror::Error;

/// Malformed expression text, reported by the parser.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("encountered invalid character '{character}' at offset {offset}")]
    InvalidCharacter { character: char, offset: usize },
    #[error("invalid numeric literal '{literal}' at offset {offset}")]
    InvalidLiteral { literal: String, offset: usize },
    #[error("unmatched ')' at offset {offset}")]
    UnmatchedClosingParenthesis { offset: usize },
    #[error("unclosed '(' at end of expression")]
    UnclosedParenthesis,
    #[error("operator '{operator}' is missing an operand")]
    MissingOperand { operator: char },
    #[error("expected an operator between two operands")]
    MissingOperator,
    #[error("expression has no value")]
    EmptyExpression,
}

/// The supplied bindings don't match the variables an expression requires.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("expression contains {expected} variables but got {supplied} bindings")]
    CountMismatch { expected: usize, supplied: usize },
    #[error("no values provided for variables: {}", .0.join(","))]
    MissingVariables(Vec<String>),
    #[error("expression expects {expected} positional arguments but got {supplied}")]
    ArgumentCount { expected: usize, supplied: usize },
    #[error("variable ${id} is out of range for {supplied} arguments")]
    VariableOutOfRange { id: usize, supplied: usize },
}

/// Exact decimal arithmetic failed.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("attempted to divide by zero")]
    DivisionByZero,
    #[error("decimal overflow while applying '{operator}'")]
    Overflow { operator: char },
}

/// Failure while executing an already parsed expression.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExecuteError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

/// Any failure of a one-shot [`evaluate`](crate::evaluate) call.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

impl From<ExecuteError> for Error {
    fn from(error: ExecuteError) -> Self {
        match error {
            ExecuteError::Argument(e) => Self::Argument(e),
            ExecuteError::Arithmetic(e) => Self::Arithmetic(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variables_are_listed_in_order() {
        let error = ArgumentError::MissingVariables(vec!["b".into(), "a".into()]);
        assert_eq!(error.to_string(), "no values provided for variables: b,a");
    }

    #[test]
    fn execute_error_flattens_into_error() {
        let error: Error = ExecuteError::from(ArithmeticError::DivisionByZero).into();
        assert_eq!(error, Error::Arithmetic(ArithmeticError::DivisionByZero));
        assert_eq!(error.to_string(), "attempted to divide by zero");
    }
}
