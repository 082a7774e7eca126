//! Exact decimal math expression parser/evaluator.
//!
//! Expressions use `+ - * /`, parentheses, decimal literals (optionally with an
//! exponent) and alphabetic variable names. Evaluation is done with
//! [`Decimal`], so `0.1 + 0.2` is exactly `0.3`.
//!
//! # Compile once, run many
//!
//! Parsing produces a [`CompiledExpression`]: the expression tree plus the
//! names of its variables in order of first appearance. Variables are resolved
//! to positions at parse time, so executing against new bindings never
//! re-parses or repeats name lookups in the tree.
//!
//! # Example
//!
//! ```rust
//! use decimal_expr::*;
//! use std::collections::HashMap;
//!
//! let compiled = parse("(a + b) / (a + c)").unwrap();
//! assert_eq!(compiled.variables(), ["a", "b", "c"]);
//!
//! let mut bindings = HashMap::new();
//! bindings.insert("a", Decimal::from(6));
//! bindings.insert("b", Decimal::new(39, 1));
//! bindings.insert("c", Decimal::new(49, 1));
//! let output = compiled.execute(&bindings).unwrap();
//! assert_eq!(output, Decimal::new(99, 1) / Decimal::new(109, 1));
//!
//! bindings.insert("c", Decimal::from(-6));
//! assert!(compiled.execute(&bindings).is_err());
//! ```
//!
//! # Precision
//!
//! Literals with an exponent (`1.5e3`) are read as `f64` and then converted,
//! so they can carry binary rounding error that plain literals don't.

mod error;
mod evaluate;
mod expression;
pub mod numeric;
mod operator;
mod parse;

use std::collections::HashMap;

pub use error::*;
pub use expression::*;
pub use numeric::is_numeric_type;
pub use operator::Operator;
pub use rust_decimal::Decimal;

/// Variable name to value map an expression is executed with.
pub type Bindings = HashMap<String, Decimal>;

/// Parse `text` into a reusable [`CompiledExpression`].
pub fn parse(text: &str) -> Result<CompiledExpression, SyntaxError> {
    CompiledExpression::parse(text)
}

/// Parse `text` into a function that evaluates it against any [`Bindings`].
pub fn compile(
    text: &str,
) -> Result<impl Fn(&Bindings) -> Result<Decimal, ExecuteError> + Clone + Send + Sync, SyntaxError>
{
    let compiled = CompiledExpression::parse(text)?;
    Ok(move |bindings: &Bindings| compiled.execute(bindings))
}

/// Parse and execute `text` in one step.
pub fn evaluate(text: &str, bindings: &Bindings) -> Result<Decimal, Error> {
    Ok(CompiledExpression::parse(text)?.execute(bindings)?)
}
