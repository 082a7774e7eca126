use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

use rust_decimal::Decimal;

use crate::{ArgumentError, CompiledExpression, ExecuteError, Expression};

#[cfg(feature = "rayon")]
use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};

impl CompiledExpression {
    /// Calculates the value of the expression with `bindings` substituted for
    /// its variables.
    ///
    /// `bindings` must name exactly the variables of the expression: any extra
    /// or missing name is an [`ArgumentError`].
    pub fn execute<K, S>(&self, bindings: &HashMap<K, Decimal, S>) -> Result<Decimal, ExecuteError>
    where
        K: Borrow<str> + Eq + Hash,
        S: BuildHasher,
    {
        let arguments = self.bind(bindings)?;
        self.root.evaluate(&arguments)
    }

    /// Calculates the value of the expression from an argument vector that is
    /// already laid out in [`variables`](Self::variables) order.
    pub fn execute_positional(&self, arguments: &[Decimal]) -> Result<Decimal, ExecuteError> {
        if arguments.len() != self.variables.len() {
            return Err(ArgumentError::ArgumentCount {
                expected: self.variables.len(),
                supplied: arguments.len(),
            }
            .into());
        }
        self.root.evaluate(arguments)
    }

    /// Executes the expression once per entry of `batch`, in order.
    pub fn execute_many<K, S>(
        &self,
        batch: &[HashMap<K, Decimal, S>],
    ) -> Vec<Result<Decimal, ExecuteError>>
    where
        K: Borrow<str> + Eq + Hash + Sync,
        S: BuildHasher + Sync,
    {
        #[cfg(feature = "rayon")]
        {
            batch
                .par_iter()
                .map(|bindings| self.execute(bindings))
                .collect()
        }
        #[cfg(not(feature = "rayon"))]
        {
            batch
                .iter()
                .map(|bindings| self.execute(bindings))
                .collect()
        }
    }

    /// Lays out `bindings` as the positional argument vector the expression
    /// tree reads [`Expression::Variable`]s from.
    pub fn bind<K, S>(&self, bindings: &HashMap<K, Decimal, S>) -> Result<Vec<Decimal>, ArgumentError>
    where
        K: Borrow<str> + Eq + Hash,
        S: BuildHasher,
    {
        if bindings.len() != self.variables.len() {
            return Err(ArgumentError::CountMismatch {
                expected: self.variables.len(),
                supplied: bindings.len(),
            });
        }

        let mut arguments = Vec::with_capacity(self.variables.len());
        let mut missing = Vec::new();
        for name in &self.variables {
            match bindings.get(name.as_str()) {
                Some(value) => arguments.push(*value),
                None => missing.push(name.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(ArgumentError::MissingVariables(missing));
        }
        Ok(arguments)
    }
}

impl Expression {
    /// Evaluates the tree bottom-up, reading variables from `arguments`.
    ///
    /// A [`VariableId`](crate::VariableId) past the end of `arguments` is an
    /// [`ArgumentError::VariableOutOfRange`].
    pub fn evaluate(&self, arguments: &[Decimal]) -> Result<Decimal, ExecuteError> {
        self.fold(
            |value| Ok(value),
            |id| {
                arguments.get(id).copied().ok_or_else(|| {
                    ExecuteError::from(ArgumentError::VariableOutOfRange {
                        id,
                        supplied: arguments.len(),
                    })
                })
            },
            |op, lhs, rhs| Ok(op.combine(lhs, rhs)?),
        )
    }
}
