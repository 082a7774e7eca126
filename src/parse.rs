use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

use num_traits::FromPrimitive;
use rust_decimal::Decimal;

use crate::{CompiledExpression, Expression, Operator, SyntaxError};

impl CompiledExpression {
    /// Parse the expression from `input`.
    ///
    /// The text is scanned once, left to right. Variable names are replaced by
    /// [`VariableId`](crate::VariableId)s as they are first encountered, which
    /// allows the [`CompiledExpression`] to be efficiently reused with many
    /// different bindings. Empty or all-whitespace input parses as `0`.
    pub fn parse(input: &str) -> Result<Self, SyntaxError> {
        if input.trim().is_empty() {
            return Ok(Self::zero());
        }
        let compiled = Parser::new(input).run()?;
        log::trace!(
            "compiled {input:?} with variables {:?}",
            compiled.variables()
        );
        Ok(compiled)
    }
}

impl FromStr for CompiledExpression {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Entry of the operator stack.
#[derive(Clone, Copy, Debug)]
enum Pending {
    Operator(Operator),
    OpenParenthesis,
}

/// Shunting-yard state for a single parse.
struct Parser<'a> {
    chars: Peekable<CharIndices<'a>>,
    operands: Vec<Expression>,
    operators: Vec<Pending>,
    variables: Vec<String>,
    // Last non-whitespace character consumed.
    previous: Option<char>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            operands: Vec::new(),
            operators: Vec::new(),
            variables: Vec::new(),
            previous: None,
        }
    }

    fn run(mut self) -> Result<CompiledExpression, SyntaxError> {
        while let Some(&(offset, next)) = self.chars.peek() {
            if next.is_ascii_digit() {
                let literal = self.read_literal(None)?;
                self.operands.push(literal);
            } else if next.is_alphabetic() {
                let variable = self.read_variable();
                self.operands.push(variable);
            } else if let Some(op) = Operator::from_symbol(next) {
                self.chars.next();
                if self.starts_signed_literal(op) {
                    let literal = self.read_literal(Some((op, offset)))?;
                    self.operands.push(literal);
                    continue;
                }
                // Left-associative: equal precedence reduces the pending operator first.
                self.reduce_while(|top| top.precedence() >= op.precedence())?;
                self.operators.push(Pending::Operator(op));
                self.previous = Some(next);
            } else if next == '(' {
                self.chars.next();
                self.operators.push(Pending::OpenParenthesis);
                self.previous = Some(next);
            } else if next == ')' {
                self.chars.next();
                self.reduce_while(|_| true)?;
                match self.operators.pop() {
                    Some(Pending::OpenParenthesis) => {}
                    _ => return Err(SyntaxError::UnmatchedClosingParenthesis { offset }),
                }
                self.previous = Some(next);
            } else if next.is_whitespace() {
                self.chars.next();
            } else {
                return Err(SyntaxError::InvalidCharacter {
                    character: next,
                    offset,
                });
            }
        }

        while let Some(pending) = self.operators.pop() {
            match pending {
                Pending::Operator(op) => self.reduce(op)?,
                Pending::OpenParenthesis => return Err(SyntaxError::UnclosedParenthesis),
            }
        }

        let root = self.operands.pop().ok_or(SyntaxError::EmptyExpression)?;
        if !self.operands.is_empty() {
            return Err(SyntaxError::MissingOperator);
        }
        Ok(CompiledExpression::new(root, self.variables))
    }

    /// A `+` or `-` belongs to the literal after it only when it directly
    /// precedes a digit at the start of the expression or after `*`, `/` or `(`.
    fn starts_signed_literal(&mut self, op: Operator) -> bool {
        matches!(op, Operator::Add | Operator::Sub)
            && matches!(self.chars.peek(), Some((_, c)) if c.is_ascii_digit())
            && matches!(self.previous, None | Some('*' | '/' | '('))
    }

    fn reduce_while(&mut self, condition: impl Fn(Operator) -> bool) -> Result<(), SyntaxError> {
        while let Some(&Pending::Operator(top)) = self.operators.last() {
            if !condition(top) {
                break;
            }
            self.operators.pop();
            self.reduce(top)?;
        }
        Ok(())
    }

    fn reduce(&mut self, op: Operator) -> Result<(), SyntaxError> {
        let rhs = self.operands.pop();
        let lhs = self.operands.pop();
        match (lhs, rhs) {
            (Some(lhs), Some(rhs)) => {
                self.operands.push(op.apply(lhs, rhs));
                Ok(())
            }
            _ => Err(SyntaxError::MissingOperand {
                operator: op.symbol(),
            }),
        }
    }

    /// Reads a numeric literal, optionally preceded by an already consumed
    /// sign operator and its offset.
    fn read_literal(&mut self, sign: Option<(Operator, usize)>) -> Result<Expression, SyntaxError> {
        let negative = matches!(sign, Some((Operator::Sub, _)));
        let mut literal = String::new();
        let mut start = sign.map(|(_, offset)| offset);
        while let Some(&(offset, next)) = self.chars.peek() {
            let exponent_sign =
                matches!(next, '+' | '-') && literal.ends_with(|c: char| c == 'e' || c == 'E');
            if !(next.is_ascii_digit() || matches!(next, '.' | 'e' | 'E') || exponent_sign) {
                break;
            }
            start.get_or_insert(offset);
            literal.push(next);
            self.chars.next();
        }
        self.previous = literal.chars().last();

        let value = if literal.contains(|c: char| c == 'e' || c == 'E') {
            // Exponent literals go through f64, so they may carry binary rounding error.
            literal
                .parse::<f64>()
                .ok()
                .map(|value| if negative { -value } else { value })
                .and_then(Decimal::from_f64)
        } else {
            Decimal::from_str(&literal)
                .ok()
                .map(|value| if negative { -value } else { value })
        };
        value
            .map(Expression::Literal)
            .ok_or_else(|| SyntaxError::InvalidLiteral {
                literal: match sign {
                    Some((op, _)) => format!("{op}{literal}"),
                    None => literal,
                },
                offset: start.unwrap_or_default(),
            })
    }

    fn read_variable(&mut self) -> Expression {
        let mut name = String::new();
        while let Some(&(_, next)) = self.chars.peek() {
            if !next.is_alphabetic() {
                break;
            }
            name.push(next);
            self.chars.next();
        }
        self.previous = name.chars().last();

        let id = match self.variables.iter().position(|v| *v == name) {
            Some(id) => id,
            None => {
                self.variables.push(name);
                self.variables.len() - 1
            }
        };
        Expression::Variable(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn tree(input: &str) -> String {
        CompiledExpression::parse(input).unwrap().to_string()
    }

    #[test]
    fn variables_in_first_occurrence_order() {
        let parsed = CompiledExpression::parse("b * a + b - c / a").unwrap();
        assert_eq!(parsed.variables(), ["b", "a", "c"]);
        assert_eq!(parsed.to_string(), "((($0 * $1) + $0) - ($2 / $1))");
    }

    #[test]
    fn unicode_letters_are_identifiers() {
        let parsed = CompiledExpression::parse("größe * π").unwrap();
        assert_eq!(parsed.variables(), ["größe", "π"]);
    }

    #[rstest]
    #[case("1 * 2 + 3 * 4", "((1 * 2) + (3 * 4))")]
    #[case("8 / 4 * 3", "((8 / 4) * 3)")]
    #[case("8 - 4 - 3", "((8 - 4) - 3)")]
    #[case("2 * (5 + 3)", "(2 * (5 + 3))")]
    #[case("((7))", "7")]
    #[case("2.50", "2.50")]
    fn precedence_and_associativity(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(tree(input), expected);
    }

    #[rstest]
    #[case("-5", "-5")]
    #[case("+5", "5")]
    #[case("2*-3", "(2 * -3)")]
    #[case("2 / -3", "(2 / -3)")]
    #[case("(-5+2)", "(-5 + 2)")]
    #[case("5-2", "(5 - 2)")]
    #[case("a-2", "($0 - 2)")]
    #[case("(1)-2", "(1 - 2)")]
    fn sign_literals(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(tree(input), expected);
    }

    #[rstest]
    #[case("1e3", dec!(1000))]
    #[case("2.5E-1", dec!(0.25))]
    #[case("-1e+2", dec!(-100))]
    fn exponent_literals(#[case] input: &str, #[case] expected: Decimal) {
        let parsed = CompiledExpression::parse(input).unwrap();
        assert_eq!(parsed.root(), &Expression::Literal(expected));
    }

    #[rstest]
    #[case("", "0")]
    #[case("   \t", "0")]
    fn blank_is_zero(#[case] input: &str, #[case] expected: &str) {
        let parsed = CompiledExpression::parse(input).unwrap();
        assert!(parsed.variables().is_empty());
        assert_eq!(parsed.to_string(), expected);
    }

    #[rstest]
    #[case("2^3", SyntaxError::InvalidCharacter { character: '^', offset: 1 })]
    #[case("1 + .5", SyntaxError::InvalidCharacter { character: '.', offset: 4 })]
    #[case("(2+3", SyntaxError::UnclosedParenthesis)]
    #[case("2+3)", SyntaxError::UnmatchedClosingParenthesis { offset: 3 })]
    #[case("2 +", SyntaxError::MissingOperand { operator: '+' })]
    #[case("- 3", SyntaxError::MissingOperand { operator: '-' })]
    #[case("-a", SyntaxError::MissingOperand { operator: '-' })]
    #[case("2 3", SyntaxError::MissingOperator)]
    #[case("a1", SyntaxError::MissingOperator)]
    #[case("2(3)", SyntaxError::MissingOperator)]
    #[case("()", SyntaxError::EmptyExpression)]
    fn syntax_errors(#[case] input: &str, #[case] expected: SyntaxError) {
        assert_eq!(CompiledExpression::parse(input), Err(expected));
    }

    #[rstest]
    #[case("1.2.3", "1.2.3", 0)]
    #[case("4 * 2e", "2e", 4)]
    #[case("1e999", "1e999", 0)]
    #[case("2*-1.2.3", "-1.2.3", 2)]
    #[case("+1.2.3", "+1.2.3", 0)]
    #[case("( -4e", "-4e", 2)]
    fn invalid_literals(#[case] input: &str, #[case] literal: &str, #[case] offset: usize) {
        assert_eq!(
            CompiledExpression::parse(input),
            Err(SyntaxError::InvalidLiteral {
                literal: literal.into(),
                offset
            })
        );
    }

    #[test]
    fn from_str_parses() {
        let parsed: CompiledExpression = "x / 2".parse().unwrap();
        assert_eq!(parsed.variables(), ["x"]);
    }

    #[test]
    fn long_chain_parses_left_deep() {
        let text = vec!["1"; 100_000].join("+");
        let parsed = CompiledExpression::parse(&text).unwrap();
        let Expression::Binary(Operator::Add, lhs, rhs) = parsed.root() else {
            panic!("expected an addition at the root");
        };
        assert!(matches!(**lhs, Expression::Binary(Operator::Add, ..)));
        assert_eq!(**rhs, Expression::Literal(Decimal::ONE));
        assert_eq!(parsed.clone(), parsed);
    }

    #[test]
    fn deep_parentheses_parse() {
        let text = "(".repeat(50_000) + "1" + &")".repeat(50_000);
        let parsed = CompiledExpression::parse(&text).unwrap();
        assert_eq!(parsed.root(), &Expression::Literal(Decimal::ONE));

        let unclosed = "(".repeat(50_000) + "1" + &")".repeat(49_999);
        assert_eq!(
            CompiledExpression::parse(&unclosed),
            Err(SyntaxError::UnclosedParenthesis)
        );
    }

    #[test]
    fn deep_right_nesting_parses() {
        let text = "(1-".repeat(50_000) + "1" + &")".repeat(50_000);
        let parsed = CompiledExpression::parse(&text).unwrap();
        assert!(parsed.to_string().starts_with("(1 - (1 - (1 - "));
    }
}
