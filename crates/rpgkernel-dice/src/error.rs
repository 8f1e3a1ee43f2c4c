//! Error taxonomy for dice parsing and resolution.

use thiserror::Error;

/// Errors produced while parsing or rolling a dice expression.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiceError {
    /// The expression was empty or whitespace-only.
    #[error("dice expression is empty")]
    EmptyExpression,

    /// The expression did not match `NdM`, `NdM+K`, or `NdM-K`.
    #[error("malformed dice expression: {0:?}")]
    MalformedExpression(String),

    /// The die count or side count parsed to zero or a negative value.
    #[error("dice expression {0:?} has a non-positive count or side count")]
    NonPositiveTerm(String),

    /// The die count exceeded the kernel's sanity ceiling.
    #[error("dice expression {0:?} requests too many dice (max {max})", max = Self::MAX_DICE)]
    TooManyDice(String),
}

impl DiceError {
    /// Upper bound on the number of dice a single expression may request.
    pub const MAX_DICE: u32 = 1000;
}
