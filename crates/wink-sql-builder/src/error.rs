//! Builder construction errors.

use crate::condition::ConditionOperator;

/// Errors raised while assembling a condition.
///
/// These are precondition failures: they surface when the condition is
/// built, never later when it is rendered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// A `match` condition needs a `(placeholder, value)` pair.
    #[error("match conditions take a (placeholder, value) pair")]
    InvalidMatchOperand,

    /// A range condition was not given exactly two bounds.
    #[error("range conditions take exactly two bounds, got {len}")]
    InvalidRange {
        /// Number of values supplied.
        len: usize,
    },

    /// A set-membership condition needs a value list or a subquery.
    #[error("'{operator}' takes a value list or a subquery")]
    InvalidListOperand {
        /// The offending operator.
        operator: ConditionOperator,
    },

    /// The operand does not fit the operator.
    #[error("operand does not fit operator '{operator}'")]
    InvalidOperand {
        /// The offending operator.
        operator: ConditionOperator,
    },
}

/// Result type for builder construction.
pub type Result<T> = std::result::Result<T, BuildError>;
