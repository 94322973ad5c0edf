//! Error types for condition evaluation and effect application.

use cyoa_core::LogicError;
use thiserror::Error;

/// Result type for condition evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// Result type for effect application.
pub type EffectResult<T> = Result<T, EffectError>;

/// Errors raised while evaluating a condition expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The condition document never parsed.
    #[error("malformed condition: {0}")]
    Malformed(#[from] LogicError),

    /// The expression calls an operator that is neither built in nor registered.
    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    /// An operator received arguments it cannot work with.
    #[error("bad arguments to '{op}': {message}")]
    BadArguments {
        /// The operator name.
        op: String,
        /// What was wrong.
        message: String,
    },

    /// Division or remainder by zero.
    #[error("division by zero in '{0}'")]
    DivisionByZero(String),
}

impl EvalError {
    pub(crate) fn bad_args(op: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadArguments {
            op: op.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while applying an effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EffectError {
    /// The effect value has the wrong type for its target.
    #[error("invalid value for {kind} '{target}': expected a number, got {found}")]
    InvalidValue {
        /// The effect type.
        kind: String,
        /// The effect target.
        target: String,
        /// Type name of the value supplied.
        found: &'static str,
    },

    /// The operation cannot be applied to this target.
    #[error("cannot {operation} {kind} '{target}': {reason}")]
    InvalidOperation {
        /// The effect type.
        kind: String,
        /// The effect target.
        target: String,
        /// The operation requested.
        operation: String,
        /// Why it cannot be applied.
        reason: String,
    },
}
