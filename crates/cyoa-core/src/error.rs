//! Error types for the core crate.

/// Alias for `Result<T, LogicError>`.
pub type LogicResult<T> = Result<T, LogicError>;

/// Alias for `Result<T, StateError>`.
pub type StateResult<T> = Result<T, StateError>;

/// A condition expression could not be parsed into an [`Expr`](crate::Expr).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogicError {
    /// An operation object had no operator key.
    #[error("empty operation object")]
    EmptyOperation,

    /// An operation object had more than one key, so the operator is ambiguous.
    #[error("operation object has several keys: {}", .0.join(", "))]
    AmbiguousOperation(Vec<String>),

    /// An operator received the wrong number of arguments.
    #[error("operator '{op}' expects {expected} argument(s), got {found}")]
    Arity {
        /// The operator symbol.
        op: String,
        /// Human-readable description of the accepted argument count.
        expected: &'static str,
        /// The number of arguments actually supplied.
        found: usize,
    },
}

/// Errors raised while managing game state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The state violates an invariant. `field` names the first offending field.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Dotted path of the offending field (e.g. `stats.strength`).
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Two states cannot be merged because they belong to different saves.
    #[error("cannot merge states: {0}")]
    Conflict(String),

    /// The snapshot could not be converted to or from JSON.
    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StateError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The offending field, for validation errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use serde_json::json;

    use crate::logic::Expr;

    fn parse_error(doc: serde_json::Value) -> String {
        match Expr::parse(&doc) {
            Ok(expr) => panic!("parsed {expr:?}"),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn logic_error_messages() {
        let messages = [
            parse_error(json!({})),
            parse_error(json!({"and": [true], "or": [false]})),
            parse_error(json!({"!": [true, false]})),
            parse_error(json!({"if": [true, 1]})),
        ];
        assert_snapshot!(messages.join("\n"), @r"
        empty operation object
        operation object has several keys: and, or
        operator '!' expects exactly 1 argument(s), got 2
        operator 'if' expects exactly 3 argument(s), got 2
        ");
    }

    #[test]
    fn state_error_messages() {
        let invalid = super::StateError::invalid("stats.luck", "stat must be at least 1, got 0");
        assert_snapshot!(invalid.to_string(), @"invalid stats.luck: stat must be at least 1, got 0");
        assert_eq!(invalid.field(), Some("stats.luck"));

        let conflict = super::StateError::Conflict("player 'a' does not match 'b'".into());
        assert_snapshot!(conflict.to_string(), @"cannot merge states: player 'a' does not match 'b'");
        assert_eq!(conflict.field(), None);
    }
}
