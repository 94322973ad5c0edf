//! Error types for dice mechanics.

/// Errors raised while parsing or rolling dice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiceError {
    /// The formula does not match `XdY`, `XdY+Z`, or `XdY-Z`.
    #[error("invalid dice formula: '{0}'")]
    Format(String),

    /// The formula or arguments are well-formed but out of range.
    #[error("invalid dice parameters: {0}")]
    Range(String),

    /// A random element was requested from an empty list.
    #[error("cannot pick a random element from an empty list")]
    EmptyInput,
}

/// Convenience result type for dice operations.
pub type DiceResult<T> = Result<T, DiceError>;
