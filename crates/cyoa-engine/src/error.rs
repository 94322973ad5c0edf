//! Error types for story loading and navigation.

use std::fmt;
use std::path::PathBuf;

use cyoa_core::StateError;
use cyoa_mechanics::DiceError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised while loading a story document.
#[derive(Debug, Error)]
pub enum StoryError {
    /// The file could not be read.
    #[error("cannot read story file {}: {source}", path.display())]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The document is not a valid story.
    #[error("invalid story document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised by the story navigator.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A referenced node does not exist.
    #[error("node not found: {0}")]
    NotFound(String),

    /// The choice index is outside the node's choice list.
    #[error("invalid choice index {index}: node has {len} choice(s)")]
    InvalidChoice {
        /// The index requested.
        index: usize,
        /// How many choices the node has.
        len: usize,
    },

    /// At least one condition on the choice does not hold.
    #[error("choice conditions not met (failed: {failed:?})")]
    ConditionsNotMet {
        /// Indices of the failing conditions.
        failed: Vec<usize>,
    },

    /// A roll requirement names a stat the player does not have.
    #[error("unknown stat: {0}")]
    UnknownStat(String),

    /// The current node is an ending; no choices can be made.
    #[error("node '{0}' is an ending")]
    AtEnding(String),

    /// The game state is invalid or could not be converted.
    #[error(transparent)]
    State(#[from] StateError),

    /// A dice formula could not be rolled.
    #[error(transparent)]
    Dice(#[from] DiceError),

    /// The story document could not be loaded.
    #[error(transparent)]
    Story(#[from] StoryError),
}

/// How a caller should treat an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Something referenced does not exist.
    NotFound,
    /// The request itself is malformed.
    InvalidInput,
    /// The request is well-formed but the game state does not allow it.
    PreconditionFailed,
    /// A fault outside the caller's control.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::InvalidInput => write!(f, "invalid input"),
            Self::PreconditionFailed => write!(f, "precondition failed"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

impl EngineError {
    /// The category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::InvalidChoice { .. } | Self::Dice(_) => ErrorCategory::InvalidInput,
            Self::ConditionsNotMet { .. } | Self::UnknownStat(_) | Self::AtEnding(_) => {
                ErrorCategory::PreconditionFailed
            }
            Self::State(StateError::Serialization(_)) => ErrorCategory::InvalidInput,
            Self::State(_) => ErrorCategory::PreconditionFailed,
            Self::Story(StoryError::Parse(_)) => ErrorCategory::InvalidInput,
            Self::Story(StoryError::Io { .. }) => ErrorCategory::Internal,
        }
    }
}
