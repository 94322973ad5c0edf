//! Story navigation for the CYOA rules engine.
//!
//! [`StoryNavigator`] ties the other crates together: it gates choices with
//! the condition evaluator, rolls the dice checks attached to a choice,
//! applies effects to a clone of the state, and records the move. Stories
//! come from any [`StorySource`]; [`Story`] is the in-memory JSON one.

pub mod config;
pub mod error;
pub mod lint;
pub mod navigator;
pub mod source;
pub mod story;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult, ErrorCategory, StoryError};
pub use lint::{LintIssue, LintReport, Severity};
pub use navigator::{ChoiceView, NewGame, Progress, StateTransition, StoryNavigator};
pub use source::StorySource;
pub use story::Story;
