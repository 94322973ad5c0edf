//! Core types for the CYOA rules engine.
//!
//! This crate defines the data the engine works on: the per-save
//! [`GameState`], the authored story content ([`Node`], [`Choice`],
//! [`Effect`], [`Condition`], [`RollRequirement`]), the condition
//! mini-language in [`logic`], and the [`StateManager`] that creates,
//! validates, snapshots, and merges game states.

/// Time sources for timestamping state changes.
pub mod clock;
/// Error types used throughout the crate.
pub mod error;
/// The condition expression language (JSON-logic dialect).
pub mod logic;
/// Game state and its lifecycle management.
pub mod state;
/// Authored story content consumed by the engine.
pub mod story;
/// Scalar values stored in flags and carried by effects.
pub mod value;

/// Re-export clock types.
pub use clock::{Clock, FixedClock, SystemClock};
/// Re-export error types.
pub use error::{LogicError, LogicResult, StateError, StateResult};
/// Re-export the expression AST.
pub use logic::Expr;
/// Re-export game state types.
pub use state::{ChoiceRecord, GameState, StateManager, StatusEffect};
/// Re-export story content types.
pub use story::{Choice, Condition, Effect, EffectKind, EffectMetadata, Node, Operation, RollRequirement};
/// Re-export the value type.
pub use value::Value;
