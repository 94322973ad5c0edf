//! Rules for the CYOA engine: condition evaluation and effect application.
//!
//! [`ConditionEvaluator`] decides whether a choice is available by
//! evaluating its JSON-logic conditions against a read-only projection of
//! the game state. It fails closed: any evaluation error makes the
//! condition false. [`EffectProcessor`] applies wallet, inventory, stat,
//! flag, and status-effect mutations while holding the state invariants.

pub mod condition;
pub mod effect;
pub mod error;

pub use condition::{Availability, ConditionEvaluator, FailedCondition, PredicateTable, Projection};
pub use effect::{EffectProcessor, Rounding};
pub use error::{EffectError, EffectResult, EvalError, EvalResult};
