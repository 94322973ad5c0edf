//! Condition evaluation.
//!
//! A [`Condition`] is evaluated against a [`Projection`] of the game
//! state. Custom operators resolve through the evaluator's
//! [`PredicateTable`]. Evaluation fails closed: [`ConditionEvaluator::evaluate`]
//! turns every error into `false` and logs it.

mod eval;
mod predicates;
mod projection;

pub use predicates::{Predicate, PredicateTable};
pub use projection::Projection;

use cyoa_core::{Condition, GameState};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::EvalResult;

/// Whether a set of conditions passes, and which ones did not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    /// True when every condition passed.
    pub available: bool,
    /// The conditions that did not pass, in order.
    pub failed_conditions: Vec<FailedCondition>,
}

impl Availability {
    /// Indices of the failed conditions.
    pub fn failed_indices(&self) -> Vec<usize> {
        self.failed_conditions.iter().map(|f| f.index).collect()
    }
}

/// A condition that did not pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedCondition {
    /// Position of the condition in its list.
    pub index: usize,
    /// The condition document as authored.
    pub logic: Json,
}

/// Evaluates conditions against game states.
#[derive(Debug)]
pub struct ConditionEvaluator {
    predicates: PredicateTable,
}

impl Default for ConditionEvaluator {
    fn default() -> Self {
        Self::new(PredicateTable::standard())
    }
}

impl ConditionEvaluator {
    /// An evaluator using the given predicate table.
    pub fn new(predicates: PredicateTable) -> Self {
        Self { predicates }
    }

    /// The predicate table in use.
    pub fn predicates(&self) -> &PredicateTable {
        &self.predicates
    }

    /// Evaluate one condition. Errors count as `false`.
    pub fn evaluate(&self, condition: &Condition, state: &GameState) -> bool {
        self.evaluate_in(condition, &Projection::new(state))
    }

    /// Evaluate one condition, reporting why it could not be evaluated.
    pub fn try_evaluate(&self, condition: &Condition, state: &GameState) -> EvalResult<bool> {
        self.try_evaluate_in(condition, &Projection::new(state))
    }

    /// True when every condition holds, including when there are none.
    pub fn evaluate_all(&self, conditions: &[Condition], state: &GameState) -> bool {
        let projection = Projection::new(state);
        conditions.iter().all(|c| self.evaluate_in(c, &projection))
    }

    /// True when any condition holds, or when there are none.
    pub fn evaluate_any(&self, conditions: &[Condition], state: &GameState) -> bool {
        if conditions.is_empty() {
            return true;
        }
        let projection = Projection::new(state);
        conditions.iter().any(|c| self.evaluate_in(c, &projection))
    }

    /// Evaluate every condition and list the ones that fail.
    pub fn check_availability(&self, conditions: &[Condition], state: &GameState) -> Availability {
        let projection = Projection::new(state);
        let failed_conditions: Vec<FailedCondition> = conditions
            .iter()
            .enumerate()
            .filter(|(_, c)| !self.evaluate_in(c, &projection))
            .map(|(index, c)| FailedCondition {
                index,
                logic: c.logic().clone(),
            })
            .collect();
        Availability {
            available: failed_conditions.is_empty(),
            failed_conditions,
        }
    }

    fn evaluate_in(&self, condition: &Condition, projection: &Projection) -> bool {
        match self.try_evaluate_in(condition, projection) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Condition evaluation error: {e} in {}", condition.logic());
                false
            }
        }
    }

    fn try_evaluate_in(&self, condition: &Condition, projection: &Projection) -> EvalResult<bool> {
        let expr = condition.expr().map_err(|e| e.clone())?;
        let scope = eval::Scope {
            data: projection,
            predicates: &self.predicates,
        };
        Ok(eval::truthy(&scope.eval(expr)?))
    }
}
