//! Named predicates callable from condition expressions.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value as Json;

use super::Projection;
use crate::error::{EvalError, EvalResult};

/// A predicate receives its evaluated arguments and the projection.
pub type Predicate = Box<dyn Fn(&[Json], &Projection) -> EvalResult<Json> + Send + Sync>;

/// Lookup table from operator name to predicate.
///
/// Built once and owned by the evaluator. Operators in a condition that
/// are neither built into the expression language nor present here are
/// evaluation errors.
#[derive(Default)]
pub struct PredicateTable {
    predicates: BTreeMap<String, Predicate>,
}

impl fmt::Debug for PredicateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.predicates.keys()).finish()
    }
}

impl PredicateTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The domain predicates every story may use.
    ///
    /// | name | arguments | result |
    /// |---|---|---|
    /// | `hasItem` | item key | quantity > 0 |
    /// | `hasItems` | keys, as one array or several arguments | all held |
    /// | `itemCount` | item key | quantity, or 0 |
    /// | `hasVisitedNode` | node id | visited |
    /// | `hasStatusEffect` | effect type | active |
    /// | `walletBalance` | currency | balance, or 0 |
    pub fn standard() -> Self {
        Self::new()
            .with("hasItem", |args, p| {
                let key = string_arg("hasItem", args)?;
                Ok(Json::Bool(p.item_count(key) > 0))
            })
            .with("hasItems", |args, p| {
                let keys = match args {
                    [Json::Array(items)] => items.as_slice(),
                    _ => args,
                };
                let mut all = true;
                for key in keys {
                    let key = key
                        .as_str()
                        .ok_or_else(|| EvalError::bad_args("hasItems", "item keys must be strings"))?;
                    all &= p.item_count(key) > 0;
                }
                Ok(Json::Bool(all))
            })
            .with("itemCount", |args, p| {
                let key = string_arg("itemCount", args)?;
                Ok(Json::from(p.item_count(key)))
            })
            .with("hasVisitedNode", |args, p| {
                let id = string_arg("hasVisitedNode", args)?;
                Ok(Json::Bool(p.has_visited(id)))
            })
            .with("hasStatusEffect", |args, p| {
                let kind = string_arg("hasStatusEffect", args)?;
                Ok(Json::Bool(p.has_status_effect(kind)))
            })
            .with("walletBalance", |args, p| {
                let currency = string_arg("walletBalance", args)?;
                Ok(Json::from(p.wallet_balance(currency)))
            })
    }

    /// Add or replace a predicate.
    pub fn with<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&[Json], &Projection) -> EvalResult<Json> + Send + Sync + 'static,
    {
        self.register(name, predicate);
        self
    }

    /// Add or replace a predicate in place.
    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&[Json], &Projection) -> EvalResult<Json> + Send + Sync + 'static,
    {
        self.predicates.insert(name.into(), Box::new(predicate));
    }

    /// Whether a predicate with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.predicates.keys().map(String::as_str)
    }

    /// Call a predicate by name.
    pub fn call(&self, name: &str, args: &[Json], projection: &Projection) -> EvalResult<Json> {
        let predicate = self
            .predicates
            .get(name)
            .ok_or_else(|| EvalError::UnknownOperator(name.to_string()))?;
        predicate(args, projection)
    }
}

fn string_arg<'a>(op: &str, args: &'a [Json]) -> EvalResult<&'a str> {
    args.first()
        .and_then(Json::as_str)
        .ok_or_else(|| EvalError::bad_args(op, "expected a string argument"))
}
