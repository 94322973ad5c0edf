//! Configuration for a story navigator.

use std::collections::BTreeMap;

use cyoa_core::state::{DEFAULT_STAT_NAMES, DEFAULT_STAT_VALUE};
use cyoa_rules::Rounding;
use serde::{Deserialize, Serialize};

/// Tunable rules for a navigator.
///
/// Every field has a default, so a config document only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Stats a new player starts with.
    pub default_stats: BTreeMap<String, i64>,
    /// Dice rolled for a roll requirement that names no formula.
    pub check_formula: String,
    /// How fractional effect results are rounded.
    pub rounding: Rounding,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_stats: DEFAULT_STAT_NAMES
                .iter()
                .map(|name| (name.to_string(), DEFAULT_STAT_VALUE))
                .collect(),
            check_formula: "1d20".to_string(),
            rounding: Rounding::default(),
        }
    }
}

impl EngineConfig {
    /// Replace the starting stats.
    pub fn with_default_stats(mut self, stats: BTreeMap<String, i64>) -> Self {
        self.default_stats = stats;
        self
    }

    /// Add or override one starting stat.
    pub fn with_stat(mut self, name: impl Into<String>, value: i64) -> Self {
        self.default_stats.insert(name.into(), value);
        self
    }

    /// Set the default check formula.
    pub fn with_check_formula(mut self, formula: impl Into<String>) -> Self {
        self.check_formula = formula.into();
        self
    }

    /// Set the rounding rule.
    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }
}
