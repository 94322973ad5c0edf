//! The outcome of a single roll.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The result of rolling one formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollResult {
    /// Sum of the dice plus the modifier.
    pub total: i64,
    /// Each die as rolled, in order.
    pub rolls: Vec<u32>,
    /// Flat amount added to the dice.
    pub modifier: i64,
    /// The formula that was rolled, normalized (e.g. `1d20+2`).
    pub formula: String,
    /// Whether the roll met its difficulty. `None` when no difficulty was given
    /// and no critical applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// A natural 20 on a single d20.
    #[serde(default)]
    pub critical_success: bool,
    /// A natural 1 on a single d20.
    #[serde(default)]
    pub critical_failure: bool,
}

impl RollResult {
    /// Whether the roll counts as a success. Rolls without a difficulty never do.
    pub fn succeeded(&self) -> bool {
        self.success.unwrap_or(false)
    }

    /// Sum of the dice alone.
    pub fn natural(&self) -> i64 {
        self.rolls.iter().map(|r| i64::from(*r)).sum()
    }
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self.rolls.iter().map(u32::to_string).collect();
        write!(f, "{}: [{}] = {}", self.formula, values.join(", "), self.total)?;
        if self.critical_success {
            write!(f, " (critical success)")
        } else if self.critical_failure {
            write!(f, " (critical failure)")
        } else {
            match self.success {
                Some(true) => write!(f, " (success)"),
                Some(false) => write!(f, " (failure)"),
                None => Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(rolls: Vec<u32>, modifier: i64, success: Option<bool>) -> RollResult {
        let total = rolls.iter().map(|r| i64::from(*r)).sum::<i64>() + modifier;
        RollResult {
            total,
            rolls,
            modifier,
            formula: "2d6+1".to_string(),
            success,
            critical_success: false,
            critical_failure: false,
        }
    }

    #[test]
    fn natural_excludes_modifier() {
        let r = result(vec![3, 5], 1, None);
        assert_eq!(r.natural(), 8);
        assert_eq!(r.total, 9);
        assert!(!r.succeeded());
    }

    #[test]
    fn display() {
        assert_eq!(result(vec![3, 5], 1, None).to_string(), "2d6+1: [3, 5] = 9");
        assert_eq!(
            result(vec![6, 6], 1, Some(true)).to_string(),
            "2d6+1: [6, 6] = 13 (success)"
        );
        let mut crit = result(vec![20], 0, Some(true));
        crit.formula = "1d20".to_string();
        crit.critical_success = true;
        assert_eq!(crit.to_string(), "1d20: [20] = 20 (critical success)");
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(result(vec![4], 1, Some(false))).unwrap();
        assert_eq!(json["criticalSuccess"], false);
        assert_eq!(json["success"], false);
        assert_eq!(json["rolls"], serde_json::json!([4]));
    }
}
