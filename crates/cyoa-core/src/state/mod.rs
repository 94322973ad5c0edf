//! Per-save game state.

mod manager;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::Value;

pub use manager::StateManager;

/// Stats every new game starts with.
pub const DEFAULT_STAT_NAMES: [&str; 5] = ["knowledge", "dexterity", "charisma", "strength", "luck"];

/// Starting value of each default stat, and the base value of a stat touched for the first time.
pub const DEFAULT_STAT_VALUE: i64 = 10;

/// Lowest value a stat may hold.
pub const MIN_STAT: i64 = 1;

/// Lowest balance a wallet may hold.
pub const MIN_WALLET: i64 = 0;

/// The complete progress record of one player's playthrough of one story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// The player who owns this save.
    #[serde(alias = "userId")]
    pub player_id: String,
    /// The story being played.
    pub story_id: String,
    /// The save slot.
    pub save_id: String,
    /// Where the player is now.
    pub current_node_id: String,
    /// Every node reached so far, in first-visit order, without duplicates.
    #[serde(default)]
    pub visited_nodes: Vec<String>,
    /// One entry per transition made.
    #[serde(default)]
    pub choices_history: Vec<ChoiceRecord>,
    /// Player stats, each at least [`MIN_STAT`].
    #[serde(default)]
    pub stats: BTreeMap<String, i64>,
    /// Currency balances, each at least [`MIN_WALLET`].
    #[serde(default)]
    pub wallets: BTreeMap<String, i64>,
    /// Item quantities. Items the player does not hold are absent.
    #[serde(default)]
    pub inventory: BTreeMap<String, i64>,
    /// Open-ended story variables.
    #[serde(default)]
    pub flags: BTreeMap<String, Value>,
    /// Active status effects, at most one per type.
    #[serde(default)]
    pub status_effects: Vec<StatusEffect>,
    /// When the save was created.
    pub created_at: DateTime<Utc>,
    /// When the save last changed.
    pub updated_at: DateTime<Utc>,
    /// Seed for replayable dice rolls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
}

impl GameState {
    /// A stat's value, if the player has it.
    pub fn stat(&self, name: &str) -> Option<i64> {
        self.stats.get(name).copied()
    }

    /// A currency balance; absent currencies read as 0.
    pub fn wallet(&self, currency: &str) -> i64 {
        self.wallets.get(currency).copied().unwrap_or(0)
    }

    /// How many of an item the player holds.
    pub fn item_count(&self, key: &str) -> i64 {
        self.inventory.get(key).copied().unwrap_or(0)
    }

    /// Whether the player holds at least one of an item.
    pub fn has_item(&self, key: &str) -> bool {
        self.item_count(key) > 0
    }

    /// The active status effect of the given type.
    pub fn status_effect(&self, kind: &str) -> Option<&StatusEffect> {
        self.status_effects.iter().find(|e| e.kind == kind)
    }

    /// Whether a status effect of the given type is active.
    pub fn has_status_effect(&self, kind: &str) -> bool {
        self.status_effect(kind).is_some()
    }

    /// Whether the node has been visited.
    pub fn has_visited(&self, node_id: &str) -> bool {
        self.visited_nodes.iter().any(|n| n == node_id)
    }

    /// Number of transitions made.
    pub fn choice_count(&self) -> usize {
        self.choices_history.len()
    }
}

/// A named modifier token attached to the player, such as `poisoned`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    /// The effect type; unique among active effects.
    #[serde(rename = "type")]
    pub kind: String,
    /// Strength of the effect.
    #[serde(default)]
    pub value: f64,
    /// Remaining turns. `None` means permanent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    /// What applied the effect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl StatusEffect {
    /// Create a permanent effect.
    pub fn new(kind: impl Into<String>, value: f64) -> Self {
        Self {
            kind: kind.into(),
            value,
            duration: None,
            source: None,
        }
    }

    /// Limit the effect to a number of turns.
    pub fn with_duration(mut self, turns: u32) -> Self {
        self.duration = Some(turns);
        self
    }

    /// Record what applied the effect.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// One entry of the choice history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceRecord {
    /// Node the choice was made at.
    pub node_id: String,
    /// Index of the choice within that node.
    pub choice_index: usize,
    /// The choice text as shown.
    pub choice_text: String,
    /// When the choice was made.
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> GameState {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        GameState {
            player_id: "p1".into(),
            story_id: "s1".into(),
            save_id: "slot-1".into(),
            current_node_id: "start".into(),
            visited_nodes: vec!["start".into()],
            choices_history: Vec::new(),
            stats: BTreeMap::from([("luck".to_string(), 12)]),
            wallets: BTreeMap::from([("gold".to_string(), 50)]),
            inventory: BTreeMap::from([("rope".to_string(), 2)]),
            flags: BTreeMap::new(),
            status_effects: vec![StatusEffect::new("blessed", 1.0).with_duration(2)],
            created_at: t,
            updated_at: t,
            seed: None,
        }
    }

    #[test]
    fn accessors() {
        let state = sample();
        assert_eq!(state.stat("luck"), Some(12));
        assert_eq!(state.stat("wisdom"), None);
        assert_eq!(state.wallet("gold"), 50);
        assert_eq!(state.wallet("silver"), 0);
        assert!(state.has_item("rope"));
        assert!(!state.has_item("torch"));
        assert!(state.has_status_effect("blessed"));
        assert!(state.has_visited("start"));
        assert_eq!(state.choice_count(), 0);
    }

    #[test]
    fn serializes_camel_case() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["playerId"], "p1");
        assert_eq!(value["currentNodeId"], "start");
        assert_eq!(value["statusEffects"][0]["type"], "blessed");
        assert!(value.get("seed").is_none());
    }

    #[test]
    fn accepts_user_id_and_missing_collections() {
        let state: GameState = serde_json::from_value(json!({
            "userId": "u9",
            "storyId": "s1",
            "saveId": "slot-1",
            "currentNodeId": "start",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(state.player_id, "u9");
        assert!(state.stats.is_empty());
        assert!(state.status_effects.is_empty());
    }
}
