//! The read-only view of a game state that conditions are evaluated against.

use std::collections::{BTreeMap, HashSet};

use cyoa_core::GameState;
use serde_json::{Map, Value as Json, json};

/// A JSON view of the parts of a [`GameState`] conditions may read.
///
/// Exposes `stats`, `wallets`, `inventory`, `flags`, `statusEffects`,
/// `hasStatusEffect` (type to `true`), `visitedNodes`, `hasVisited`
/// (node id to `true`), `currentNodeId`, and `choiceCount`.
#[derive(Debug, Clone)]
pub struct Projection {
    data: Json,
    visited: HashSet<String>,
}

impl Projection {
    /// Build the projection of a state.
    pub fn new(state: &GameState) -> Self {
        let status_effects: Vec<Json> = state
            .status_effects
            .iter()
            .map(|e| {
                json!({
                    "type": e.kind,
                    "value": e.value,
                    "duration": e.duration,
                    "source": e.source,
                })
            })
            .collect();

        let data = json!({
            "stats": ints(&state.stats),
            "wallets": ints(&state.wallets),
            "inventory": ints(&state.inventory),
            "flags": Json::Object(state.flags.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()),
            "statusEffects": status_effects,
            "hasStatusEffect": marks(state.status_effects.iter().map(|e| &e.kind)),
            "visitedNodes": state.visited_nodes,
            "hasVisited": marks(state.visited_nodes.iter()),
            "currentNodeId": state.current_node_id,
            "choiceCount": state.choices_history.len(),
        });

        Self {
            data,
            visited: state.visited_nodes.iter().cloned().collect(),
        }
    }

    /// The whole projection as JSON.
    pub fn data(&self) -> &Json {
        &self.data
    }

    /// Resolve a dotted path such as `stats.luck` or `visitedNodes.0`.
    ///
    /// The empty path resolves to the whole projection.
    pub fn lookup(&self, path: &str) -> Option<&Json> {
        if path.is_empty() {
            return Some(&self.data);
        }
        path.split('.').try_fold(&self.data, |node, segment| match node {
            Json::Object(map) => map.get(segment),
            Json::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Quantity of an item held, or 0.
    pub fn item_count(&self, key: &str) -> i64 {
        self.section_int("inventory", key)
    }

    /// Balance of a currency, or 0.
    pub fn wallet_balance(&self, currency: &str) -> i64 {
        self.section_int("wallets", currency)
    }

    /// Whether the node has been visited.
    pub fn has_visited(&self, node_id: &str) -> bool {
        self.visited.contains(node_id)
    }

    /// Whether a status effect of this type is active.
    pub fn has_status_effect(&self, kind: &str) -> bool {
        self.data["hasStatusEffect"].get(kind).is_some()
    }

    fn section_int(&self, section: &str, key: &str) -> i64 {
        self.data[section].get(key).and_then(Json::as_i64).unwrap_or(0)
    }
}

fn ints(map: &BTreeMap<String, i64>) -> Json {
    Json::Object(map.iter().map(|(k, v)| (k.clone(), Json::from(*v))).collect())
}

fn marks<'a>(keys: impl Iterator<Item = &'a String>) -> Json {
    Json::Object(keys.map(|k| (k.clone(), Json::Bool(true))).collect::<Map<_, _>>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyoa_core::{StateManager, StatusEffect, Value};

    fn state() -> GameState {
        let mut state = StateManager::new().create_new_state("p", "s", "start", "slot-1", None);
        state.visited_nodes.push("hall".into());
        state.current_node_id = "hall".into();
        state.wallets.insert("gold".into(), 75);
        state.inventory.insert("torch".into(), 2);
        state.flags.insert("met_guard".into(), Value::Boolean(true));
        state.status_effects.push(StatusEffect::new("poisoned", 2.0).with_duration(3));
        state
    }

    #[test]
    fn exposes_state_sections() {
        let p = Projection::new(&state());
        assert_eq!(p.lookup("stats.luck"), Some(&json!(10)));
        assert_eq!(p.lookup("wallets.gold"), Some(&json!(75)));
        assert_eq!(p.lookup("flags.met_guard"), Some(&json!(true)));
        assert_eq!(p.lookup("currentNodeId"), Some(&json!("hall")));
        assert_eq!(p.lookup("choiceCount"), Some(&json!(0)));
        assert_eq!(p.lookup("statusEffects.0.duration"), Some(&json!(3)));
        assert_eq!(p.lookup("visitedNodes.1"), Some(&json!("hall")));
    }

    #[test]
    fn derived_maps() {
        let p = Projection::new(&state());
        assert_eq!(p.lookup("hasVisited.start"), Some(&json!(true)));
        assert_eq!(p.lookup("hasVisited.cellar"), None);
        assert_eq!(p.lookup("hasStatusEffect.poisoned"), Some(&json!(true)));
        assert!(p.has_visited("hall"));
        assert!(p.has_status_effect("poisoned"));
        assert!(!p.has_status_effect("blessed"));
    }

    #[test]
    fn helpers_default_to_zero() {
        let p = Projection::new(&state());
        assert_eq!(p.item_count("torch"), 2);
        assert_eq!(p.item_count("sword"), 0);
        assert_eq!(p.wallet_balance("gold"), 75);
        assert_eq!(p.wallet_balance("gems"), 0);
    }

    #[test]
    fn missing_paths() {
        let p = Projection::new(&state());
        assert_eq!(p.lookup("stats.wisdom"), None);
        assert_eq!(p.lookup("visitedNodes.x"), None);
        assert_eq!(p.lookup("choiceCount.deep"), None);
        assert!(p.lookup("").is_some_and(Json::is_object));
    }
}
