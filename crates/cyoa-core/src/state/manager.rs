use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value as Json};

use super::{ChoiceRecord, DEFAULT_STAT_NAMES, DEFAULT_STAT_VALUE, GameState, MIN_STAT, MIN_WALLET};
use crate::clock::{Clock, SystemClock};
use crate::error::{StateError, StateResult};

/// Creates, validates, snapshots, and merges game states.
///
/// The manager never holds a state itself; every operation works on the
/// state passed in. Timestamps come from the configured [`Clock`].
#[derive(Debug, Clone)]
pub struct StateManager {
    clock: Arc<dyn Clock>,
    default_stats: BTreeMap<String, i64>,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager {
    /// A manager using the system clock and the five default stats at 10.
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            default_stats: DEFAULT_STAT_NAMES
                .iter()
                .map(|name| (name.to_string(), DEFAULT_STAT_VALUE))
                .collect(),
        }
    }

    /// Use a different time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the stats a new game starts with.
    ///
    /// Fails if any stat is below the minimum.
    pub fn with_default_stats(mut self, stats: BTreeMap<String, i64>) -> StateResult<Self> {
        check_stats(&stats)?;
        self.default_stats = stats;
        Ok(self)
    }

    /// The current instant according to the configured clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Start a new game at `start_node_id` with the default stats.
    pub fn create_new_state(
        &self,
        player_id: &str,
        story_id: &str,
        start_node_id: &str,
        save_id: &str,
        seed: Option<&str>,
    ) -> GameState {
        let now = self.now();
        let state = GameState {
            player_id: player_id.to_string(),
            story_id: story_id.to_string(),
            save_id: save_id.to_string(),
            current_node_id: start_node_id.to_string(),
            visited_nodes: vec![start_node_id.to_string()],
            choices_history: Vec::new(),
            stats: self.default_stats.clone(),
            wallets: BTreeMap::new(),
            inventory: BTreeMap::new(),
            flags: BTreeMap::new(),
            status_effects: Vec::new(),
            created_at: now,
            updated_at: now,
            seed: seed.map(str::to_string),
        };
        tracing::info!("Created new game state: {story_id} for player {player_id} (save: {save_id})");
        state
    }

    /// Start a new game with custom stats laid over the defaults.
    pub fn create_state_with_stats(
        &self,
        player_id: &str,
        story_id: &str,
        start_node_id: &str,
        save_id: &str,
        initial_stats: &BTreeMap<String, i64>,
        seed: Option<&str>,
    ) -> StateResult<GameState> {
        check_stats(initial_stats)?;
        let mut state = self.create_new_state(player_id, story_id, start_node_id, save_id, seed);
        state
            .stats
            .extend(initial_stats.iter().map(|(k, v)| (k.clone(), *v)));
        Ok(state)
    }

    /// Check every state invariant, reporting the first violation.
    pub fn validate_state(&self, state: &GameState) -> StateResult<()> {
        for (field, value) in [
            ("playerId", &state.player_id),
            ("storyId", &state.story_id),
            ("saveId", &state.save_id),
            ("currentNodeId", &state.current_node_id),
        ] {
            if value.is_empty() {
                return Err(StateError::invalid(field, "must be a non-empty string"));
            }
        }

        check_stats(&state.stats)?;
        for (currency, balance) in &state.wallets {
            if *balance < MIN_WALLET {
                return Err(StateError::invalid(
                    format!("wallets.{currency}"),
                    format!("balance must not be negative, got {balance}"),
                ));
            }
        }
        for (item, quantity) in &state.inventory {
            if *quantity < 0 {
                return Err(StateError::invalid(
                    format!("inventory.{item}"),
                    format!("quantity must not be negative, got {quantity}"),
                ));
            }
        }

        let mut seen = Vec::with_capacity(state.status_effects.len());
        for effect in &state.status_effects {
            if seen.contains(&effect.kind.as_str()) {
                return Err(StateError::invalid(
                    format!("statusEffects.{}", effect.kind),
                    "more than one active effect of this type",
                ));
            }
            seen.push(effect.kind.as_str());
        }

        if !state.has_visited(&state.current_node_id) {
            return Err(StateError::invalid(
                "visitedNodes",
                format!("does not contain current node '{}'", state.current_node_id),
            ));
        }
        if state.updated_at < state.created_at {
            return Err(StateError::invalid("updatedAt", "is earlier than createdAt"));
        }

        tracing::debug!("State validation passed");
        Ok(())
    }

    /// An independent deep copy of the state.
    pub fn clone_state(&self, state: &GameState) -> GameState {
        state.clone()
    }

    /// Append a history entry and stamp `updatedAt`.
    pub fn record_choice(&self, state: &mut GameState, node_id: &str, choice_index: usize, choice_text: &str) {
        let now = self.now();
        state.choices_history.push(ChoiceRecord {
            node_id: node_id.to_string(),
            choice_index,
            choice_text: choice_text.to_string(),
            timestamp: now,
        });
        state.updated_at = now;
        tracing::debug!("Recorded choice: node={node_id}, choice={choice_index}");
    }

    /// Set the current node, marking it visited if this is the first visit.
    pub fn move_to_node(&self, state: &mut GameState, node_id: &str) {
        state.current_node_id = node_id.to_string();
        if !state.has_visited(node_id) {
            state.visited_nodes.push(node_id.to_string());
        }
        state.updated_at = self.now();
        tracing::debug!("Moved to node: {node_id}");
    }

    /// Whether the state has visited the node.
    pub fn has_visited_node(&self, state: &GameState, node_id: &str) -> bool {
        state.has_visited(node_id)
    }

    /// Number of transitions recorded in the state.
    pub fn choice_count(&self, state: &GameState) -> usize {
        state.choice_count()
    }

    /// Convert the state to a plain JSON document for persistence.
    pub fn create_snapshot(&self, state: &GameState) -> StateResult<Json> {
        Ok(serde_json::to_value(state)?)
    }

    /// Rebuild a state from a persisted snapshot and validate it.
    ///
    /// The raw document is checked for shape first so that a corrupt
    /// snapshot is reported against the offending field. Missing
    /// collections are treated as empty. Inventory entries at zero are
    /// dropped.
    pub fn restore_from_snapshot(&self, snapshot: &Json) -> StateResult<GameState> {
        check_shape(snapshot)?;
        let mut state: GameState = serde_json::from_value(snapshot.clone())?;
        state.inventory.retain(|_, quantity| *quantity != 0);
        self.validate_state(&state)?;
        Ok(state)
    }

    /// Combine two saves of the same player and story.
    ///
    /// The primary state wins every field except `visitedNodes`, which
    /// becomes the union of both (primary order first), and `updatedAt`,
    /// which becomes the later of the two.
    pub fn merge_states(&self, primary: &GameState, secondary: &GameState) -> StateResult<GameState> {
        if primary.player_id != secondary.player_id {
            return Err(StateError::Conflict(format!(
                "player '{}' does not match '{}'",
                primary.player_id, secondary.player_id
            )));
        }
        if primary.story_id != secondary.story_id {
            return Err(StateError::Conflict(format!(
                "story '{}' does not match '{}'",
                primary.story_id, secondary.story_id
            )));
        }

        let mut merged = self.clone_state(primary);
        for node in &secondary.visited_nodes {
            if !merged.has_visited(node) {
                merged.visited_nodes.push(node.clone());
            }
        }
        merged.updated_at = primary.updated_at.max(secondary.updated_at);
        Ok(merged)
    }
}

fn check_stats(stats: &BTreeMap<String, i64>) -> StateResult<()> {
    match stats.iter().find(|(_, v)| **v < MIN_STAT) {
        Some((name, value)) => Err(StateError::invalid(
            format!("stats.{name}"),
            format!("stat must be at least {MIN_STAT}, got {value}"),
        )),
        None => Ok(()),
    }
}

fn check_shape(snapshot: &Json) -> StateResult<()> {
    let Json::Object(doc) = snapshot else {
        return Err(StateError::invalid("snapshot", "must be an object"));
    };

    let player = if doc.contains_key("userId") && !doc.contains_key("playerId") {
        "userId"
    } else {
        "playerId"
    };
    for field in [player, "storyId", "saveId", "currentNodeId"] {
        match doc.get(field) {
            Some(Json::String(s)) if !s.is_empty() => {}
            _ => return Err(StateError::invalid(field, "missing or not a non-empty string")),
        }
    }

    for field in ["visitedNodes", "choicesHistory", "statusEffects"] {
        match doc.get(field) {
            None | Some(Json::Array(_)) => {}
            Some(_) => return Err(StateError::invalid(field, "must be an array")),
        }
    }

    for field in ["stats", "wallets", "inventory"] {
        if let Some(map) = object_field(doc, field)? {
            for (key, value) in map {
                if value.as_i64().is_none() {
                    return Err(StateError::invalid(format!("{field}.{key}"), "must be an integer"));
                }
            }
        }
    }
    object_field(doc, "flags")?;

    for field in ["createdAt", "updatedAt"] {
        let valid = doc
            .get(field)
            .and_then(Json::as_str)
            .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok());
        if !valid {
            return Err(StateError::invalid(field, "missing or not an RFC 3339 timestamp"));
        }
    }
    Ok(())
}

fn object_field<'a>(doc: &'a Map<String, Json>, field: &str) -> StateResult<Option<&'a Map<String, Json>>> {
    match doc.get(field) {
        None => Ok(None),
        Some(Json::Object(map)) => Ok(Some(map)),
        Some(_) => Err(StateError::invalid(field, "must be an object")),
    }
}
