//! The story state machine.
//!
//! A [`StoryNavigator`] moves a [`GameState`] from node to node. Every
//! operation borrows the caller's state and, where it changes anything,
//! returns a new one; the caller decides whether to persist it.

use std::collections::BTreeMap;
use std::sync::Arc;

use cyoa_core::{Choice, Clock, Effect, GameState, Node, RollRequirement, StateManager};
use cyoa_mechanics::{DiceFormula, DiceRoller, RollResult, stat_modifier};
use cyoa_rules::{ConditionEvaluator, EffectProcessor, PredicateTable};
use serde::Serialize;
use serde_json::Value as Json;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::source::StorySource;

/// A choice at the current node, marked available or locked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceView {
    /// Position in the node's choice list; pass this to [`StoryNavigator::make_choice`].
    pub index: usize,
    /// Authored choice id.
    pub id: String,
    /// Display text.
    pub text: String,
    /// Where the choice leads.
    pub target_node_id: String,
    /// Whether every condition holds right now.
    pub available: bool,
    /// Indices of the conditions that do not hold.
    pub failed_conditions: Vec<usize>,
    /// Dice checks made when the choice is taken.
    pub roll_requirements: Vec<RollRequirement>,
}

/// The outcome of taking a choice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateTransition {
    /// The node the choice was made at.
    pub previous_node_id: String,
    /// The node the player is at now.
    pub new_node_id: String,
    /// The effects that were applied, in order.
    pub applied_effects: Vec<Effect>,
    /// The state after the transition.
    pub updated_state: GameState,
    /// One result per roll requirement, in order.
    pub roll_results: Vec<RollResult>,
}

/// How far through a story a save is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Nodes in the story.
    pub total_nodes: usize,
    /// Distinct nodes visited.
    pub visited_nodes: usize,
    /// `visited / total` as a whole percentage.
    pub progress_percentage: u32,
    /// Choices taken so far.
    pub choices_made: usize,
}

/// Parameters for [`StoryNavigator::start_game`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGame {
    /// The player starting the game.
    pub player_id: String,
    /// The story to play.
    pub story_id: String,
    /// The save slot.
    pub save_id: String,
    /// Seed for replayable rolls.
    pub seed: Option<String>,
    /// Stats laid over the defaults.
    pub stats: BTreeMap<String, i64>,
}

impl NewGame {
    /// A new game in save slot `slot-0` with default stats and no seed.
    pub fn new(player_id: impl Into<String>, story_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            story_id: story_id.into(),
            save_id: "slot-0".to_string(),
            seed: None,
            stats: BTreeMap::new(),
        }
    }

    /// Set the save slot.
    pub fn with_save(mut self, save_id: impl Into<String>) -> Self {
        self.save_id = save_id.into();
        self
    }

    /// Make rolls replayable from this seed.
    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    /// Override one starting stat.
    pub fn with_stat(mut self, name: impl Into<String>, value: i64) -> Self {
        self.stats.insert(name.into(), value);
        self
    }
}

/// Drives play through a story.
#[derive(Debug)]
pub struct StoryNavigator<S> {
    source: S,
    states: StateManager,
    conditions: ConditionEvaluator,
    effects: EffectProcessor,
    check: DiceFormula,
}

impl<S: StorySource> StoryNavigator<S> {
    /// A navigator with the default configuration.
    pub fn new(source: S) -> Self {
        Self {
            source,
            states: StateManager::new(),
            conditions: ConditionEvaluator::default(),
            effects: EffectProcessor::new(),
            check: DiceFormula::d20(0),
        }
    }

    /// A navigator configured from `config`.
    pub fn with_config(source: S, config: &EngineConfig) -> EngineResult<Self> {
        let check = DiceFormula::parse(&config.check_formula)?;
        let states = StateManager::new().with_default_stats(config.default_stats.clone())?;
        Ok(Self {
            source,
            states,
            conditions: ConditionEvaluator::default(),
            effects: EffectProcessor::new().with_rounding(config.rounding),
            check,
        })
    }

    /// Use a different time source for every timestamp the navigator writes.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.states = self.states.with_clock(Arc::clone(&clock));
        self.effects = self.effects.with_clock(clock);
        self
    }

    /// Evaluate conditions with this predicate table.
    pub fn with_predicates(mut self, predicates: PredicateTable) -> Self {
        self.conditions = ConditionEvaluator::new(predicates);
        self
    }

    /// The story source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The state manager.
    pub fn state_manager(&self) -> &StateManager {
        &self.states
    }

    /// Start a new game at the story's entry node.
    pub fn start_game(&self, new_game: &NewGame) -> EngineResult<GameState> {
        let story_id = &new_game.story_id;
        let start = self
            .source
            .start_node_id(story_id)
            .ok_or_else(|| EngineError::NotFound(format!("start node of story '{story_id}'")))?;
        if self.source.node(start).is_none() {
            return Err(EngineError::NotFound(start.to_string()));
        }
        let state = self.states.create_state_with_stats(
            &new_game.player_id,
            story_id,
            start,
            &new_game.save_id,
            &new_game.stats,
            new_game.seed.as_deref(),
        )?;
        Ok(state)
    }

    /// Restore a saved snapshot and check that its current node exists.
    pub fn load_game(&self, snapshot: &Json) -> EngineResult<GameState> {
        let state = self.states.restore_from_snapshot(snapshot)?;
        if self.source.node(&state.current_node_id).is_none() {
            return Err(EngineError::NotFound(state.current_node_id));
        }
        Ok(state)
    }

    /// Snapshot a state for persistence.
    pub fn save_game(&self, state: &GameState) -> EngineResult<Json> {
        Ok(self.states.create_snapshot(state)?)
    }

    /// The document of a node.
    pub fn node_content(&self, node_id: &str) -> EngineResult<&Node> {
        self.source
            .node(node_id)
            .ok_or_else(|| EngineError::NotFound(node_id.to_string()))
    }

    /// Every choice at the current node, each marked available or locked.
    ///
    /// Locked choices are listed too. An ending has no choices.
    pub fn get_available_choices(&self, state: &GameState) -> EngineResult<Vec<ChoiceView>> {
        let node = self.node_content(&state.current_node_id)?;
        if node.is_terminal {
            return Ok(Vec::new());
        }
        let views = node
            .choices
            .iter()
            .enumerate()
            .map(|(index, choice)| {
                let availability = self.conditions.check_availability(&choice.conditions, state);
                ChoiceView {
                    index,
                    id: choice.id.clone(),
                    text: choice.text.clone(),
                    target_node_id: choice.target_node_id.clone(),
                    available: availability.available,
                    failed_conditions: availability.failed_indices(),
                    roll_requirements: choice.roll_requirements.clone(),
                }
            })
            .collect();
        Ok(views)
    }

    /// Check that the choice at `choice_index` can be taken, without taking it.
    pub fn validate_choice(&self, state: &GameState, choice_index: usize) -> EngineResult<()> {
        self.resolve(state, choice_index).map(|_| ())
    }

    /// Take the choice at `choice_index`.
    ///
    /// `state` is never modified; the new state is in the returned
    /// transition. Failed rolls are recorded but do not block the move.
    pub fn make_choice(&self, state: &GameState, choice_index: usize) -> EngineResult<StateTransition> {
        let (node, choice) = self.resolve(state, choice_index)?;
        if self.source.node(&choice.target_node_id).is_none() {
            return Err(EngineError::NotFound(choice.target_node_id.clone()));
        }

        let mut next = self.states.clone_state(state);

        let mut roller = match &state.seed {
            Some(seed) => DiceRoller::seeded(&format!("{seed}-{}", state.choices_history.len())),
            None => DiceRoller::from_entropy(),
        };
        let mut roll_results = Vec::with_capacity(choice.roll_requirements.len());
        for requirement in &choice.roll_requirements {
            let result = self.roll_requirement(&mut roller, requirement, &next)?;
            if !result.succeeded() {
                tracing::warn!(
                    "Roll failed for {} (DC {}): {result}",
                    requirement.stat,
                    requirement.difficulty
                );
            }
            roll_results.push(result);
        }

        let applied_effects = self.effects.apply_effects(&choice.effects, &mut next);
        self.states
            .record_choice(&mut next, &node.id, choice_index, &choice.text);
        self.states.move_to_node(&mut next, &choice.target_node_id);
        self.effects.process_status_effect_durations(&mut next);

        tracing::info!("Choice processed: {} -> {}", node.id, choice.target_node_id);
        Ok(StateTransition {
            previous_node_id: node.id.clone(),
            new_node_id: choice.target_node_id.clone(),
            applied_effects,
            updated_state: next,
            roll_results,
        })
    }

    /// Whether the current node is an ending. A missing node is not.
    pub fn is_at_ending(&self, state: &GameState) -> bool {
        self.source
            .node(&state.current_node_id)
            .is_some_and(|node| node.is_terminal)
    }

    /// How much of the story this save has seen.
    pub fn get_progress(&self, state: &GameState) -> Progress {
        let total_nodes = self.source.node_count(&state.story_id);
        let visited_nodes = state.visited_nodes.len();
        let progress_percentage = if total_nodes == 0 {
            0
        } else {
            (visited_nodes as f64 * 100.0 / total_nodes as f64).round() as u32
        };
        Progress {
            total_nodes,
            visited_nodes,
            progress_percentage,
            choices_made: state.choices_history.len(),
        }
    }

    fn resolve(&self, state: &GameState, choice_index: usize) -> EngineResult<(&Node, &Choice)> {
        let node = self.node_content(&state.current_node_id)?;
        if node.is_terminal {
            return Err(EngineError::AtEnding(node.id.clone()));
        }
        let choice = node.choices.get(choice_index).ok_or(EngineError::InvalidChoice {
            index: choice_index,
            len: node.choices.len(),
        })?;
        let availability = self.conditions.check_availability(&choice.conditions, state);
        if !availability.available {
            return Err(EngineError::ConditionsNotMet {
                failed: availability.failed_indices(),
            });
        }
        Ok((node, choice))
    }

    fn roll_requirement(
        &self,
        roller: &mut DiceRoller,
        requirement: &RollRequirement,
        state: &GameState,
    ) -> EngineResult<RollResult> {
        let stat = state
            .stat(&requirement.stat)
            .ok_or_else(|| EngineError::UnknownStat(requirement.stat.clone()))?;
        let base = match &requirement.formula {
            Some(formula) => DiceFormula::parse(formula)?,
            None => self.check,
        };
        let formula = base.plus(stat_modifier(stat));
        Ok(roller.roll_formula(&formula, Some(requirement.difficulty)))
    }
}
