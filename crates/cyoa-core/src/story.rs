//! Authored story content: nodes, choices, effects, conditions, and roll requirements.
//!
//! These types mirror the JSON documents authors save (snake_case keys).
//! The engine only ever reads them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::LogicError;
use crate::logic::Expr;
use crate::value::Value;

/// One narrative unit of a story graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier.
    pub id: String,
    /// Author-facing key (the entry node is conventionally `start`).
    #[serde(default)]
    pub key: String,
    /// Markdown body shown to the player.
    #[serde(default, alias = "text_md")]
    pub text: String,
    /// Reference to an illustration or other media.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_ref: Option<String>,
    /// Outgoing choices, in display order.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Dice checks presented on arrival at this node, kept as authored.
    #[serde(default, alias = "diceChecks")]
    pub dice_checks: Vec<Json>,
    /// An ending; no choices are processed from here.
    #[serde(default, alias = "isTerminal")]
    pub is_terminal: bool,
}

impl Node {
    /// Create a node with the given id and text. The key defaults to the id.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            key: id.clone(),
            id,
            text: text.into(),
            media_ref: None,
            choices: Vec::new(),
            dice_checks: Vec::new(),
            is_terminal: false,
        }
    }

    /// Set the author-facing key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Add a choice.
    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    /// Add a dice check.
    pub fn with_dice_check(mut self, check: Json) -> Self {
        self.dice_checks.push(check);
        self
    }

    /// Mark the node as an ending.
    pub fn terminal(mut self) -> Self {
        self.is_terminal = true;
        self
    }
}

/// A player-selectable edge from one node to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Choice identifier, unique within its node.
    #[serde(default)]
    pub id: String,
    /// Text shown to the player.
    pub text: String,
    /// The node this choice leads to.
    #[serde(alias = "targetNodeId")]
    pub target_node_id: String,
    /// All must hold for the choice to be available.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Applied when the choice is taken.
    #[serde(default)]
    pub effects: Vec<Effect>,
    /// Skill checks rolled when the choice is taken.
    #[serde(default, alias = "rollRequirements")]
    pub roll_requirements: Vec<RollRequirement>,
}

impl Choice {
    /// Create a choice leading to `target_node_id`.
    pub fn new(id: impl Into<String>, text: impl Into<String>, target_node_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            target_node_id: target_node_id.into(),
            conditions: Vec::new(),
            effects: Vec::new(),
            roll_requirements: Vec::new(),
        }
    }

    /// Add a condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add an effect.
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Add a roll requirement.
    pub fn with_roll(mut self, requirement: RollRequirement) -> Self {
        self.roll_requirements.push(requirement);
        self
    }
}

/// A stat-gated dice check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollRequirement {
    /// The stat whose modifier is added (e.g. `dexterity`).
    pub stat: String,
    /// Target number to meet or beat.
    pub difficulty: i64,
    /// Dice formula to roll instead of the engine default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

impl RollRequirement {
    /// Create a requirement rolled with the default check formula.
    pub fn new(stat: impl Into<String>, difficulty: i64) -> Self {
        Self {
            stat: stat.into(),
            difficulty,
            formula: None,
        }
    }

    /// Roll this formula instead of the default.
    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }
}

/// What part of the game state an effect touches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EffectKind {
    /// A currency balance.
    Wallet,
    /// An inventory item quantity.
    Inventory,
    /// A player stat.
    Stat,
    /// A story flag.
    Flag,
    /// A timed or permanent status effect.
    StatusEffect,
    /// A type this engine does not understand. Kept so documents still load.
    Unknown(String),
}

impl EffectKind {
    /// The wire name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Wallet => "wallet",
            Self::Inventory => "inventory",
            Self::Stat => "stat",
            Self::Flag => "flag",
            Self::StatusEffect => "status_effect",
            Self::Unknown(s) => s,
        }
    }
}

impl From<String> for EffectKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "wallet" => Self::Wallet,
            "inventory" => Self::Inventory,
            "stat" => Self::Stat,
            "flag" => Self::Flag,
            "status_effect" => Self::StatusEffect,
            _ => Self::Unknown(s),
        }
    }
}

impl From<EffectKind> for String {
    fn from(kind: EffectKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an effect combines its value with the current one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operation {
    /// Add the value.
    Add,
    /// Subtract the value (for status effects: remove the effect).
    Subtract,
    /// Replace with the value.
    Set,
    /// Multiply by the value.
    Multiply,
    /// An operation this engine does not understand.
    Unknown(String),
}

impl Operation {
    /// The wire name of this operation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Set => "set",
            Self::Multiply => "multiply",
            Self::Unknown(s) => s,
        }
    }
}

impl From<String> for Operation {
    fn from(s: String) -> Self {
        match s.as_str() {
            "add" => Self::Add,
            "subtract" => Self::Subtract,
            "set" => Self::Set,
            "multiply" => Self::Multiply,
            _ => Self::Unknown(s),
        }
    }
}

impl From<Operation> for String {
    fn from(op: Operation) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra data carried by an effect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectMetadata {
    /// Why the effect happened, for logs and UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// What caused the effect (copied onto status effects).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Turns a status effect lasts. Absent means permanent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    /// Any other author-defined keys.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Json>,
}

/// A declarative state mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    /// Which part of the state is touched.
    #[serde(rename = "type")]
    pub kind: EffectKind,
    /// Currency, item, stat, flag, or status-effect name.
    pub target: String,
    /// How the value is combined.
    pub operation: Operation,
    /// The operand.
    #[serde(default)]
    pub value: Value,
    /// Optional extra data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EffectMetadata>,
}

impl Effect {
    /// Create an effect without metadata.
    pub fn new(kind: EffectKind, target: impl Into<String>, operation: Operation, value: impl Into<Value>) -> Self {
        Self {
            kind,
            target: target.into(),
            operation,
            value: value.into(),
            metadata: None,
        }
    }

    /// Set the duration (for status effects).
    pub fn with_duration(mut self, turns: u32) -> Self {
        self.metadata.get_or_insert_with(EffectMetadata::default).duration = Some(turns);
        self
    }

    /// Set the source (for status effects).
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.metadata.get_or_insert_with(EffectMetadata::default).source = Some(source.into());
        self
    }

    /// The duration carried in the metadata, if any.
    pub fn duration(&self) -> Option<u32> {
        self.metadata.as_ref().and_then(|m| m.duration)
    }

    /// The source carried in the metadata, if any.
    pub fn source(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.source.as_deref())
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.kind, self.target, self.operation, self.value)
    }
}

/// A boolean expression gating a choice.
///
/// The `logic` document is parsed once when the condition is created or
/// deserialized. A document that fails to parse is kept alongside its
/// [`LogicError`]; evaluating it always yields `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConditionDoc", into = "ConditionDoc")]
pub struct Condition {
    logic: Json,
    compiled: Result<Expr, LogicError>,
}

#[derive(Serialize, Deserialize)]
struct ConditionDoc {
    #[serde(default)]
    logic: Json,
}

impl From<ConditionDoc> for Condition {
    fn from(doc: ConditionDoc) -> Self {
        Self::new(doc.logic)
    }
}

impl From<Condition> for ConditionDoc {
    fn from(condition: Condition) -> Self {
        Self {
            logic: condition.logic,
        }
    }
}

impl Condition {
    /// Parse a JSON-logic document into a condition.
    pub fn new(logic: Json) -> Self {
        let compiled = Expr::parse(&logic);
        Self { logic, compiled }
    }

    /// The document as authored.
    pub fn logic(&self) -> &Json {
        &self.logic
    }

    /// The parsed expression, or the reason it could not be parsed.
    pub fn expr(&self) -> Result<&Expr, &LogicError> {
        self.compiled.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn choice_from_authored_json() {
        let choice: Choice = serde_json::from_value(json!({
            "id": "buy_armor",
            "text": "Buy the armor (80 gold)",
            "target_node_id": "armory_exit",
            "conditions": [{"logic": {">=": [{"var": "wallets.gold"}, 80]}}],
            "effects": [
                {"type": "wallet", "target": "gold", "operation": "subtract", "value": 80},
                {"type": "inventory", "target": "armor", "operation": "add", "value": 1}
            ],
            "roll_requirements": [{"stat": "charisma", "difficulty": 12}]
        }))
        .unwrap();

        assert_eq!(choice.target_node_id, "armory_exit");
        assert_eq!(choice.conditions.len(), 1);
        assert!(choice.conditions[0].expr().is_ok());
        assert_eq!(choice.effects[0].kind, EffectKind::Wallet);
        assert_eq!(choice.effects[0].operation, Operation::Subtract);
        assert_eq!(choice.effects[0].value, Value::Integer(80));
        assert_eq!(choice.roll_requirements[0].formula, None);
    }

    #[test]
    fn unknown_effect_type_still_loads() {
        let effect: Effect = serde_json::from_value(json!({
            "type": "reputation", "target": "guild", "operation": "add", "value": 1
        }))
        .unwrap();
        assert_eq!(effect.kind, EffectKind::Unknown("reputation".to_string()));

        let back = serde_json::to_value(&effect).unwrap();
        assert_eq!(back["type"], "reputation");
    }

    #[test]
    fn status_effect_metadata() {
        let effect: Effect = serde_json::from_value(json!({
            "type": "status_effect", "target": "poisoned", "operation": "add", "value": 2,
            "metadata": {"duration": 3, "source": "spider", "color": "green"}
        }))
        .unwrap();
        assert_eq!(effect.duration(), Some(3));
        assert_eq!(effect.source(), Some("spider"));
        let meta = effect.metadata.as_ref().unwrap();
        assert_eq!(meta.extra.get("color"), Some(&json!("green")));
    }

    #[test]
    fn effect_builders() {
        let effect = Effect::new(EffectKind::StatusEffect, "blessed", Operation::Add, 1)
            .with_duration(2)
            .with_source("shrine");
        assert_eq!(effect.duration(), Some(2));
        assert_eq!(effect.source(), Some("shrine"));
        assert_eq!(effect.to_string(), "status_effect blessed add 1");
    }

    #[test]
    fn malformed_condition_keeps_error() {
        let condition: Condition = serde_json::from_value(json!({"logic": {"==": [1]}})).unwrap();
        assert!(condition.expr().is_err());
        assert_eq!(condition.logic(), &json!({"==": [1]}));

        let back = serde_json::to_value(&condition).unwrap();
        assert_eq!(back, json!({"logic": {"==": [1]}}));
    }

    #[test]
    fn node_accepts_alternate_field_names() {
        let node: Node = serde_json::from_value(json!({
            "id": "n1",
            "key": "start",
            "text_md": "You wake up.",
            "is_terminal": false,
            "choices": [],
            "dice_checks": [{"stat": "luck", "difficulty": 10, "formula": "2d6"}]
        }))
        .unwrap();
        assert_eq!(node.text, "You wake up.");
        assert_eq!(node.dice_checks[0]["formula"], "2d6");
    }

    #[test]
    fn node_keeps_authored_dice_checks() {
        let node: Node = serde_json::from_value(json!({
            "id": "forest_gate",
            "dice_checks": [{
                "id": "perception_check",
                "when": "onEnter",
                "formula": "1d20+knowledge",
                "dc": 12,
                "success": {"log": "You spot a path.", "effects": []},
                "fail": {"log": "Nothing.", "effects": []}
            }]
        }))
        .unwrap();
        assert_eq!(node.dice_checks.len(), 1);
        assert_eq!(node.dice_checks[0]["dc"], 12);
        assert_eq!(serde_json::to_value(&node).unwrap()["dice_checks"][0]["when"], "onEnter");
    }

    #[test]
    fn node_builder() {
        let node = Node::new("gate", "A locked gate.")
            .with_key("start")
            .with_choice(Choice::new("open", "Open it", "yard"))
            .with_dice_check(json!({"stat": "strength", "dc": 15}))
            .terminal();
        assert_eq!(node.key, "start");
        assert_eq!(node.choices.len(), 1);
        assert_eq!(node.dice_checks.len(), 1);
        assert!(node.is_terminal);
    }
}
