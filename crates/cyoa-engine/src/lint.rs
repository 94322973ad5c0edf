//! Static checks over a story graph.
//!
//! Linting never fails: it collects issues. Errors mark content the engine
//! will refuse or mis-handle at play time (dangling targets, unparsable
//! conditions, bad roll formulas). Warnings mark content that works but is
//! probably not what the author meant. Node dice checks are carried as
//! authored and only ever draw warnings.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use cyoa_core::{Choice, EffectKind, Node, Operation};
use cyoa_mechanics::DiceFormula;
use cyoa_rules::PredicateTable;
use serde_json::Value as Json;

use crate::story::Story;

/// Severity of a lint issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The story will misbehave at play time.
    Error,
    /// Suspicious but playable.
    Warning,
}

/// One finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintIssue {
    /// How serious the issue is.
    pub severity: Severity,
    /// The node the issue was found in, if any.
    pub node_id: Option<String>,
    /// What is wrong.
    pub message: String,
}

impl LintIssue {
    fn error(node_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            node_id: node_id.map(str::to_string),
            message: message.into(),
        }
    }

    fn warning(node_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            node_id: node_id.map(str::to_string),
            message: message.into(),
        }
    }
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match &self.node_id {
            Some(id) => write!(f, "{prefix}[{id}]: {}", self.message),
            None => write!(f, "{prefix}: {}", self.message),
        }
    }
}

/// Every issue found in a story, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintReport {
    /// The issues.
    pub issues: Vec<LintIssue>,
}

impl LintReport {
    /// Whether any issue is an error.
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Number of errors.
    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity == Severity::Error).count()
    }

    /// Number of warnings.
    pub fn warning_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity == Severity::Warning).count()
    }

    /// Whether the story is clean.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for LintReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for issue in &self.issues {
            writeln!(f, "{issue}")?;
        }
        Ok(())
    }
}

pub(crate) fn lint(story: &Story, predicates: &PredicateTable) -> LintReport {
    let mut issues = Vec::new();

    if story.nodes().is_empty() {
        issues.push(LintIssue::error(None, "story has no nodes"));
        return LintReport { issues };
    }

    match story.start_node_id() {
        Some(id) if story.node(id).is_none() => {
            issues.push(LintIssue::error(None, format!("start node '{id}' does not exist")));
        }
        _ => {}
    }

    let mut seen = HashSet::new();
    for node in story.nodes() {
        if !seen.insert(node.id.as_str()) {
            issues.push(LintIssue::error(Some(&node.id), "duplicate node id"));
        }
        check_node(story, node, predicates, &mut issues);
    }

    let reachable = reachable_from_start(story);
    for node in story.nodes() {
        if !reachable.contains(node.id.as_str()) && seen.remove(node.id.as_str()) {
            issues.push(LintIssue::warning(Some(&node.id), "unreachable from the start node"));
        }
    }

    LintReport { issues }
}

fn check_node(story: &Story, node: &Node, predicates: &PredicateTable, issues: &mut Vec<LintIssue>) {
    let at = Some(node.id.as_str());
    if node.is_terminal && !node.choices.is_empty() {
        issues.push(LintIssue::warning(at, "ending has choices that can never be taken"));
    }
    if !node.is_terminal && node.choices.is_empty() {
        issues.push(LintIssue::warning(at, "dead end: no choices and not an ending"));
    }
    for (i, check) in node.dice_checks.iter().enumerate() {
        let Some(check) = check.as_object() else {
            issues.push(LintIssue::warning(at, format!("dice check {i} is not an object")));
            continue;
        };
        if let Some(formula) = check.get("formula").and_then(Json::as_str)
            && let Err(e) = DiceFormula::parse(formula)
        {
            issues.push(LintIssue::warning(at, format!("dice check {i}: {e}")));
        }
    }
    for choice in &node.choices {
        check_choice(story, node, choice, predicates, issues);
    }
}

fn check_choice(story: &Story, node: &Node, choice: &Choice, predicates: &PredicateTable, issues: &mut Vec<LintIssue>) {
    let at = Some(node.id.as_str());
    let label = &choice.id;

    if story.node(&choice.target_node_id).is_none() {
        issues.push(LintIssue::error(
            at,
            format!("choice '{label}' targets missing node '{}'", choice.target_node_id),
        ));
    }

    for (i, condition) in choice.conditions.iter().enumerate() {
        match condition.expr() {
            Err(e) => issues.push(LintIssue::error(at, format!("choice '{label}' condition {i}: {e}"))),
            Ok(expr) => {
                for name in expr.called_predicates() {
                    if !predicates.contains(name) {
                        issues.push(LintIssue::warning(
                            at,
                            format!("choice '{label}' condition {i}: unknown operator '{name}'"),
                        ));
                    }
                }
            }
        }
    }

    for effect in &choice.effects {
        if let EffectKind::Unknown(kind) = &effect.kind {
            issues.push(LintIssue::warning(
                at,
                format!("choice '{label}' effect '{effect}': unknown effect type '{kind}' is ignored"),
            ));
        }
        if let Operation::Unknown(op) = &effect.operation {
            issues.push(LintIssue::error(
                at,
                format!("choice '{label}' effect '{effect}': unknown operation '{op}'"),
            ));
        }
    }

    for roll in &choice.roll_requirements {
        if let Some(formula) = &roll.formula
            && let Err(e) = DiceFormula::parse(formula)
        {
            issues.push(LintIssue::error(at, format!("choice '{label}' roll on '{}': {e}", roll.stat)));
        }
    }
}

fn reachable_from_start(story: &Story) -> HashSet<&str> {
    let mut reached = HashSet::new();
    let Some(start) = story.start_node() else {
        return reached;
    };
    let mut queue = VecDeque::from([start]);
    reached.insert(start.id.as_str());
    while let Some(node) = queue.pop_front() {
        for choice in &node.choices {
            if let Some(next) = story.node(&choice.target_node_id)
                && reached.insert(next.id.as_str())
            {
                queue.push_back(next);
            }
        }
    }
    reached
}
