//! In-memory stories loaded from JSON documents.

use std::collections::HashMap;
use std::path::Path;

use cyoa_core::Node;
use cyoa_rules::PredicateTable;
use serde::{Deserialize, Serialize};

use crate::error::StoryError;
use crate::lint::{self, LintReport};
use crate::source::StorySource;

/// A complete story graph held in memory.
///
/// Nodes keep their authored order. Lookups go through an id index; when a
/// document repeats an id, the first node with that id wins and
/// [`Story::lint`] reports the duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoryDoc", into = "StoryDoc")]
pub struct Story {
    /// Story identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    start_node_id: Option<String>,
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

#[derive(Serialize, Deserialize)]
struct StoryDoc {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default, alias = "startNodeId", skip_serializing_if = "Option::is_none")]
    start_node_id: Option<String>,
    #[serde(default)]
    nodes: Vec<Node>,
}

impl From<StoryDoc> for Story {
    fn from(doc: StoryDoc) -> Self {
        let mut story = Story::new(doc.id, doc.title);
        story.start_node_id = doc.start_node_id;
        for node in doc.nodes {
            story = story.with_node(node);
        }
        story
    }
}

impl From<Story> for StoryDoc {
    fn from(story: Story) -> Self {
        Self {
            id: story.id,
            title: story.title,
            start_node_id: story.start_node_id,
            nodes: story.nodes,
        }
    }
}

impl Story {
    /// An empty story.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start_node_id: None,
            nodes: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Append a node.
    pub fn with_node(mut self, node: Node) -> Self {
        self.index.entry(node.id.clone()).or_insert(self.nodes.len());
        self.nodes.push(node);
        self
    }

    /// Set the entry node explicitly.
    pub fn with_start(mut self, node_id: impl Into<String>) -> Self {
        self.start_node_id = Some(node_id.into());
        self
    }

    /// Parse a story from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, StoryError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a story file.
    pub fn load(path: &Path) -> Result<Self, StoryError> {
        let json = std::fs::read_to_string(path).map_err(|source| StoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let story = Self::from_json_str(&json)?;
        tracing::debug!("Loaded story '{}' with {} nodes from {}", story.id, story.nodes.len(), path.display());
        Ok(story)
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// All nodes, in authored order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The id of the entry node.
    ///
    /// An explicit start wins. Otherwise the node keyed `start`, then the
    /// first node.
    pub fn start_node_id(&self) -> Option<&str> {
        if let Some(id) = &self.start_node_id {
            return Some(id);
        }
        self.nodes
            .iter()
            .find(|n| n.key == "start")
            .or_else(|| self.nodes.first())
            .map(|n| n.id.as_str())
    }

    /// The entry node, if it exists.
    pub fn start_node(&self) -> Option<&Node> {
        self.start_node_id().and_then(|id| self.node(id))
    }

    /// Check the story for authoring mistakes using the standard predicates.
    pub fn lint(&self) -> LintReport {
        self.lint_with(&PredicateTable::standard())
    }

    /// Check the story, treating the names in `predicates` as known.
    pub fn lint_with(&self, predicates: &PredicateTable) -> LintReport {
        lint::lint(self, predicates)
    }
}

impl StorySource for Story {
    fn node(&self, id: &str) -> Option<&Node> {
        Story::node(self, id)
    }

    fn node_count(&self, story_id: &str) -> usize {
        if story_id == self.id { self.nodes.len() } else { 0 }
    }

    fn start_node_id(&self, story_id: &str) -> Option<&str> {
        if story_id == self.id { Story::start_node_id(self) } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyoa_core::Choice;

    const DOC: &str = r#"{
        "id": "cave",
        "title": "The Cave",
        "nodes": [
            {"id": "n1", "key": "intro", "text": "Dark.", "choices": [
                {"id": "c1", "text": "Go in", "target_node_id": "n2"}
            ]},
            {"id": "n2", "key": "start", "text_md": "Deeper.", "is_terminal": true},
            {"id": "n1", "text": "Shadowed duplicate"}
        ]
    }"#;

    #[test]
    fn parses_and_indexes() {
        let story = Story::from_json_str(DOC).unwrap();
        assert_eq!(story.title, "The Cave");
        assert_eq!(story.nodes().len(), 3);
        assert_eq!(story.node("n1").unwrap().text, "Dark.");
        assert_eq!(story.node("n2").unwrap().text, "Deeper.");
        assert!(story.node("n9").is_none());
    }

    #[test]
    fn start_node_resolution() {
        let story = Story::from_json_str(DOC).unwrap();
        assert_eq!(story.start_node_id(), Some("n2"));

        let explicit = story.clone().with_start("n1");
        assert_eq!(explicit.start_node().unwrap().id, "n1");

        let keyless = Story::new("s", "").with_node(Node::new("a", "")).with_node(Node::new("b", ""));
        assert_eq!(keyless.start_node_id(), Some("a"));
        assert_eq!(Story::new("s", "").start_node_id(), None);
    }

    #[test]
    fn source_is_scoped_to_story_id() {
        let story = Story::new("s", "").with_node(Node::new("a", "").with_choice(Choice::new("c", "go", "a")));
        assert_eq!(StorySource::node_count(&story, "s"), 1);
        assert_eq!(StorySource::node_count(&story, "other"), 0);
        assert_eq!(StorySource::start_node_id(&story, "other"), None);
        assert!(StorySource::node(&story, "a").is_some());
    }

    #[test]
    fn round_trips_through_json() {
        let story = Story::from_json_str(DOC).unwrap();
        let json = serde_json::to_string(&story).unwrap();
        assert_eq!(Story::from_json_str(&json).unwrap(), story);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Story::load(Path::new("/nonexistent/story.json")).unwrap_err();
        assert!(matches!(err, StoryError::Io { .. }));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cave.json");
        std::fs::write(&path, DOC).unwrap();
        assert_eq!(Story::load(&path).unwrap().id, "cave");

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Story::load(&path), Err(StoryError::Parse(_))));
    }
}
