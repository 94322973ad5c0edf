//! Where the navigator finds story nodes.

use cyoa_core::Node;

/// Read access to story content.
///
/// The navigator never owns node storage; it asks a source. [`crate::Story`]
/// implements this for an in-memory story, and callers backed by a database
/// or cache implement it themselves.
pub trait StorySource {
    /// Look up a node by id.
    fn node(&self, id: &str) -> Option<&Node>;

    /// Number of nodes in the story, or 0 for an unknown story.
    fn node_count(&self, story_id: &str) -> usize;

    /// The story's entry node, if it has one.
    fn start_node_id(&self, story_id: &str) -> Option<&str>;
}

impl<S: StorySource + ?Sized> StorySource for &S {
    fn node(&self, id: &str) -> Option<&Node> {
        (**self).node(id)
    }

    fn node_count(&self, story_id: &str) -> usize {
        (**self).node_count(story_id)
    }

    fn start_node_id(&self, story_id: &str) -> Option<&str> {
        (**self).start_node_id(story_id)
    }
}
