pub mod replay;
pub mod sim;

use crate::domain::PostId;
use crate::render::Badge;

/// Structural change notification emitted by a feed surface. The watcher only
/// reacts to added nodes; removals never trigger a re-scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    NodesAdded,
    NodesRemoved,
}

impl Mutation {
    pub fn adds_nodes(&self) -> bool {
        matches!(self, Mutation::NodesAdded)
    }
}

/// Capability set the pipeline needs from a rendered feed: enumerate posts,
/// read their text, check liveness, and decorate them. The pipeline never
/// owns feed objects; everything goes through this boundary.
pub trait FeedSurface: Send + Sync {
    /// All currently attached posts, in document order.
    fn posts(&self) -> Vec<PostId>;

    /// Extracted text of a post, `None` when the post has no text content.
    fn text_of(&self, post: &PostId) -> Option<String>;

    /// Whether the post is still part of the live feed.
    fn is_attached(&self, post: &PostId) -> bool;

    /// Whether the post exposes an anchor element badges can sit next to.
    fn has_anchor(&self, post: &PostId) -> bool;

    /// Attach a badge, replacing any existing badge (and its tooltip).
    fn set_badge(&self, post: &PostId, badge: Badge);

    /// Remove the post's badge and tooltip, if any.
    fn clear_badge(&self, post: &PostId);
}
