use std::collections::HashMap;

use parking_lot::Mutex;

use crate::domain::{PostId, PostState};

/// Side table of per-post processing states, keyed by the feed's stable post
/// identity. The pipeline never stores anything on the feed's own objects;
/// a post absent from this table is unseen. Tags survive re-scans, which is
/// both the dedupe mechanism and the resumability marker: once tagged, a post
/// is never revisited even if its content later changes.
#[derive(Debug, Default)]
pub struct StateTable {
    states: Mutex<HashMap<PostId, PostState>>,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, post: &PostId) -> Option<PostState> {
        self.states.lock().get(post).copied()
    }

    pub fn is_seen(&self, post: &PostId) -> bool {
        self.states.lock().contains_key(post)
    }

    pub fn tag(&self, post: PostId, state: PostState) {
        self.states.lock().insert(post, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_post_is_unseen() {
        let table = StateTable::new();
        assert!(!table.is_seen(&PostId::new("p1")));
        assert_eq!(table.get(&PostId::new("p1")), None);
    }

    #[test]
    fn tag_transitions_overwrite() {
        let table = StateTable::new();
        table.tag(PostId::new("p1"), PostState::Pending);
        assert!(table.is_seen(&PostId::new("p1")));
        table.tag(PostId::new("p1"), PostState::Complete);
        assert_eq!(table.get(&PostId::new("p1")), Some(PostState::Complete));
    }
}
