use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::domain::PostId;
use crate::feed::{FeedSurface, Mutation};
use crate::render::Badge;

#[derive(Debug)]
struct SimPost {
    text: Option<String>,
    anchor: bool,
    attached: bool,
    badge: Option<Badge>,
}

#[derive(Default)]
struct Inner {
    order: Vec<PostId>,
    posts: HashMap<PostId, SimPost>,
}

/// In-memory feed surface used by the replay binary and the tests. Emits a
/// mutation notification for every structural change, like a live feed would.
pub struct SimFeed {
    inner: Mutex<Inner>,
    mutations: mpsc::UnboundedSender<Mutation>,
}

impl SimFeed {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Mutation>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let feed = Arc::new(Self {
            inner: Mutex::new(Inner::default()),
            mutations: tx,
        });
        (feed, rx)
    }

    pub fn insert(&self, id: PostId, text: Option<&str>, anchor: bool) {
        let mut inner = self.inner.lock();
        inner.order.push(id.clone());
        inner.posts.insert(
            id,
            SimPost {
                text: text.map(str::to_string),
                anchor,
                attached: true,
                badge: None,
            },
        );
        drop(inner);
        let _ = self.mutations.send(Mutation::NodesAdded);
    }

    pub fn remove(&self, id: &PostId) {
        let mut inner = self.inner.lock();
        if let Some(post) = inner.posts.get_mut(id) {
            post.attached = false;
            post.badge = None;
        }
        inner.order.retain(|p| p != id);
        drop(inner);
        let _ = self.mutations.send(Mutation::NodesRemoved);
    }

    pub fn badge_of(&self, id: &PostId) -> Option<Badge> {
        self.inner
            .lock()
            .posts
            .get(id)
            .and_then(|post| post.badge.clone())
    }
}

impl FeedSurface for SimFeed {
    fn posts(&self) -> Vec<PostId> {
        self.inner.lock().order.clone()
    }

    fn text_of(&self, post: &PostId) -> Option<String> {
        self.inner
            .lock()
            .posts
            .get(post)
            .and_then(|p| p.text.clone())
    }

    fn is_attached(&self, post: &PostId) -> bool {
        self.inner
            .lock()
            .posts
            .get(post)
            .map(|p| p.attached)
            .unwrap_or(false)
    }

    fn has_anchor(&self, post: &PostId) -> bool {
        self.inner
            .lock()
            .posts
            .get(post)
            .map(|p| p.anchor)
            .unwrap_or(false)
    }

    fn set_badge(&self, post: &PostId, badge: Badge) {
        if let Some(p) = self.inner.lock().posts.get_mut(post) {
            if p.attached {
                p.badge = Some(badge);
            }
        }
    }

    fn clear_badge(&self, post: &PostId) {
        if let Some(p) = self.inner.lock().posts.get_mut(post) {
            p.badge = None;
        }
    }
}
