use std::sync::Arc;

use crate::domain::{PostState, WorkItem};
use crate::feed::FeedSurface;
use crate::pipeline::cache::ResultCache;
use crate::pipeline::identity::fingerprint;
use crate::pipeline::queue::AnalysisQueue;
use crate::pipeline::states::StateTable;
use crate::render::BadgeRenderer;

/// Scans the feed for posts not yet taken through the pipeline. Every scan
/// enumerates all attached posts; the state table makes re-scans cheap and
/// guarantees no post is enqueued twice. Cache hits render immediately and
/// never become Work Items.
pub struct PostExtractor {
    surface: Arc<dyn FeedSurface>,
    states: Arc<StateTable>,
    cache: Arc<ResultCache>,
    queue: Arc<AnalysisQueue>,
    renderer: Arc<BadgeRenderer>,
    min_post_length: usize,
}

impl PostExtractor {
    pub fn new(
        surface: Arc<dyn FeedSurface>,
        states: Arc<StateTable>,
        cache: Arc<ResultCache>,
        queue: Arc<AnalysisQueue>,
        renderer: Arc<BadgeRenderer>,
        min_post_length: usize,
    ) -> Self {
        Self {
            surface,
            states,
            cache,
            queue,
            renderer,
            min_post_length,
        }
    }

    pub fn scan(&self) {
        let mut new_posts = 0usize;
        for post in self.surface.posts() {
            if self.states.is_seen(&post) {
                continue;
            }
            new_posts += 1;

            let Some(text) = self.surface.text_of(&post) else {
                self.states.tag(post, PostState::NoText);
                continue;
            };
            let text = text.trim().to_string();

            if text.chars().count() < self.min_post_length {
                self.states.tag(post, PostState::TooShort);
                continue;
            }

            let fingerprint = fingerprint(&text);
            if let Some(verdict) = self.cache.get(&fingerprint) {
                tracing::debug!(
                    target: "extractor",
                    post = %post,
                    fingerprint = %fingerprint,
                    "serving verdict from cache"
                );
                self.renderer.show_verdict(&post, &verdict);
                self.states.tag(post, PostState::Cached);
                continue;
            }

            self.states.tag(post.clone(), PostState::Pending);
            self.queue.push(WorkItem {
                post,
                text,
                fingerprint,
            });
        }

        if new_posts > 0 {
            tracing::debug!(
                target: "extractor",
                new_posts,
                queued = self.queue.snapshot().depth,
                "scan complete"
            );
        }
    }
}
