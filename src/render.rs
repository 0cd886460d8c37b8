use std::sync::Arc;

use crate::domain::{Classification, Likelihood, PostId};
use crate::feed::FeedSurface;

/// Where a badge sits on the post: next to the post's anchor element when the
/// surface exposes one, otherwise overlaid on the post itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Anchor,
    Overlay,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadgeKind {
    Loading,
    Verdict(Likelihood),
}

/// A badge plus its optional tooltip. The tooltip is owned by the badge, so
/// replacing or clearing the badge always takes the tooltip with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub kind: BadgeKind,
    pub label: String,
    pub color: &'static str,
    pub tooltip: Option<String>,
    pub placement: Placement,
}

fn color_for(likelihood: Likelihood) -> &'static str {
    match likelihood {
        Likelihood::Low => "#2e7d32",
        Likelihood::Medium => "#f9a825",
        Likelihood::High => "#ef6c00",
        Likelihood::Certain => "#c62828",
    }
}

/// Renders per-post badge state through the feed surface. At most one badge
/// per post at any time: loading while a request is in flight, a verdict once
/// classification completes, nothing after an error.
pub struct BadgeRenderer {
    surface: Arc<dyn FeedSurface>,
}

impl BadgeRenderer {
    pub fn new(surface: Arc<dyn FeedSurface>) -> Self {
        Self { surface }
    }

    fn placement(&self, post: &PostId) -> Placement {
        if self.surface.has_anchor(post) {
            Placement::Anchor
        } else {
            Placement::Overlay
        }
    }

    pub fn show_loading(&self, post: &PostId) {
        let badge = Badge {
            kind: BadgeKind::Loading,
            label: "analyzing…".to_string(),
            color: "#9e9e9e",
            tooltip: None,
            placement: self.placement(post),
        };
        self.surface.set_badge(post, badge);
    }

    pub fn show_verdict(&self, post: &PostId, verdict: &Classification) {
        let badge = Badge {
            kind: BadgeKind::Verdict(verdict.likelihood),
            label: format!("AI: {}", verdict.likelihood.as_str()),
            color: color_for(verdict.likelihood),
            tooltip: Some(verdict.reason.clone()),
            placement: self.placement(post),
        };
        self.surface.set_badge(post, badge);
    }

    pub fn clear(&self, post: &PostId) {
        self.surface.clear_badge(post);
    }
}
