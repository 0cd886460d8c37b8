use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::time::sleep;

use crate::domain::PostId;
use crate::feed::sim::SimFeed;
use crate::infrastructure::shutdown::ShutdownSignal;

/// One line of a feed script. Scripts are JSONL; blank lines and `#` comments
/// are skipped.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FeedEvent {
    Add {
        id: String,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        anchor: bool,
    },
    Remove {
        id: String,
    },
    Pause {
        ms: u64,
    },
}

pub async fn load_script(path: &Path) -> Result<Vec<FeedEvent>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read feed script {}", path.display()))?;
    parse_script(&raw).with_context(|| format!("invalid feed script {}", path.display()))
}

pub fn parse_script(raw: &str) -> Result<Vec<FeedEvent>> {
    let mut events = Vec::new();
    for (lineno, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event: FeedEvent = serde_json::from_str(line)
            .with_context(|| format!("line {}: {line}", lineno + 1))?;
        events.push(event);
    }
    Ok(events)
}

/// Applies scripted events to the simulated feed, pausing where the script
/// says to. Each add/remove emits the same mutation a live feed would, so the
/// watcher, extractor, queue and renderer all run exactly as in production.
pub struct ReplayDriver {
    feed: Arc<SimFeed>,
}

impl ReplayDriver {
    pub fn new(feed: Arc<SimFeed>) -> Self {
        Self { feed }
    }

    pub async fn drive(&self, events: Vec<FeedEvent>, shutdown: &mut ShutdownSignal) {
        for event in events {
            if shutdown.is_cancelled() {
                return;
            }
            match event {
                FeedEvent::Add { id, text, anchor } => {
                    tracing::debug!(target: "replay", post = %id, "adding post");
                    self.feed.insert(PostId::new(id), text.as_deref(), anchor);
                }
                FeedEvent::Remove { id } => {
                    tracing::debug!(target: "replay", post = %id, "removing post");
                    self.feed.remove(&PostId::new(id));
                }
                FeedEvent::Pause { ms } => {
                    tokio::select! {
                        _ = sleep(Duration::from_millis(ms)) => {}
                        _ = shutdown.cancelled() => return,
                    }
                }
            }
        }
        tracing::info!(target: "replay", "feed script finished");
    }
}
