use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

use crate::feed::Mutation;
use crate::infrastructure::shutdown::ShutdownSignal;
use crate::pipeline::extractor::PostExtractor;

/// Watches the feed's mutation stream and triggers a re-scan once the feed
/// has been quiet for the debounce window. Trailing debounce: the timer is
/// armed by the first node-adding mutation and reset by every further one;
/// removals never arm or reset it. Feeds stream in bursts, so scanning per
/// mutation would be wasteful and could pick up half-rendered posts.
pub struct FeedWatcher {
    extractor: Arc<PostExtractor>,
    debounce: Duration,
}

impl FeedWatcher {
    pub fn new(extractor: Arc<PostExtractor>, debounce: Duration) -> Self {
        Self { extractor, debounce }
    }

    pub fn spawn(
        self,
        mutations: mpsc::UnboundedReceiver<Mutation>,
        shutdown: ShutdownSignal,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run(mutations, shutdown).await;
            tracing::info!(target: "watcher", "feed watcher stopped");
        })
    }

    async fn run(
        &self,
        mut mutations: mpsc::UnboundedReceiver<Mutation>,
        mut shutdown: ShutdownSignal,
    ) {
        'idle: loop {
            // Wait for the first mutation that adds nodes.
            loop {
                tokio::select! {
                    mutation = mutations.recv() => match mutation {
                        Some(m) if m.adds_nodes() => break,
                        Some(_) => continue,
                        None => return,
                    },
                    _ = shutdown.cancelled() => return,
                }
            }

            // Debounce window: scan only after a full quiet interval.
            let timer = sleep(self.debounce);
            tokio::pin!(timer);
            loop {
                tokio::select! {
                    _ = &mut timer => {
                        self.extractor.scan();
                        continue 'idle;
                    }
                    mutation = mutations.recv() => match mutation {
                        Some(m) if m.adds_nodes() => {
                            timer.as_mut().reset(Instant::now() + self.debounce);
                        }
                        Some(_) => {}
                        None => {
                            // Feed gone; run the pending scan and stop.
                            self.extractor.scan();
                            return;
                        }
                    },
                    _ = shutdown.cancelled() => return,
                }
            }
        }
    }
}
