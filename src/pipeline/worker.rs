use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::ai::Classifier;
use crate::db::SettingsStore;
use crate::domain::{PostState, WorkItem};
use crate::feed::FeedSurface;
use crate::infrastructure::shutdown::ShutdownSignal;
use crate::pipeline::cache::ResultCache;
use crate::pipeline::queue::AnalysisQueue;
use crate::pipeline::states::StateTable;
use crate::render::BadgeRenderer;

/// Single consumer of the analysis queue. Drains one item at a time in FIFO
/// order and sleeps a fixed gap between items; errors are local to one item
/// and never stop the loop.
pub struct AnalysisWorker {
    queue: Arc<AnalysisQueue>,
    surface: Arc<dyn FeedSurface>,
    classifier: Arc<dyn Classifier>,
    cache: Arc<ResultCache>,
    states: Arc<StateTable>,
    renderer: Arc<BadgeRenderer>,
    store: SettingsStore,
    request_gap: Duration,
}

impl AnalysisWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<AnalysisQueue>,
        surface: Arc<dyn FeedSurface>,
        classifier: Arc<dyn Classifier>,
        cache: Arc<ResultCache>,
        states: Arc<StateTable>,
        renderer: Arc<BadgeRenderer>,
        store: SettingsStore,
        request_gap: Duration,
    ) -> Self {
        Self {
            queue,
            surface,
            classifier,
            cache,
            states,
            renderer,
            store,
            request_gap,
        }
    }

    pub fn spawn(self: Arc<Self>, mut shutdown: ShutdownSignal) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run_loop(&mut shutdown).await;
            tracing::info!(target: "worker", "analysis worker stopped");
        })
    }

    async fn run_loop(&self, shutdown: &mut ShutdownSignal) {
        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let Some(item) = self.queue.pop() else {
                tokio::select! {
                    _ = self.queue.wait_for_work() => {}
                    _ = shutdown.cancelled() => break,
                }
                continue;
            };

            self.process(item, shutdown).await;

            tokio::select! {
                _ = sleep(self.request_gap) => {}
                _ = shutdown.cancelled() => break,
            }
        }
    }

    async fn process(&self, item: WorkItem, shutdown: &mut ShutdownSignal) {
        if !self.surface.is_attached(&item.post) {
            tracing::debug!(
                target: "worker",
                post = %item.post,
                "post left the feed before analysis; discarding"
            );
            return;
        }

        self.renderer.show_loading(&item.post);

        let settings = match self.store.settings().await {
            Ok(settings) => settings,
            Err(err) => {
                tracing::error!(target: "worker", error = %err, "failed to read settings");
                self.renderer.clear(&item.post);
                self.states.tag(item.post, PostState::Error);
                return;
            }
        };

        let result = tokio::select! {
            res = self.classifier.classify(&item.text, &settings) => res,
            _ = shutdown.cancelled() => {
                self.renderer.clear(&item.post);
                return;
            }
        };

        match result {
            Ok(verdict) => {
                self.cache.put(item.fingerprint.clone(), verdict.clone());
                if let Err(err) = self.store.record(verdict.likelihood).await {
                    tracing::warn!(target: "worker", error = %err, "failed to record stats");
                }
                // A post removed mid-request keeps the cache and stats
                // writes; only the badge and the complete tag are skipped.
                if self.surface.is_attached(&item.post) {
                    self.renderer.show_verdict(&item.post, &verdict);
                    self.states.tag(item.post.clone(), PostState::Complete);
                }
                tracing::info!(
                    target: "worker",
                    post = %item.post,
                    likelihood = verdict.likelihood.as_str(),
                    "post classified"
                );
            }
            Err(err) => {
                self.renderer.clear(&item.post);
                self.states.tag(item.post.clone(), PostState::Error);
                if err.is_configuration() {
                    tracing::warn!(target: "worker", post = %item.post, error = %err, "classification skipped");
                } else {
                    tracing::error!(target: "worker", post = %item.post, error = %err, "classification failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ClassifyError;
    use crate::domain::{Classification, Likelihood, PostId, Settings};
    use crate::feed::sim::SimFeed;
    use crate::infrastructure::shutdown::Shutdown;
    use crate::pipeline::identity::fingerprint;
    use crate::render::BadgeKind;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use reqwest::StatusCode;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    enum StubMode {
        Verdict(Likelihood),
        Status(StatusCode),
    }

    struct StubClassifier {
        mode: StubMode,
        calls: AtomicUsize,
        call_times: Mutex<Vec<Instant>>,
    }

    impl StubClassifier {
        fn new(mode: StubMode) -> Arc<Self> {
            Arc::new(Self {
                mode,
                calls: AtomicUsize::new(0),
                call_times: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Classifier for StubClassifier {
        async fn classify(
            &self,
            _text: &str,
            _settings: &Settings,
        ) -> Result<Classification, ClassifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.call_times.lock().push(Instant::now());
            match &self.mode {
                StubMode::Verdict(likelihood) => Ok(Classification {
                    likelihood: *likelihood,
                    reason: "stub".into(),
                }),
                StubMode::Status(status) => Err(ClassifyError::Status(*status)),
            }
        }
    }

    struct Fixture {
        feed: Arc<SimFeed>,
        queue: Arc<AnalysisQueue>,
        cache: Arc<ResultCache>,
        states: Arc<StateTable>,
        store: SettingsStore,
        worker: Arc<AnalysisWorker>,
    }

    // These tests run on real time: with tokio's clock paused, the runtime
    // auto-advances past sqlx's pool acquire timeout while the sqlite worker
    // thread (a plain OS thread) is still responding, so every pool acquire
    // fails with PoolTimedOut.
    const GAP: Duration = Duration::from_millis(500);

    async fn fixture(classifier: Arc<dyn Classifier>) -> Fixture {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::apply_schema(&pool).await.unwrap();
        let store = SettingsStore::new(pool);
        store.set_api_key("sk-test").await.unwrap();

        let (feed, _mutations) = SimFeed::new();
        let queue = Arc::new(AnalysisQueue::new());
        let cache = Arc::new(ResultCache::new());
        let states = Arc::new(StateTable::new());
        let renderer = Arc::new(BadgeRenderer::new(feed.clone() as Arc<dyn FeedSurface>));
        let worker = Arc::new(AnalysisWorker::new(
            queue.clone(),
            feed.clone(),
            classifier,
            cache.clone(),
            states.clone(),
            renderer,
            store.clone(),
            GAP,
        ));
        Fixture {
            feed,
            queue,
            cache,
            states,
            store,
            worker,
        }
    }

    fn item(id: &str, text: &str) -> WorkItem {
        WorkItem {
            post: PostId::new(id),
            text: text.to_string(),
            fingerprint: fingerprint(text),
        }
    }

    async fn run_until_drained(fx: &Fixture) {
        let shutdown = Shutdown::new();
        let handle = fx.worker.clone().spawn(shutdown.subscribe());
        while fx.queue.snapshot().depth > 0 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        // One extra gap so the in-flight item finishes.
        tokio::time::sleep(GAP * 4).await;
        shutdown.trigger();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn success_caches_renders_and_records() {
        let classifier = StubClassifier::new(StubMode::Verdict(Likelihood::High));
        let fx = fixture(classifier.clone()).await;
        let text = "Breaking: this isn't just news. It's a revolution.";
        fx.feed.insert(PostId::new("p1"), Some(text), true);
        fx.states.tag(PostId::new("p1"), PostState::Pending);
        fx.queue.push(item("p1", text));

        run_until_drained(&fx).await;

        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fx.states.get(&PostId::new("p1")), Some(PostState::Complete));
        assert_eq!(
            fx.cache.get(&fingerprint(text)).unwrap().likelihood,
            Likelihood::High
        );
        let badge = fx.feed.badge_of(&PostId::new("p1")).unwrap();
        assert_eq!(badge.kind, BadgeKind::Verdict(Likelihood::High));
        assert_eq!(fx.store.stats().await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn detached_post_is_discarded_without_a_request() {
        let classifier = StubClassifier::new(StubMode::Verdict(Likelihood::Low));
        let fx = fixture(classifier.clone()).await;
        fx.feed.insert(PostId::new("gone"), Some("some text"), true);
        fx.states.tag(PostId::new("gone"), PostState::Pending);
        fx.queue.push(item("gone", "a post that will be deleted"));
        fx.feed.remove(&PostId::new("gone"));

        run_until_drained(&fx).await;

        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
        assert!(fx.feed.badge_of(&PostId::new("gone")).is_none());
        assert_eq!(fx.states.get(&PostId::new("gone")), Some(PostState::Pending));
        assert_eq!(fx.store.stats().await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn provider_error_tags_error_without_badge_cache_or_stats() {
        let classifier = StubClassifier::new(StubMode::Status(StatusCode::UNAUTHORIZED));
        let fx = fixture(classifier.clone()).await;
        let text = "a perfectly reasonable post that fails to classify";
        fx.feed.insert(PostId::new("p1"), Some(text), true);
        fx.states.tag(PostId::new("p1"), PostState::Pending);
        fx.queue.push(item("p1", text));

        run_until_drained(&fx).await;

        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fx.states.get(&PostId::new("p1")), Some(PostState::Error));
        assert!(fx.feed.badge_of(&PostId::new("p1")).is_none());
        assert!(fx.cache.get(&fingerprint(text)).is_none());
        assert_eq!(fx.store.stats().await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn items_are_processed_in_order_with_the_full_gap_between() {
        let classifier = StubClassifier::new(StubMode::Verdict(Likelihood::Medium));
        let fx = fixture(classifier.clone()).await;
        for (id, text) in [
            ("p1", "the first post, long enough to analyze"),
            ("p2", "the second post, long enough to analyze"),
            ("p3", "the third post, long enough to analyze"),
        ] {
            fx.feed.insert(PostId::new(id), Some(text), true);
            fx.states.tag(PostId::new(id), PostState::Pending);
            fx.queue.push(item(id, text));
        }

        run_until_drained(&fx).await;

        assert_eq!(classifier.calls.load(Ordering::SeqCst), 3);
        let times = classifier.call_times.lock();
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= GAP);
        }
        assert_eq!(fx.store.stats().await.unwrap().count(Likelihood::Medium), 3);
    }

    #[tokio::test]
    async fn detached_mid_request_still_caches_but_does_not_render() {
        struct DetachingClassifier {
            feed: Arc<SimFeed>,
        }

        #[async_trait]
        impl Classifier for DetachingClassifier {
            async fn classify(
                &self,
                _text: &str,
                _settings: &Settings,
            ) -> Result<Classification, ClassifyError> {
                // The post disappears while the request is in flight.
                self.feed.remove(&PostId::new("p1"));
                Ok(Classification {
                    likelihood: Likelihood::Certain,
                    reason: "stub".into(),
                })
            }
        }

        let (feed, _mutations) = SimFeed::new();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::apply_schema(&pool).await.unwrap();
        let store = SettingsStore::new(pool);
        store.set_api_key("sk-test").await.unwrap();

        let queue = Arc::new(AnalysisQueue::new());
        let cache = Arc::new(ResultCache::new());
        let states = Arc::new(StateTable::new());
        let renderer = Arc::new(BadgeRenderer::new(feed.clone() as Arc<dyn FeedSurface>));
        let worker = Arc::new(AnalysisWorker::new(
            queue.clone(),
            feed.clone(),
            Arc::new(DetachingClassifier { feed: feed.clone() }),
            cache.clone(),
            states.clone(),
            renderer,
            store.clone(),
            GAP,
        ));

        let text = "a post that vanishes during classification";
        feed.insert(PostId::new("p1"), Some(text), true);
        states.tag(PostId::new("p1"), PostState::Pending);
        queue.push(item("p1", text));

        let shutdown = Shutdown::new();
        let handle = worker.spawn(shutdown.subscribe());
        tokio::time::sleep(GAP * 4).await;
        shutdown.trigger();
        handle.await.unwrap();

        assert!(cache.get(&fingerprint(text)).is_some());
        assert_eq!(store.stats().await.unwrap().total, 1);
        assert!(feed.badge_of(&PostId::new("p1")).is_none());
        assert_eq!(states.get(&PostId::new("p1")), Some(PostState::Pending));
    }
}
