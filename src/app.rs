use std::{path::Path, sync::Arc, time::Duration};

use anyhow::Result;
use chrono::Utc;
use reqwest::Client;
use tokio::{
    task::JoinHandle,
    time::{sleep, timeout},
};

use crate::{
    ai::ClassifierClient,
    config::AppConfig,
    db::{self, SettingsStore},
    domain::Likelihood,
    feed::{
        replay::{self, FeedEvent, ReplayDriver},
        sim::SimFeed,
        FeedSurface,
    },
    infrastructure::{directories::ResolvedPaths, shutdown::Shutdown},
    pipeline::{
        cache::ResultCache, extractor::PostExtractor, queue::AnalysisQueue, states::StateTable,
        watcher::FeedWatcher, worker::AnalysisWorker,
    },
    render::BadgeRenderer,
};

pub struct BotlensApp {
    feed: Arc<SimFeed>,
    queue: Arc<AnalysisQueue>,
    cache: Arc<ResultCache>,
    store: SettingsStore,
    extractor: Arc<PostExtractor>,
    worker_handle: JoinHandle<()>,
    watcher_handle: JoinHandle<()>,
    script: Vec<FeedEvent>,
    shutdown: Shutdown,
    config: Arc<AppConfig>,
}

impl BotlensApp {
    pub async fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let pool = db::init_pool(&paths.db_path).await?;
        let store = SettingsStore::new(pool);
        seed_api_key(&store, config.api_key_seed.as_deref()).await?;

        let http_client = Client::builder()
            .user_agent(format!("botlens/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        let classifier = Arc::new(ClassifierClient::new(http_client, config.classifier.clone()));

        let (feed, mutations) = SimFeed::new();
        let surface: Arc<dyn FeedSurface> = feed.clone();
        let renderer = Arc::new(BadgeRenderer::new(surface.clone()));
        let cache = Arc::new(ResultCache::new());
        let states = Arc::new(StateTable::new());
        let queue = Arc::new(AnalysisQueue::new());

        let extractor = Arc::new(PostExtractor::new(
            surface.clone(),
            states.clone(),
            cache.clone(),
            queue.clone(),
            renderer.clone(),
            config.pipeline.min_post_length,
        ));

        let worker = Arc::new(AnalysisWorker::new(
            queue.clone(),
            surface,
            classifier,
            cache.clone(),
            states,
            renderer,
            store.clone(),
            config.pipeline.request_gap,
        ));
        let worker_handle = worker.spawn(shutdown.subscribe());

        let watcher = FeedWatcher::new(extractor.clone(), config.pipeline.scan_debounce);
        let watcher_handle = watcher.spawn(mutations, shutdown.subscribe());

        let script = replay::load_script(Path::new(&config.feed.script_path)).await?;

        Ok(Self {
            feed,
            queue,
            cache,
            store,
            extractor,
            worker_handle,
            watcher_handle,
            script,
            shutdown,
            config,
        })
    }

    pub async fn run(self) -> Result<()> {
        let BotlensApp {
            feed,
            queue,
            cache,
            store,
            extractor,
            mut worker_handle,
            watcher_handle,
            script,
            shutdown,
            config,
        } = self;

        let started_at = Utc::now();
        tracing::info!(
            script = %config.feed.script_path,
            events = script.len(),
            "botlens started"
        );

        // The original scans once at load before any mutation arrives.
        extractor.scan();

        let driver = ReplayDriver::new(feed);
        let mut driver_shutdown = shutdown.subscribe();
        let mut listener = shutdown.subscribe();

        tokio::select! {
            _ = listener.cancelled() => {
                tracing::info!("interrupt received");
            }
            _ = driver.drive(script, &mut driver_shutdown) => {
                // Let the trailing debounce fire, then drain what it queued.
                sleep(config.pipeline.scan_debounce * 2).await;
                while queue.snapshot().depth > 0 && !listener.is_cancelled() {
                    sleep(Duration::from_millis(200)).await;
                }
                sleep(config.pipeline.request_gap * 2).await;
            }
        }

        match store.stats().await {
            Ok(stats) => {
                let breakdown = Likelihood::ALL
                    .iter()
                    .map(|l| format!("{}={}", l.as_str(), stats.count(*l)))
                    .collect::<Vec<_>>()
                    .join(" ");
                tracing::info!(
                    total = stats.total,
                    %breakdown,
                    cache_entries = cache.len(),
                    elapsed_secs = (Utc::now() - started_at).num_seconds(),
                    "session summary"
                );
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to read session stats");
            }
        }

        shutdown.trigger();

        let shutdown_timeout = Duration::from_secs(5);
        if timeout(shutdown_timeout, watcher_handle).await.is_err() {
            tracing::warn!(
                target: "watcher",
                "feed watcher did not stop within {:?}",
                shutdown_timeout
            );
        }

        let worker_sleep = sleep(shutdown_timeout);
        tokio::pin!(worker_sleep);
        tokio::select! {
            res = &mut worker_handle => {
                if let Err(err) = res {
                    if err.is_panic() {
                        tracing::error!(target: "worker", "analysis worker panicked");
                    }
                }
            }
            _ = &mut worker_sleep => {
                tracing::warn!(
                    target: "worker",
                    "analysis worker did not stop within {:?}; aborting",
                    shutdown_timeout
                );
                worker_handle.abort();
            }
        }

        if timeout(shutdown_timeout, store.close()).await.is_err() {
            tracing::warn!(
                target: "db",
                "settings store did not close within {:?}",
                shutdown_timeout
            );
        }

        tracing::info!("botlens stopped");
        Ok(())
    }
}

async fn seed_api_key(store: &SettingsStore, seed: Option<&str>) -> Result<()> {
    if let Some(seed) = seed {
        if store.settings().await?.api_key.is_none() {
            store.set_api_key(seed).await?;
            tracing::info!(target: "db", "seeded API key from environment");
        }
    }
    Ok(())
}
