use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Seed credential from the environment; written into the settings store
    /// at startup when the store has none.
    pub api_key_seed: Option<String>,
    pub classifier: ClassifierConfig,
    pub pipeline: PipelineConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
    pub feed: FeedConfig,
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub model: String,
    pub min_request_interval: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.cerebras.ai/v1/chat/completions".to_string(),
            model: "gpt-oss-120b".to_string(),
            min_request_interval: Duration::from_millis(1_000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Posts shorter than this are tagged too-short and never enqueued.
    pub min_post_length: usize,
    /// Unconditional pause between queue items, on top of client pacing.
    pub request_gap: Duration,
    /// Quiet period the feed must hold before a re-scan fires.
    pub scan_debounce: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_post_length: 10,
            request_gap: Duration::from_millis(500),
            scan_debounce: Duration::from_millis(800),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub data_dir: String,
    pub db_filename: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub script_path: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
