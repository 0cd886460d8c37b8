use std::env;
use std::time::Duration;

use super::env::{
    AppConfig, ClassifierConfig, ConfigError, DirectoryConfig, FeedConfig, LoggingConfig,
    PipelineConfig,
};

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_key_seed = env::var("BOTLENS_API_KEY").ok().filter(|v| !v.is_empty());

        let classifier_defaults = ClassifierConfig::default();
        let classifier = ClassifierConfig {
            endpoint: env::var("CLASSIFIER_ENDPOINT")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(classifier_defaults.endpoint),
            model: env::var("CLASSIFIER_MODEL").unwrap_or(classifier_defaults.model),
            min_request_interval: duration_ms(
                "CLASSIFIER_MIN_INTERVAL_MS",
                classifier_defaults.min_request_interval,
            )?,
        };

        let pipeline_defaults = PipelineConfig::default();
        let pipeline = PipelineConfig {
            min_post_length: parsed("MIN_POST_LENGTH", pipeline_defaults.min_post_length)?,
            request_gap: duration_ms("QUEUE_GAP_MS", pipeline_defaults.request_gap)?,
            scan_debounce: duration_ms("SCAN_DEBOUNCE_MS", pipeline_defaults.scan_debounce)?,
        };

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            db_filename: env::var("DB_FILENAME").unwrap_or_else(|_| "botlens.db".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        let feed = FeedConfig {
            script_path: env::var("FEED_SCRIPT").unwrap_or_else(|_| "demos/feed.jsonl".to_string()),
        };

        Ok(Self {
            api_key_seed,
            classifier,
            pipeline,
            directories,
            logging,
            feed,
        })
    }
}

fn duration_ms(key: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    Ok(Duration::from_millis(parsed(key, default.as_millis() as u64)?))
}

fn parsed<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid(key, raw)),
        _ => Ok(default),
    }
}
