use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use tokio::time::{sleep, Instant};

use crate::ai::inference::{build_request, parse_completion};
use crate::ai::Classifier;
use crate::config::ClassifierConfig;
use crate::domain::{Classification, Settings};

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("analysis disabled")]
    Disabled,
    #[error("no API key configured")]
    MissingApiKey,
    #[error("classifier request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("classifier returned status {0}")]
    Status(StatusCode),
    #[error("classifier response was empty")]
    EmptyResponse,
    #[error("classifier response malformed: {0}")]
    Malformed(String),
    #[error("classifier returned unknown likelihood label: {0}")]
    UnknownLabel(String),
}

impl ClassifyError {
    /// Configuration errors never reached the network and are the caller's
    /// problem, not a provider fault.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ClassifyError::Disabled | ClassifyError::MissingApiKey)
    }
}

/// Stateless request/response client for the hosted model, with one piece of
/// process-wide state: the timestamp of the last outbound request, used to
/// enforce a minimum interval between calls. This is the client's own pacing,
/// separate from the analysis queue's inter-item gap.
pub struct ClassifierClient {
    http: Client,
    config: ClassifierConfig,
    last_request: Mutex<Option<Instant>>,
}

impl ClassifierClient {
    pub fn new(http: Client, config: ClassifierConfig) -> Self {
        Self {
            http,
            config,
            last_request: Mutex::new(None),
        }
    }

    async fn pace(&self) {
        let wait = {
            let last = *self.last_request.lock();
            last.map(|at| {
                self.config
                    .min_request_interval
                    .saturating_sub(at.elapsed())
            })
        };
        if let Some(wait) = wait {
            if wait > Duration::ZERO {
                sleep(wait).await;
            }
        }
        *self.last_request.lock() = Some(Instant::now());
    }
}

#[async_trait]
impl Classifier for ClassifierClient {
    async fn classify(
        &self,
        text: &str,
        settings: &Settings,
    ) -> Result<Classification, ClassifyError> {
        if !settings.enabled {
            return Err(ClassifyError::Disabled);
        }
        let api_key = settings
            .api_key
            .as_deref()
            .ok_or(ClassifyError::MissingApiKey)?;

        self.pace().await;

        let request = build_request(self.config.model.clone(), text);
        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifyError::Status(status));
        }

        let body = response.text().await?;
        parse_completion(&body)
    }
}
