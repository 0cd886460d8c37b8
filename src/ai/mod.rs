mod client;
mod inference;

pub use client::{ClassifierClient, ClassifyError};

use async_trait::async_trait;

use crate::domain::{Classification, Settings};

/// Seam between the analysis worker and the hosted model, so the worker can
/// be exercised with stub classifiers.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        text: &str,
        settings: &Settings,
    ) -> Result<Classification, ClassifyError>;
}
