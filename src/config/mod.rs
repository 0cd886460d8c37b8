pub mod env;
mod loader;

pub use env::{AppConfig, ClassifierConfig, DirectoryConfig, FeedConfig, PipelineConfig};
pub use loader::load_config;
