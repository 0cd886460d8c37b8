pub mod cache;
pub mod extractor;
pub mod identity;
pub mod queue;
pub mod states;
pub mod watcher;
pub mod worker;
