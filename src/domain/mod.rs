pub mod post;
pub mod types;

pub use post::{PostId, WorkItem};
pub use types::{Classification, Likelihood, PostState, QueueSnapshot, Settings, Stats};
