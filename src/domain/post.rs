use crate::pipeline::identity::Fingerprint;

/// Stable identity of a rendered post, assigned by the feed surface.
/// Opaque to the pipeline; only used as a map key and capability argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostId(pub String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One unit of classification work: created on a cache miss, consumed once.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub post: PostId,
    pub text: String,
    pub fingerprint: Fingerprint,
}
