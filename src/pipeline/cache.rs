use std::collections::HashMap;

use parking_lot::Mutex;

use crate::domain::Classification;
use crate::pipeline::identity::Fingerprint;

/// Session-scoped dedup cache: fingerprint of the post text to the verdict
/// already obtained for it. Never evicted and never invalidated; an edited
/// post gets a new fingerprint, a reverted one hits the old entry again.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<Fingerprint, Classification>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Classification> {
        self.entries.lock().get(fingerprint).cloned()
    }

    pub fn put(&self, fingerprint: Fingerprint, verdict: Classification) {
        self.entries.lock().insert(fingerprint, verdict);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Likelihood;
    use crate::pipeline::identity::fingerprint;

    fn verdict(likelihood: Likelihood) -> Classification {
        Classification {
            likelihood,
            reason: "test".into(),
        }
    }

    #[test]
    fn miss_then_hit() {
        let cache = ResultCache::new();
        let fp = fingerprint("some post");
        assert!(cache.get(&fp).is_none());

        cache.put(fp.clone(), verdict(Likelihood::High));
        let hit = cache.get(&fp).unwrap();
        assert_eq!(hit.likelihood, Likelihood::High);
    }

    #[test]
    fn identical_text_shares_one_entry() {
        let cache = ResultCache::new();
        cache.put(fingerprint("same text"), verdict(Likelihood::Low));
        cache.put(fingerprint("same text"), verdict(Likelihood::Certain));
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.get(&fingerprint("same text")).unwrap().likelihood,
            Likelihood::Certain
        );
    }
}
