//! In-memory assessment cache with TTL

use crate::assessment::PlatformAssessment;
use crate::config::CacheConfig;
use moka::future::Cache;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Platform name, ontology content hash and an optional digest of the
/// vendor context the prompt carried
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    platform: String,
    ontology_hash: String,
    context_hash: Option<String>,
}

impl CacheKey {
    pub fn new(platform: &str, ontology_hash: &str, vendor_context: Option<&str>) -> Self {
        Self {
            platform: platform.to_string(),
            ontology_hash: ontology_hash.to_string(),
            context_hash: vendor_context.map(|c| hex::encode(Sha256::digest(c.as_bytes()))),
        }
    }
}

/// Assessments keyed by [`CacheKey`]
#[derive(Clone)]
pub struct AssessmentCache {
    inner: Cache<CacheKey, PlatformAssessment>,
}

impl AssessmentCache {
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }

    /// `None` when caching is disabled
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.ttl(), config.max_entries))
    }

    pub async fn get(&self, key: &CacheKey) -> Option<PlatformAssessment> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: CacheKey, assessment: PlatformAssessment) {
        self.inner.insert(key, assessment).await;
    }

    pub async fn clear(&self) {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks().await;
    }

    pub async fn len(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }
}
