//! Creator catalog cache: maps creator id to [`Creator`] record with bounded
//! staleness, backed by an abstract [`CatalogSource`].
//!
//! The cache is write-through on refresh: a new snapshot replaces the
//! previous one atomically via [`arc_swap::ArcSwap`], so readers on any
//! thread always observe a fully-populated snapshot, never a torn one.
//! Refresh runs on a dedicated timer task independent of request threads.

pub mod http;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use scoring::Creator;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog source unavailable: {0}")]
    SourceUnavailable(String),
}

/// Abstract source of the full creator catalog. Implementers may back this
/// with a document store, a static file, or an HTTP endpoint (§6).
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Creator>, CatalogError>;
}

/// An atomically-replaceable view of all known creators, keyed by id.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    by_id: HashMap<String, Creator>,
}

impl CatalogSnapshot {
    fn build(mut creators: Vec<Creator>) -> Self {
        let mut by_id = HashMap::with_capacity(creators.len());
        for creator in creators.drain(..) {
            let normalized = normalize_tags(creator);
            // Invariant: no duplicate ids — last write for a given id wins,
            // matching the "replace previous snapshot" write-through policy.
            by_id.insert(normalized.id.clone(), normalized);
        }
        Self { by_id }
    }

    pub fn get(&self, id: &str) -> Option<&Creator> {
        self.by_id.get(id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Creator> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

fn normalize_tags(mut creator: Creator) -> Creator {
    creator.analysis.primary_niches = creator.analysis.primary_niches.iter().map(|t| t.to_lowercase()).collect();
    creator.analysis.secondary_niches = creator.analysis.secondary_niches.iter().map(|t| t.to_lowercase()).collect();
    creator.analysis.apparent_values = creator.analysis.apparent_values.iter().map(|t| t.to_lowercase()).collect();
    creator.analysis.audience_interests = creator.analysis.audience_interests.iter().map(|t| t.to_lowercase()).collect();
    creator.region = creator.region.to_lowercase();
    creator
}

pub struct CatalogCache {
    source: Arc<dyn CatalogSource>,
    snapshot: ArcSwap<CatalogSnapshot>,
    refresh_ttl: Duration,
    loaded: std::sync::atomic::AtomicBool,
}

impl CatalogCache {
    pub fn new(source: Arc<dyn CatalogSource>, refresh_ttl: Duration) -> Self {
        Self {
            source,
            snapshot: ArcSwap::from_pointee(CatalogSnapshot::default()),
            refresh_ttl,
            loaded: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Populate the cache for the first time. Should be called once at
    /// startup before serving requests.
    pub async fn load(&self) -> Result<(), CatalogError> {
        self.refresh().await
    }

    /// Whether at least one refresh has ever succeeded. Distinguishes a
    /// catalog that is legitimately empty (success, zero matches) from one
    /// that has never been reachable (treated as unavailable by callers).
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(std::sync::atomic::Ordering::Acquire)
    }

    async fn refresh(&self) -> Result<(), CatalogError> {
        let creators = self.source.list_all().await?;
        let snapshot = CatalogSnapshot::build(creators);
        tracing::info!(creators = snapshot.len(), "catalog snapshot refreshed");
        self.snapshot.store(Arc::new(snapshot));
        self.loaded.store(true, std::sync::atomic::Ordering::Release);
        Ok(())
    }

    /// Current snapshot handle. Cheap to clone (`Arc`); hold it for the
    /// duration of a single request so reads are consistent even if a
    /// refresh happens concurrently.
    pub fn current(&self) -> Arc<CatalogSnapshot> {
        self.snapshot.load_full()
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Spawn the dedicated refresh task. Failures are logged and never
    /// invalidate the existing snapshot (§4.6).
    pub fn spawn_refresh_task(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.refresh_ttl);
            interval.tick().await; // first tick fires immediately; load() already ran it once
            loop {
                interval.tick().await;
                if let Err(err) = self.refresh().await {
                    tracing::warn!(error = %err, "catalog refresh failed, keeping stale snapshot");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoring::CreatorAnalysis;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn creator(id: &str, region: &str) -> Creator {
        Creator {
            id: id.into(),
            nickname: id.into(),
            bio: "".into(),
            follower_count: 10,
            heart_count: None,
            region: region.into(),
            analysis: CreatorAnalysis {
                primary_niches: BTreeSet::from(["Finance".to_string()]),
                ..Default::default()
            },
        }
    }

    struct StaticSource(Vec<Creator>);

    #[async_trait::async_trait]
    impl CatalogSource for StaticSource {
        async fn list_all(&self) -> Result<Vec<Creator>, CatalogError> {
            Ok(self.0.clone())
        }
    }

    struct FlakySource {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl CatalogSource for FlakySource {
        async fn list_all(&self) -> Result<Vec<Creator>, CatalogError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Ok(vec![creator("a", "US")])
            } else {
                Err(CatalogError::SourceUnavailable("boom".into()))
            }
        }
    }

    #[tokio::test]
    async fn load_populates_and_normalizes_tags() {
        let cache = CatalogCache::new(Arc::new(StaticSource(vec![creator("a", "US")])), Duration::from_secs(300));
        cache.load().await.unwrap();
        let snap = cache.current();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.get("a").unwrap().region, "us");
        assert!(snap.get("a").unwrap().analysis.primary_niches.contains("finance"));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_stale_snapshot() {
        let cache = CatalogCache::new(Arc::new(FlakySource { calls: AtomicUsize::new(0) }), Duration::from_secs(300));
        cache.load().await.unwrap();
        assert_eq!(cache.current().len(), 1);
        assert!(cache.refresh().await.is_err());
        assert_eq!(cache.current().len(), 1);
    }

    #[tokio::test]
    async fn no_duplicate_ids_last_write_wins() {
        let cache = CatalogCache::new(
            Arc::new(StaticSource(vec![creator("a", "US"), creator("a", "CA")])),
            Duration::from_secs(300),
        );
        cache.load().await.unwrap();
        let snap = cache.current();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.get("a").unwrap().region, "ca");
    }
}
