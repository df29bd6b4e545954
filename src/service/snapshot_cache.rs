//! Time-boxed memoization of the canonical snapshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use super::Reconciler;
use crate::domain::Event;

/// Default time-to-live of a snapshot.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug)]
struct CacheEntry {
    snapshot: Arc<Vec<Event>>,
    fetched_at: Instant,
}

/// Process-wide snapshot slot in front of the [`Reconciler`].
///
/// Constructed once and shared; mutators call [`SnapshotCache::invalidate`].
/// Concurrent misses may reconcile twice and the last write wins. A
/// reconciliation that was already running when the slot was invalidated
/// returns its result to its caller but does not store it.
#[derive(Debug)]
pub struct SnapshotCache {
    reconciler: Reconciler,
    ttl: Duration,
    slot: RwLock<Option<CacheEntry>>,
    generation: AtomicU64,
    reconciliations: AtomicU64,
}

impl SnapshotCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(reconciler: Reconciler, ttl: Duration) -> Self {
        Self {
            reconciler,
            ttl,
            slot: RwLock::new(None),
            generation: AtomicU64::new(0),
            reconciliations: AtomicU64::new(0),
        }
    }

    /// The reconciler behind this cache.
    #[must_use]
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Configured time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of reconciliations run so far.
    #[must_use]
    pub fn reconciliations(&self) -> u64 {
        self.reconciliations.load(Ordering::SeqCst)
    }

    /// Returns the cached snapshot while it is younger than the TTL,
    /// otherwise reconciles and stores a fresh one. `force_refresh` always
    /// reconciles.
    pub async fn get_snapshot(&self, force_refresh: bool) -> Arc<Vec<Event>> {
        if !force_refresh {
            let slot = self.slot.read().await;
            if let Some(entry) = slot.as_ref()
                && entry.fetched_at.elapsed() < self.ttl
            {
                tracing::debug!(count = entry.snapshot.len(), "snapshot cache hit");
                return Arc::clone(&entry.snapshot);
            }
        }

        tracing::debug!(force_refresh, "snapshot cache miss, reconciling");
        let generation = self.generation.load(Ordering::SeqCst);
        self.reconciliations.fetch_add(1, Ordering::SeqCst);
        let snapshot = Arc::new(self.reconciler.reconcile().await);

        let mut slot = self.slot.write().await;
        if self.generation.load(Ordering::SeqCst) == generation {
            *slot = Some(CacheEntry {
                snapshot: Arc::clone(&snapshot),
                fetched_at: Instant::now(),
            });
        } else {
            tracing::debug!("slot invalidated during reconciliation, not storing");
        }
        snapshot
    }

    /// Empties the slot. The next [`SnapshotCache::get_snapshot`] call
    /// reconciles.
    pub async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.slot.write().await = None;
        tracing::debug!("snapshot cache invalidated");
    }

    /// Events of the snapshot with `visible` set.
    pub async fn visible_events(&self, force_refresh: bool) -> Vec<Event> {
        self.get_snapshot(force_refresh)
            .await
            .iter()
            .filter(|e| e.visible)
            .cloned()
            .collect()
    }

    /// The snapshot's event with `id`, if any.
    pub async fn find_event(&self, id: &str) -> Option<Event> {
        self.get_snapshot(false)
            .await
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use tokio::sync::Notify;

    use super::*;
    use crate::domain::Thumbnail;
    use crate::error::GalleryError;
    use crate::persistence::{EventPatch, EventRepository, EventRow, MemoryRepository, PhotoRow};
    use crate::storage::{BucketStorage, ObjectStorage, UrlResolver};

    /// Holds the first `list_events` call until `release` is notified.
    #[derive(Debug, Default)]
    struct GatedRepository {
        inner: MemoryRepository,
        armed: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl EventRepository for GatedRepository {
        async fn list_events(&self) -> Result<Vec<EventRow>, GalleryError> {
            if self.armed.swap(false, Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.list_events().await
        }

        async fn list_photos(&self) -> Result<Vec<PhotoRow>, GalleryError> {
            self.inner.list_photos().await
        }

        async fn get_event(&self, id: &str) -> Result<EventRow, GalleryError> {
            self.inner.get_event(id).await
        }

        async fn get_photos_for_event(
            &self,
            event_id: &str,
            limit: Option<usize>,
        ) -> Result<Vec<PhotoRow>, GalleryError> {
            self.inner.get_photos_for_event(event_id, limit).await
        }

        async fn get_photo(&self, id: &str) -> Result<PhotoRow, GalleryError> {
            self.inner.get_photo(id).await
        }

        async fn insert_event(&self, row: EventRow) -> Result<EventRow, GalleryError> {
            self.inner.insert_event(row).await
        }

        async fn update_event(
            &self,
            id: &str,
            patch: &EventPatch,
        ) -> Result<EventRow, GalleryError> {
            self.inner.update_event(id, patch).await
        }

        async fn delete_event(&self, id: &str) -> Result<(), GalleryError> {
            self.inner.delete_event(id).await
        }

        async fn insert_photo(&self, row: PhotoRow) -> Result<PhotoRow, GalleryError> {
            self.inner.insert_photo(row).await
        }

        async fn delete_photo(&self, id: &str) -> Result<(), GalleryError> {
            self.inner.delete_photo(id).await
        }
    }

    const TTL: Duration = Duration::from_secs(300);

    fn cache() -> (MemoryRepository, SnapshotCache) {
        let repo = MemoryRepository::new();
        let storage: Arc<dyn ObjectStorage> =
            Arc::new(BucketStorage::in_memory(UrlResolver::proxy()));
        let reconciler = Reconciler::new(Arc::new(repo.clone()), storage, None);
        (repo, SnapshotCache::new(reconciler, TTL))
    }

    fn row(id: &str) -> EventRow {
        EventRow::new(
            id.to_string(),
            id.to_string(),
            DateTime::<Utc>::UNIX_EPOCH,
            &Thumbnail::Placeholder,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_is_reused_until_ttl_elapses() {
        let (repo, cache) = cache();
        let first = cache.get_snapshot(false).await;
        assert_eq!(cache.reconciliations(), 1);

        assert!(repo.insert_event(row("late")).await.is_ok());

        tokio::time::advance(TTL - Duration::from_millis(1)).await;
        let second = cache.get_snapshot(false).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.reconciliations(), 1);

        tokio::time::advance(Duration::from_millis(2)).await;
        let third = cache.get_snapshot(false).await;
        assert_eq!(cache.reconciliations(), 2);
        assert_eq!(third.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_forces_reconciliation() {
        let (repo, cache) = cache();
        let _ = cache.get_snapshot(false).await;
        assert!(repo.insert_event(row("e1")).await.is_ok());

        cache.invalidate().await;
        let fresh = cache.get_snapshot(false).await;
        assert_eq!(cache.reconciliations(), 2);
        assert_eq!(fresh.len(), 1);
    }

    #[tokio::test]
    async fn reconciliation_overtaken_by_invalidation_is_not_stored() {
        let repo = Arc::new(GatedRepository {
            armed: AtomicBool::new(true),
            ..GatedRepository::default()
        });
        let storage: Arc<dyn ObjectStorage> =
            Arc::new(BucketStorage::in_memory(UrlResolver::proxy()));
        let reconciler = Reconciler::new(
            Arc::clone(&repo) as Arc<dyn EventRepository>,
            storage,
            None,
        );
        let cache = Arc::new(SnapshotCache::new(reconciler, TTL));

        let in_flight = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.get_snapshot(false).await }
        });
        repo.entered.notified().await;

        assert!(repo.inner.insert_event(row("during")).await.is_ok());
        cache.invalidate().await;
        repo.release.notify_one();

        let Ok(stale) = in_flight.await else {
            panic!("reconciliation task failed");
        };
        assert_eq!(stale.len(), 1);
        assert_eq!(cache.reconciliations(), 1);

        let _ = cache.get_snapshot(false).await;
        assert_eq!(cache.reconciliations(), 2);
        let _ = cache.get_snapshot(false).await;
        assert_eq!(cache.reconciliations(), 2);
    }

    #[tokio::test]
    async fn force_refresh_bypasses_fresh_entry() {
        let (_, cache) = cache();
        let _ = cache.get_snapshot(false).await;
        let _ = cache.get_snapshot(true).await;
        assert_eq!(cache.reconciliations(), 2);
    }

    #[tokio::test]
    async fn public_view_hides_invisible_events() {
        let (repo, cache) = cache();
        assert!(repo.insert_event(row("shown")).await.is_ok());
        assert!(repo.insert_event(row("hidden")).await.is_ok());
        let patch = EventPatch {
            visible: Some(false),
            ..EventPatch::default()
        };
        assert!(repo.update_event("hidden", &patch).await.is_ok());

        let visible = cache.visible_events(false).await;
        assert_eq!(visible.len(), 1);
        assert!(cache.find_event("hidden").await.is_some());
        assert!(cache.find_event("missing").await.is_none());
    }
}
