//! Reconciliation of relational rows and object-store folders into the
//! canonical event list.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;

use crate::domain::demo::demo_events;
use crate::domain::event::{display_name_from_folder, event_prefix, sort_newest_first};
use crate::domain::{Event, Photo, Thumbnail};
use crate::error::GalleryError;
use crate::persistence::{EventRepository, EventRow, PhotoRow};
use crate::storage::legacy_metadata::METADATA_FOLDER;
use crate::storage::{LegacyMetadata, ObjectStorage, list_top_level_folders};

/// Object keys containing this marker are never listed as photos.
const THUMBNAIL_MARKER: &str = "thumbnail";

/// One source of an event before merging.
#[derive(Debug)]
enum SourceRecord {
    /// A row of the relational store with its grouped photo rows.
    Relational { row: EventRow, photos: Vec<Photo> },
    /// A top-level object-store folder with no relational row.
    Folder {
        folder: String,
        photos: Vec<Photo>,
        discovered_at: DateTime<Utc>,
    },
}

impl SourceRecord {
    fn into_event(self) -> Event {
        match self {
            Self::Relational { row, photos } => Event {
                thumbnail: Thumbnail::from_stored(row.thumbnail.as_deref()).or_first_photo(&photos),
                id: row.id,
                name: row.name,
                date: row.date,
                photos,
                visible: row.visible,
            },
            Self::Folder {
                folder,
                photos,
                discovered_at,
            } => Event {
                name: display_name_from_folder(&folder),
                thumbnail: Thumbnail::Placeholder.or_first_photo(&photos),
                id: folder,
                date: discovered_at,
                photos,
                visible: true,
            },
        }
    }
}

/// Builds events from every source of truth.
///
/// Reads only; never mutates either store. All failures on the bulk path
/// are absorbed: an unreachable relational store yields the demo dataset
/// and a failing folder discovery contributes no events.
#[derive(Debug, Clone)]
pub struct Reconciler {
    repo: Arc<dyn EventRepository>,
    storage: Arc<dyn ObjectStorage>,
    legacy: Option<LegacyMetadata>,
}

impl Reconciler {
    /// Creates a reconciler. `legacy` enables lookups in the legacy JSON
    /// metadata record.
    #[must_use]
    pub fn new(
        repo: Arc<dyn EventRepository>,
        storage: Arc<dyn ObjectStorage>,
        legacy: Option<LegacyMetadata>,
    ) -> Self {
        Self {
            repo,
            storage,
            legacy,
        }
    }

    /// Produces the canonical snapshot, newest first.
    ///
    /// Relational rows and folder discovery are fetched concurrently. An id
    /// present in both is taken from the relational row only.
    pub async fn reconcile(&self) -> Vec<Event> {
        let (relational, folders) = tokio::join!(self.relational_records(), self.folder_names());

        let (rows, photos) = match relational {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::error!(error = %e, "relational store unavailable, serving demo events");
                return demo_events();
            }
        };

        let mut grouped = group_photos(photos);
        let covered: HashSet<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        let new_folders: Vec<String> = folders
            .into_iter()
            .filter(|f| !covered.contains(f.as_str()))
            .collect();

        let folder_records = self.folder_records(new_folders).await;

        let mut records: Vec<SourceRecord> = rows
            .into_iter()
            .map(|row| {
                let photos = grouped.remove(&row.id).unwrap_or_default();
                SourceRecord::Relational { row, photos }
            })
            .collect();
        records.extend(folder_records);

        let mut events: Vec<Event> = records.into_iter().map(SourceRecord::into_event).collect();
        sort_newest_first(&mut events);

        tracing::debug!(count = events.len(), "snapshot reconciled");
        events
    }

    /// Looks up one event without going through the snapshot: the
    /// relational row first, then the legacy metadata record.
    ///
    /// Relational failures are logged and treated as a miss.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::EventNotFound`] if no source knows `id`.
    pub async fn event_by_id(&self, id: &str) -> Result<Event, GalleryError> {
        match self.repo.get_event(id).await {
            Ok(row) => {
                let photos = self.event_photos(id, None).await;
                return Ok(SourceRecord::Relational { row, photos }.into_event());
            }
            Err(GalleryError::EventNotFound(_)) => {}
            Err(e) => tracing::warn!(event_id = id, error = %e, "relational lookup failed"),
        }

        if let Some(legacy) = &self.legacy {
            match legacy.find(id).await {
                Ok(Some(record)) => {
                    let photos = self.event_photos(id, None).await;
                    return Ok(record.into_event(photos));
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(event_id = id, error = %e, "legacy metadata lookup failed"),
            }
        }

        Err(GalleryError::EventNotFound(id.to_string()))
    }

    /// Photos of one event in upload order: relational rows if there are
    /// any, otherwise the objects under the event's prefix.
    ///
    /// Never fails; unreachable stores contribute nothing.
    pub async fn event_photos(&self, event_id: &str, limit: Option<usize>) -> Vec<Photo> {
        match self.repo.get_photos_for_event(event_id, limit).await {
            Ok(rows) if !rows.is_empty() => return rows.into_iter().map(Photo::from).collect(),
            Ok(_) => {}
            Err(e) => tracing::warn!(event_id, error = %e, "relational photo query failed"),
        }
        match self.folder_photos(event_id, limit).await {
            Ok(photos) => photos,
            Err(e) => {
                tracing::warn!(event_id, error = %e, "object-store photo listing failed");
                Vec::new()
            }
        }
    }

    async fn relational_records(&self) -> Result<(Vec<EventRow>, Vec<PhotoRow>), GalleryError> {
        let (events, photos) = tokio::join!(self.repo.list_events(), self.repo.list_photos());
        Ok((events?, photos?))
    }

    async fn folder_names(&self) -> Vec<String> {
        match list_top_level_folders(self.storage.as_ref(), &[METADATA_FOLDER]).await {
            Ok(folders) => folders,
            Err(e) => {
                tracing::warn!(error = %e, "folder discovery failed, skipping");
                Vec::new()
            }
        }
    }

    async fn folder_records(&self, folders: Vec<String>) -> Vec<SourceRecord> {
        let discovered_at = Utc::now();
        let listings = join_all(folders.into_iter().map(|folder| async move {
            match self.folder_photos(&folder, None).await {
                Ok(photos) => Some(SourceRecord::Folder {
                    folder,
                    photos,
                    discovered_at,
                }),
                Err(e) => {
                    tracing::warn!(folder = %folder, error = %e, "folder listing failed, skipping");
                    None
                }
            }
        }))
        .await;
        listings.into_iter().flatten().collect()
    }

    async fn folder_photos(
        &self,
        event_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Photo>, GalleryError> {
        let listing = self
            .storage
            .list_object_keys(&event_prefix(event_id), None)
            .await?;
        let photos = listing
            .keys
            .into_iter()
            .filter(|key| !key.contains(THUMBNAIL_MARKER))
            .take(limit.unwrap_or(usize::MAX))
            .map(|key| Photo {
                url: self.storage.resolve_url(&key),
                id: key.clone(),
                filename: key,
            })
            .collect();
        Ok(photos)
    }
}

fn group_photos(photos: Vec<PhotoRow>) -> HashMap<String, Vec<Photo>> {
    let mut grouped: HashMap<String, Vec<Photo>> = HashMap::new();
    for row in photos {
        grouped
            .entry(row.event_id.clone())
            .or_default()
            .push(Photo::from(row));
    }
    grouped
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod tests {
    use std::time::Duration as StdDuration;

    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::Duration;

    use super::*;
    use crate::persistence::MemoryRepository;
    use crate::storage::{BucketStorage, KeyListing, StoredObject, UrlResolver};

    /// Object store whose every call fails.
    #[derive(Debug)]
    pub(crate) struct UnreachableStorage;

    #[async_trait]
    impl ObjectStorage for UnreachableStorage {
        async fn put_object(&self, _: &str, _: Bytes, _: &str) -> Result<String, GalleryError> {
            Err(GalleryError::object("connection refused"))
        }
        async fn get_object(&self, _: &str) -> Result<StoredObject, GalleryError> {
            Err(GalleryError::object("connection refused"))
        }
        async fn delete_object(&self, _: &str) -> Result<(), GalleryError> {
            Err(GalleryError::object("connection refused"))
        }
        async fn delete_objects_by_prefix(&self, _: &str) -> Result<usize, GalleryError> {
            Err(GalleryError::object("connection refused"))
        }
        async fn list_object_keys(
            &self,
            _: &str,
            _: Option<usize>,
        ) -> Result<KeyListing, GalleryError> {
            Err(GalleryError::object("connection refused"))
        }
        fn resolve_url(&self, key: &str) -> String {
            format!("/api/images/{key}")
        }
        async fn signed_url(&self, key: &str, _: StdDuration) -> Result<String, GalleryError> {
            Ok(self.resolve_url(key))
        }
    }

    fn row(id: &str, days: i64) -> EventRow {
        EventRow::new(
            id.to_string(),
            format!("Event {id}"),
            DateTime::<Utc>::UNIX_EPOCH + Duration::days(days),
            &Thumbnail::Placeholder,
        )
    }

    fn setup() -> (MemoryRepository, Arc<dyn ObjectStorage>, Reconciler) {
        let repo = MemoryRepository::new();
        let storage: Arc<dyn ObjectStorage> =
            Arc::new(BucketStorage::in_memory(UrlResolver::proxy()));
        let reconciler = Reconciler::new(
            Arc::new(repo.clone()),
            Arc::clone(&storage),
            Some(LegacyMetadata::new(Arc::clone(&storage))),
        );
        (repo, storage, reconciler)
    }

    async fn put(storage: &Arc<dyn ObjectStorage>, key: &str) {
        let stored = storage
            .put_object(key, Bytes::from_static(b"img"), "image/jpeg")
            .await;
        assert!(stored.is_ok(), "put {key} failed");
    }

    #[tokio::test]
    async fn relational_row_wins_over_same_named_folder() {
        let (repo, storage, reconciler) = setup();
        assert!(repo.insert_event(row("e1", 5)).await.is_ok());
        put(&storage, "e1/1-a.jpg").await;

        let events = reconciler.reconcile().await;
        assert_eq!(events.iter().filter(|e| e.id == "e1").count(), 1);
        let Some(e1) = events.first() else {
            panic!("snapshot should not be empty");
        };
        assert_eq!(e1.name, "Event e1");
        assert!(e1.photos.is_empty());
    }

    #[tokio::test]
    async fn folder_only_event_is_synthesized() {
        let (_, storage, reconciler) = setup();
        put(&storage, "maria_joao/1-a.jpg").await;
        put(&storage, "maria_joao/2-b.jpg").await;
        put(&storage, "maria_joao/thumbnail.jpg").await;
        put(&storage, "events/metadata.json").await;

        let events = reconciler.reconcile().await;
        assert_eq!(events.len(), 1);
        let Some(event) = events.first() else {
            panic!("folder event expected");
        };
        assert_eq!(event.id, "maria_joao");
        assert_eq!(event.name, "Maria Joao");
        assert!(event.visible);
        assert_eq!(event.photos.len(), 2);
        assert_eq!(
            event.thumbnail,
            Thumbnail::Url("/api/images/maria_joao/1-a.jpg".into())
        );
    }

    #[tokio::test]
    async fn snapshot_is_sorted_newest_first() {
        let (repo, storage, reconciler) = setup();
        for (id, days) in [("a", 3), ("b", 40), ("c", 17)] {
            assert!(repo.insert_event(row(id, days)).await.is_ok());
        }
        put(&storage, "folder/1.jpg").await;

        let events = reconciler.reconcile().await;
        assert_eq!(events.len(), 4);
        assert!(events.windows(2).all(|w| match w {
            [a, b] => a.date >= b.date,
            _ => true,
        }));
    }

    #[tokio::test]
    async fn photos_are_grouped_and_thumbnail_defaults_to_first() {
        let (repo, _, reconciler) = setup();
        assert!(repo.insert_event(row("e1", 1)).await.is_ok());
        for id in ["p1", "p2"] {
            let photo = PhotoRow::new(
                id.to_string(),
                format!("e1/{id}.jpg"),
                format!("/api/images/e1/{id}.jpg"),
                "e1".to_string(),
            );
            assert!(repo.insert_photo(photo).await.is_ok());
        }

        let events = reconciler.reconcile().await;
        let Some(e1) = events.first() else {
            panic!("event expected");
        };
        let ids: Vec<&str> = e1.photos.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
        assert_eq!(e1.thumbnail, Thumbnail::Url("/api/images/e1/p1.jpg".into()));
    }

    #[tokio::test]
    async fn unreachable_relational_store_serves_demo_events() {
        let (repo, _, reconciler) = setup();
        repo.set_available(false);
        assert_eq!(reconciler.reconcile().await, demo_events());
    }

    #[tokio::test]
    async fn failing_folder_discovery_keeps_relational_events() {
        let repo = MemoryRepository::new();
        assert!(repo.insert_event(row("e1", 1)).await.is_ok());
        let reconciler = Reconciler::new(Arc::new(repo), Arc::new(UnreachableStorage), None);

        let events = reconciler.reconcile().await;
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn lookup_falls_back_to_legacy_record() {
        let (_, storage, reconciler) = setup();
        let json = br#"[{"id":"festa","name":"Festa","date":"2024-05-01T00:00:00Z"}]"#;
        let stored = storage
            .put_object("events/metadata.json", Bytes::from_static(json), "application/json")
            .await;
        assert!(stored.is_ok());
        put(&storage, "festa/1-a.jpg").await;

        let Ok(event) = reconciler.event_by_id("festa").await else {
            panic!("legacy event should resolve");
        };
        assert_eq!(event.name, "Festa");
        assert_eq!(event.photos.len(), 1);

        assert!(matches!(
            reconciler.event_by_id("ghost").await,
            Err(GalleryError::EventNotFound(_))
        ));
    }

    #[tokio::test]
    async fn event_photos_fall_back_to_object_listing_with_limit() {
        let (_, storage, reconciler) = setup();
        for key in ["e9/1.jpg", "e9/2.jpg", "e9/3.jpg", "e9/thumbnail.jpg"] {
            put(&storage, key).await;
        }
        let photos = reconciler.event_photos("e9", Some(2)).await;
        assert_eq!(photos.len(), 2);
        assert!(photos.iter().all(|p| p.id == p.filename));
    }
}
