//! Gallery service: multi-step mutations across both stores and the read
//! entry points behind the snapshot cache.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;

use super::SnapshotCache;
use crate::domain::event::{event_prefix, parse_event_date, validate_name};
use crate::domain::ids::{new_event_id, new_photo_id, validate_event_id};
use crate::domain::upload::{thumbnail_object_key, validate_batch};
use crate::domain::{Event, Photo, PhotoUpload, Thumbnail};
use crate::error::GalleryError;
use crate::persistence::{EventPatch, EventRepository, EventRow, PhotoRow};
use crate::storage::{LegacyMetadata, ObjectStorage};

/// Lifetime of download URLs handed out by
/// [`GalleryService::photo_download_url`].
pub const DOWNLOAD_URL_TTL: Duration = Duration::from_secs(3600);

/// Where a deleted event's record lived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionSource {
    /// A relational row (photo rows cascaded).
    Relational,
    /// An entry of the legacy metadata record.
    LegacyMetadata,
    /// Only object-store folder contents; no record existed.
    ObjectStoreOnly,
}

/// Outcome of [`GalleryService::delete_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDeletion {
    /// Objects removed under the event prefix.
    pub objects_removed: usize,
    /// Record that was removed.
    pub source: DeletionSource,
    /// The object-store cleanup failed and objects may remain.
    pub cleanup_failed: bool,
}

/// Coordinates every mutation across the relational store and the object
/// store, then invalidates the snapshot cache.
///
/// Each mutation is a fixed sequence of steps. A failing step aborts the
/// rest; completed steps are never rolled back. When one store was already
/// changed the error is [`GalleryError::PartialFailure`].
#[derive(Debug, Clone)]
pub struct GalleryService {
    repo: Arc<dyn EventRepository>,
    storage: Arc<dyn ObjectStorage>,
    cache: Arc<SnapshotCache>,
    legacy: Option<LegacyMetadata>,
}

impl GalleryService {
    /// Creates a new `GalleryService`.
    #[must_use]
    pub fn new(
        repo: Arc<dyn EventRepository>,
        storage: Arc<dyn ObjectStorage>,
        cache: Arc<SnapshotCache>,
        legacy: Option<LegacyMetadata>,
    ) -> Self {
        Self {
            repo,
            storage,
            cache,
            legacy,
        }
    }

    /// Returns a reference to the snapshot cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }

    /// Returns a reference to the object store.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn ObjectStorage> {
        &self.storage
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Every event of the snapshot, including hidden ones.
    pub async fn list_events(&self, force_refresh: bool) -> Arc<Vec<Event>> {
        self.cache.get_snapshot(force_refresh).await
    }

    /// Visible events of the snapshot.
    pub async fn list_public_events(&self) -> Vec<Event> {
        self.cache.visible_events(false).await
    }

    /// Looks up one event directly in the stores, bypassing the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::EventNotFound`] if neither the relational
    /// store nor the legacy record knows `id`.
    pub async fn get_event(&self, id: &str) -> Result<Event, GalleryError> {
        self.cache.reconciler().event_by_id(id).await
    }

    /// Photos of one event in upload order, at most `limit`.
    pub async fn event_photos(&self, event_id: &str, limit: Option<usize>) -> Vec<Photo> {
        self.cache.reconciler().event_photos(event_id, limit).await
    }

    /// Time-limited download URL for one photo of an event.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::PhotoNotFound`] if the event has no such
    /// photo, or [`GalleryError::StoreUnavailable`] if signing fails.
    pub async fn photo_download_url(
        &self,
        event_id: &str,
        photo_id: &str,
    ) -> Result<String, GalleryError> {
        let photo = self
            .event_photos(event_id, None)
            .await
            .into_iter()
            .find(|p| p.id == photo_id)
            .ok_or_else(|| GalleryError::PhotoNotFound(photo_id.to_string()))?;
        self.storage
            .signed_url(&photo.filename, DOWNLOAD_URL_TTL)
            .await
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Creates an event. A supplied thumbnail is uploaded first, then the
    /// row is inserted.
    ///
    /// # Errors
    ///
    /// - [`GalleryError::Validation`] for a bad name, date or thumbnail,
    ///   before any I/O.
    /// - [`GalleryError::StoreUnavailable`] if the first store step fails.
    /// - [`GalleryError::PartialFailure`] if the thumbnail was stored but
    ///   the row insert failed.
    pub async fn create_event(
        &self,
        name: &str,
        date: &str,
        thumbnail: Option<PhotoUpload>,
    ) -> Result<Event, GalleryError> {
        let name = validate_name(name)?;
        let date = parse_event_date(date)?;
        if let Some(file) = &thumbnail {
            file.validate()?;
        }

        let id = new_event_id();
        let (thumbnail, thumbnail_key) = match thumbnail {
            Some(file) => {
                let key = thumbnail_object_key(&id);
                let url = self
                    .storage
                    .put_object(&key, file.bytes, &file.content_type)
                    .await?;
                (Thumbnail::Url(url), Some(key))
            }
            None => (Thumbnail::Placeholder, None),
        };

        let row = EventRow::new(id, name, date, &thumbnail);
        let stored = self.repo.insert_event(row).await.map_err(|e| match &thumbnail_key {
            Some(key) => GalleryError::PartialFailure {
                completed: format!("thumbnail stored at {key}"),
                failed: format!("event row insert: {e}"),
            },
            None => e,
        })?;

        self.cache.invalidate().await;
        tracing::info!(event_id = %stored.id, name = %stored.name, "event created");

        Ok(Event {
            id: stored.id,
            name: stored.name,
            date: stored.date,
            thumbnail: Thumbnail::from_stored(stored.thumbnail.as_deref()),
            photos: Vec::new(),
            visible: stored.visible,
        })
    }

    /// Applies a partial update to an event row.
    ///
    /// # Errors
    ///
    /// - [`GalleryError::Validation`] for an empty patch or a bad name.
    /// - [`GalleryError::EventNotFound`] if there is no such row.
    /// - [`GalleryError::StoreUnavailable`] on store failure.
    pub async fn update_event(&self, id: &str, patch: EventPatch) -> Result<Event, GalleryError> {
        if patch.is_empty() {
            return Err(GalleryError::Validation("no fields to update".to_string()));
        }
        let patch = EventPatch {
            name: patch.name.as_deref().map(validate_name).transpose()?,
            ..patch
        };

        let row = self.repo.update_event(id, &patch).await?;
        self.cache.invalidate().await;
        tracing::info!(event_id = id, "event updated");

        let photos = self.event_photos(id, None).await;
        Ok(Event {
            thumbnail: Thumbnail::from_stored(row.thumbnail.as_deref()).or_first_photo(&photos),
            id: row.id,
            name: row.name,
            date: row.date,
            photos,
            visible: row.visible,
        })
    }

    /// Uploads one photo to an event.
    ///
    /// # Errors
    ///
    /// See [`GalleryService::upload_event_photos`].
    pub async fn upload_event_photo(
        &self,
        event_id: &str,
        file: PhotoUpload,
    ) -> Result<Photo, GalleryError> {
        let mut photos = self.upload_event_photos(event_id, vec![file]).await?;
        photos
            .pop()
            .ok_or_else(|| GalleryError::Internal("upload produced no photo".to_string()))
    }

    /// Uploads a batch of photos to an event.
    ///
    /// Every file is validated before anything is stored; one bad file
    /// rejects the batch. Files are then stored concurrently, each as an
    /// object upload followed by a row insert.
    ///
    /// # Errors
    ///
    /// - [`GalleryError::Validation`] for a bad id or any bad file.
    /// - [`GalleryError::EventNotFound`] if the event has no row.
    /// - The first per-file failure otherwise; photos stored before it
    ///   remain. A file whose object was stored but whose row insert
    ///   failed reports [`GalleryError::PartialFailure`].
    pub async fn upload_event_photos(
        &self,
        event_id: &str,
        files: Vec<PhotoUpload>,
    ) -> Result<Vec<Photo>, GalleryError> {
        validate_event_id(event_id)?;
        validate_batch(&files)?;
        self.repo.get_event(event_id).await?;

        let results = join_all(files.into_iter().map(|file| self.store_photo(event_id, file))).await;
        self.cache.invalidate().await;

        let photos = results.into_iter().collect::<Result<Vec<Photo>, GalleryError>>()?;
        tracing::info!(event_id, count = photos.len(), "photos uploaded");
        Ok(photos)
    }

    async fn store_photo(&self, event_id: &str, file: PhotoUpload) -> Result<Photo, GalleryError> {
        let photo_id = new_photo_id();
        let key = file.object_key(event_id, &photo_id);
        let url = self
            .storage
            .put_object(&key, file.bytes, &file.content_type)
            .await?;

        let row = PhotoRow::new(photo_id, key.clone(), url, event_id.to_string());
        let stored = self.repo.insert_photo(row).await.map_err(|e| {
            tracing::warn!(event_id, key = %key, error = %e, "photo row insert failed, object orphaned");
            GalleryError::PartialFailure {
                completed: format!("object stored at {key}"),
                failed: format!("photo row insert: {e}"),
            }
        })?;
        Ok(Photo::from(stored))
    }

    /// Deletes one photo: the row first, then the object it names.
    ///
    /// # Errors
    ///
    /// - [`GalleryError::PhotoNotFound`] if no row with `photo_id` belongs
    ///   to `event_id`.
    /// - [`GalleryError::StoreUnavailable`] if the row step fails.
    /// - [`GalleryError::PartialFailure`] if the row was deleted but the
    ///   object delete failed.
    pub async fn delete_event_photo(
        &self,
        event_id: &str,
        photo_id: &str,
    ) -> Result<(), GalleryError> {
        let row = self.repo.get_photo(photo_id).await?;
        if row.event_id != event_id {
            return Err(GalleryError::PhotoNotFound(photo_id.to_string()));
        }

        self.repo.delete_photo(photo_id).await?;
        let object = self.storage.delete_object(&row.filename).await;
        self.cache.invalidate().await;

        if let Err(e) = object {
            tracing::warn!(event_id, photo_id, key = %row.filename, error = %e, "photo object delete failed");
            return Err(GalleryError::PartialFailure {
                completed: format!("photo row {photo_id} deleted"),
                failed: format!("object delete {}: {e}", row.filename),
            });
        }

        tracing::info!(event_id, photo_id, "photo deleted");
        Ok(())
    }

    /// Deletes an event with all of its photos from both stores.
    ///
    /// Objects under the event prefix are removed first, best-effort. The
    /// relational row is deleted next; an event with no row is removed from
    /// the legacy record instead. The cache is invalidated in every case.
    ///
    /// # Errors
    ///
    /// - [`GalleryError::Validation`] for an unusable id.
    /// - [`GalleryError::StoreUnavailable`] if the relational delete, or
    ///   the legacy record update, fails before any object was removed.
    /// - [`GalleryError::PartialFailure`] if objects were removed but the
    ///   record step then failed.
    pub async fn delete_event(&self, event_id: &str) -> Result<EventDeletion, GalleryError> {
        validate_event_id(event_id)?;

        let (objects_removed, cleanup_failed) =
            match self.storage.delete_objects_by_prefix(&event_prefix(event_id)).await {
                Ok(count) => (count, false),
                Err(e) => {
                    tracing::warn!(event_id, error = %e, "object cleanup failed, continuing");
                    (0, true)
                }
            };

        let source = self.delete_event_record(event_id).await;
        self.cache.invalidate().await;
        let source = source.map_err(|e| {
            if objects_removed == 0 {
                return e;
            }
            tracing::warn!(event_id, objects_removed, error = %e, "objects removed but event record kept");
            GalleryError::PartialFailure {
                completed: format!(
                    "{objects_removed} objects removed under {}",
                    event_prefix(event_id)
                ),
                failed: format!("event record delete: {e}"),
            }
        })?;

        tracing::info!(event_id, objects_removed, ?source, "event deleted");
        Ok(EventDeletion {
            objects_removed,
            source,
            cleanup_failed,
        })
    }

    async fn delete_event_record(&self, event_id: &str) -> Result<DeletionSource, GalleryError> {
        match self.repo.delete_event(event_id).await {
            Ok(()) => return Ok(DeletionSource::Relational),
            Err(GalleryError::EventNotFound(_)) => {}
            Err(e) => return Err(e),
        }
        match &self.legacy {
            Some(legacy) if legacy.remove(event_id).await? => Ok(DeletionSource::LegacyMetadata),
            _ => Ok(DeletionSource::ObjectStoreOnly),
        }
    }
}
