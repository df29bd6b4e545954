//! Legacy JSON metadata record kept in the object store.
//!
//! Object-store-only deployments kept every event as one entry of a JSON
//! array stored at [`EVENTS_METADATA_KEY`]. The record is still consulted
//! for lookups of events that never got a relational row, and is pruned
//! when such an event is deleted.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ObjectStorage;
use crate::domain::{Event, Photo, Thumbnail};
use crate::error::GalleryError;

/// Well-known key of the legacy metadata record.
pub const EVENTS_METADATA_KEY: &str = "events/metadata.json";

/// Folder holding [`EVENTS_METADATA_KEY`]; never an event itself.
pub const METADATA_FOLDER: &str = "events";

/// One event entry of the legacy record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyEventRecord {
    /// Event id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Event date.
    pub date: DateTime<Utc>,
    /// Thumbnail URL, if one was set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Visibility; absent means visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

impl LegacyEventRecord {
    /// Builds the canonical event from this record and its photos.
    #[must_use]
    pub fn into_event(self, photos: Vec<Photo>) -> Event {
        Event {
            id: self.id,
            name: self.name,
            date: self.date,
            thumbnail: Thumbnail::from_stored(self.thumbnail.as_deref()),
            photos,
            visible: self.visible != Some(false),
        }
    }
}

/// Reader/writer for the legacy record.
#[derive(Debug, Clone)]
pub struct LegacyMetadata {
    storage: Arc<dyn ObjectStorage>,
}

impl LegacyMetadata {
    /// Creates a handle over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self { storage }
    }

    /// Loads all records. A missing or unparsable record reads as empty.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::StoreUnavailable`] if the object store
    /// cannot be reached.
    pub async fn load(&self) -> Result<Vec<LegacyEventRecord>, GalleryError> {
        let object = match self.storage.get_object(EVENTS_METADATA_KEY).await {
            Ok(object) => object,
            Err(GalleryError::ObjectNotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        match serde_json::from_slice(&object.bytes) {
            Ok(records) => Ok(records),
            Err(e) => {
                tracing::warn!(error = %e, key = EVENTS_METADATA_KEY, "unparsable legacy metadata, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Replaces the record with `records`.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::StoreUnavailable`] if the write fails, or
    /// [`GalleryError::Internal`] if serialization fails.
    pub async fn save(&self, records: &[LegacyEventRecord]) -> Result<(), GalleryError> {
        let json = serde_json::to_vec_pretty(records)
            .map_err(|e| GalleryError::Internal(format!("legacy metadata encoding: {e}")))?;
        self.storage
            .put_object(EVENTS_METADATA_KEY, Bytes::from(json), "application/json")
            .await?;
        tracing::debug!(count = records.len(), "legacy metadata saved");
        Ok(())
    }

    /// Finds the record for `event_id`.
    ///
    /// # Errors
    ///
    /// Propagates [`LegacyMetadata::load`] failures.
    pub async fn find(&self, event_id: &str) -> Result<Option<LegacyEventRecord>, GalleryError> {
        Ok(self.load().await?.into_iter().find(|r| r.id == event_id))
    }

    /// Removes the record for `event_id`. Returns whether one was removed;
    /// the record is only rewritten when something changed.
    ///
    /// # Errors
    ///
    /// Propagates load and save failures.
    pub async fn remove(&self, event_id: &str) -> Result<bool, GalleryError> {
        let records = self.load().await?;
        let before = records.len();
        let kept: Vec<LegacyEventRecord> =
            records.into_iter().filter(|r| r.id != event_id).collect();
        if kept.len() == before {
            return Ok(false);
        }
        self.save(&kept).await?;
        Ok(true)
    }
}
