//! Event and photo DTOs for list, update, upload and delete operations.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::event::parse_event_date;
use crate::domain::{Event, Photo};
use crate::error::GalleryError;
use crate::persistence::EventPatch;
use crate::service::{DeletionSource, EventDeletion};

/// List response for event listings.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventListResponse {
    /// Events, newest first.
    pub data: Vec<Event>,
    /// Number of events returned.
    pub total: usize,
}

impl From<Vec<Event>> for EventListResponse {
    fn from(data: Vec<Event>) -> Self {
        Self {
            total: data.len(),
            data,
        }
    }
}

/// List response for photo listings and uploads.
#[derive(Debug, Serialize, ToSchema)]
pub struct PhotoListResponse {
    /// Photos in upload order.
    pub data: Vec<Photo>,
    /// Number of photos returned.
    pub total: usize,
}

impl From<Vec<Photo>> for PhotoListResponse {
    fn from(data: Vec<Photo>) -> Self {
        Self {
            total: data.len(),
            data,
        }
    }
}

/// Request body for `PUT /api/admin/events/{id}`. Omitted fields are left
/// unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateEventRequest {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New date, RFC 3339 or `YYYY-MM-DD`.
    #[serde(default)]
    pub date: Option<String>,
    /// New public visibility.
    #[serde(default)]
    pub visible: Option<bool>,
}

impl UpdateEventRequest {
    /// Converts the request into a row patch.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::Validation`] if `date` cannot be parsed.
    pub fn into_patch(self) -> Result<EventPatch, GalleryError> {
        Ok(EventPatch {
            name: self.name,
            date: self.date.as_deref().map(parse_event_date).transpose()?,
            visible: self.visible,
        })
    }
}

/// Response body for `DELETE /api/admin/events/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteEventResponse {
    /// Deleted event id.
    pub event_id: String,
    /// Objects removed under the event prefix.
    pub objects_removed: usize,
    /// Record removed: `relational`, `legacy_metadata` or
    /// `object_store_only`.
    pub source: String,
    /// `true` if some objects could not be removed.
    pub cleanup_failed: bool,
}

impl DeleteEventResponse {
    /// Builds the response from a deletion outcome.
    #[must_use]
    pub fn new(event_id: String, outcome: &EventDeletion) -> Self {
        let source = match outcome.source {
            DeletionSource::Relational => "relational",
            DeletionSource::LegacyMetadata => "legacy_metadata",
            DeletionSource::ObjectStoreOnly => "object_store_only",
        };
        Self {
            event_id,
            objects_removed: outcome.objects_removed,
            source: source.to_string(),
            cleanup_failed: outcome.cleanup_failed,
        }
    }
}

/// Response body for the photo download endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct DownloadUrlResponse {
    /// Time-limited URL of the photo.
    pub url: String,
    /// Seconds until the URL expires.
    pub expires_in_secs: u64,
}
