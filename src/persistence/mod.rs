//! Relational Store Adapter: `events` and `photos` rows.
//!
//! Provides the [`EventRepository`] trait for the two-table row store with
//! cascading photo deletion. The concrete implementations are
//! [`postgres::PostgresRepository`] (`sqlx::PgPool`) and
//! [`memory::MemoryRepository`] (process-local tables).

pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::error::GalleryError;

pub use memory::MemoryRepository;
pub use models::{EventPatch, EventRow, PhotoRow};
pub use postgres::PostgresRepository;

/// Row store for events and their photos.
///
/// Backends surface connectivity failures and timeouts as
/// [`GalleryError::StoreUnavailable`].
#[async_trait]
pub trait EventRepository: Send + Sync + fmt::Debug {
    /// All event rows, newest `date` first.
    async fn list_events(&self) -> Result<Vec<EventRow>, GalleryError>;

    /// All photo rows, oldest `created_at` first.
    async fn list_photos(&self) -> Result<Vec<PhotoRow>, GalleryError>;

    /// The event row `id`, or [`GalleryError::EventNotFound`].
    async fn get_event(&self, id: &str) -> Result<EventRow, GalleryError>;

    /// Photo rows of `event_id`, oldest first, at most `limit`.
    async fn get_photos_for_event(
        &self,
        event_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<PhotoRow>, GalleryError>;

    /// The photo row `id`, or [`GalleryError::PhotoNotFound`].
    async fn get_photo(&self, id: &str) -> Result<PhotoRow, GalleryError>;

    /// Inserts an event row and returns it as stored.
    async fn insert_event(&self, row: EventRow) -> Result<EventRow, GalleryError>;

    /// Applies `patch` to the event row `id`, or fails with
    /// [`GalleryError::EventNotFound`].
    async fn update_event(&self, id: &str, patch: &EventPatch) -> Result<EventRow, GalleryError>;

    /// Deletes the event row `id` and, by cascade, its photo rows. Fails
    /// with [`GalleryError::EventNotFound`] if there is no such row.
    async fn delete_event(&self, id: &str) -> Result<(), GalleryError>;

    /// Inserts a photo row. Fails with [`GalleryError::EventNotFound`] if
    /// the referenced event row does not exist.
    async fn insert_photo(&self, row: PhotoRow) -> Result<PhotoRow, GalleryError>;

    /// Deletes the photo row `id`, or fails with
    /// [`GalleryError::PhotoNotFound`].
    async fn delete_photo(&self, id: &str) -> Result<(), GalleryError>;
}
