//! Process-local relational store.
//!
//! Enforces the same constraints as the PostgreSQL schema: unique ids,
//! the photo-to-event foreign key, and cascading photo deletion.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::EventRepository;
use super::models::{EventPatch, EventRow, PhotoRow};
use crate::error::GalleryError;

#[derive(Debug, Default)]
struct Tables {
    events: HashMap<String, EventRow>,
    photos: Vec<PhotoRow>,
}

/// In-memory [`EventRepository`].
///
/// Clones share the same tables. [`MemoryRepository::set_available`] lets a
/// caller simulate an outage, in which case every call fails with
/// [`GalleryError::StoreUnavailable`].
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    tables: Arc<RwLock<Tables>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles simulated availability.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), GalleryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GalleryError::relational("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl EventRepository for MemoryRepository {
    async fn list_events(&self) -> Result<Vec<EventRow>, GalleryError> {
        self.check()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<EventRow> = tables.events.values().cloned().collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }

    async fn list_photos(&self) -> Result<Vec<PhotoRow>, GalleryError> {
        self.check()?;
        let tables = self.tables.read().await;
        let mut rows = tables.photos.clone();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn get_event(&self, id: &str) -> Result<EventRow, GalleryError> {
        self.check()?;
        self.tables
            .read()
            .await
            .events
            .get(id)
            .cloned()
            .ok_or_else(|| GalleryError::EventNotFound(id.to_string()))
    }

    async fn get_photos_for_event(
        &self,
        event_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<PhotoRow>, GalleryError> {
        self.check()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<PhotoRow> = tables
            .photos
            .iter()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn get_photo(&self, id: &str) -> Result<PhotoRow, GalleryError> {
        self.check()?;
        self.tables
            .read()
            .await
            .photos
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| GalleryError::PhotoNotFound(id.to_string()))
    }

    async fn insert_event(&self, row: EventRow) -> Result<EventRow, GalleryError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if tables.events.contains_key(&row.id) {
            return Err(GalleryError::relational(format!(
                "duplicate key value violates unique constraint: events.id = {}",
                row.id
            )));
        }
        tables.events.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    async fn update_event(&self, id: &str, patch: &EventPatch) -> Result<EventRow, GalleryError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let row = tables
            .events
            .get_mut(id)
            .ok_or_else(|| GalleryError::EventNotFound(id.to_string()))?;
        patch.apply_to(row);
        Ok(row.clone())
    }

    async fn delete_event(&self, id: &str) -> Result<(), GalleryError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if tables.events.remove(id).is_none() {
            return Err(GalleryError::EventNotFound(id.to_string()));
        }
        tables.photos.retain(|p| p.event_id != id);
        Ok(())
    }

    async fn insert_photo(&self, row: PhotoRow) -> Result<PhotoRow, GalleryError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if !tables.events.contains_key(&row.event_id) {
            return Err(GalleryError::EventNotFound(row.event_id));
        }
        if tables.photos.iter().any(|p| p.id == row.id) {
            return Err(GalleryError::relational(format!(
                "duplicate key value violates unique constraint: photos.id = {}",
                row.id
            )));
        }
        tables.photos.push(row.clone());
        Ok(row)
    }

    async fn delete_photo(&self, id: &str) -> Result<(), GalleryError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let before = tables.photos.len();
        tables.photos.retain(|p| p.id != id);
        if tables.photos.len() == before {
            return Err(GalleryError::PhotoNotFound(id.to_string()));
        }
        Ok(())
    }
}
