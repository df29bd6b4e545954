//! Database models for the `events` and `photos` tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Photo, Thumbnail};

/// A row of the `events` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRow {
    /// Primary key; also the object-store prefix.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Event date.
    pub date: DateTime<Utc>,
    /// Stored thumbnail URL or sentinel; `NULL` allowed.
    pub thumbnail: Option<String>,
    /// Public visibility flag.
    pub visible: bool,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl EventRow {
    /// A new visible row stamped with the current time.
    #[must_use]
    pub fn new(id: String, name: String, date: DateTime<Utc>, thumbnail: &Thumbnail) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            date,
            thumbnail: Some(thumbnail.as_str().to_string()),
            visible: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A row of the `photos` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRow {
    /// Primary key. Distinct from the object key.
    pub id: String,
    /// Object-store key of the bytes.
    pub filename: String,
    /// URL recorded at upload time.
    pub url: String,
    /// Owning event (`events.id`, cascade on delete).
    pub event_id: String,
    /// Upload timestamp; fixes gallery order.
    pub created_at: DateTime<Utc>,
}

impl PhotoRow {
    /// A new row stamped with the current time.
    #[must_use]
    pub fn new(id: String, filename: String, url: String, event_id: String) -> Self {
        Self {
            id,
            filename,
            url,
            event_id,
            created_at: Utc::now(),
        }
    }
}

impl From<PhotoRow> for Photo {
    fn from(row: PhotoRow) -> Self {
        Self {
            id: row.id,
            filename: row.filename,
            url: row.url,
        }
    }
}

/// Partial update of an event row. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventPatch {
    /// New display name.
    pub name: Option<String>,
    /// New event date.
    pub date: Option<DateTime<Utc>>,
    /// New visibility.
    pub visible: Option<bool>,
}

impl EventPatch {
    /// Returns `true` when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.date.is_none() && self.visible.is_none()
    }

    /// Applies the set fields to `row` and bumps `updated_at`.
    pub fn apply_to(&self, row: &mut EventRow) {
        if let Some(name) = &self.name {
            row.name.clone_from(name);
        }
        if let Some(date) = self.date {
            row.date = date;
        }
        if let Some(visible) = self.visible {
            row.visible = visible;
        }
        row.updated_at = Utc::now();
    }
}
