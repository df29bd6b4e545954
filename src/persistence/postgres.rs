//! PostgreSQL implementation of the relational store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::EventRepository;
use super::models::{EventPatch, EventRow, PhotoRow};
use crate::config::GalleryConfig;
use crate::error::GalleryError;

type EventTuple = (
    String,
    String,
    DateTime<Utc>,
    Option<String>,
    bool,
    DateTime<Utc>,
    DateTime<Utc>,
);

type PhotoTuple = (String, String, String, String, DateTime<Utc>);

const EVENT_COLUMNS: &str = "id, name, date, thumbnail, visible, created_at, updated_at";
const PHOTO_COLUMNS: &str = "id, filename, url, event_id, created_at";

fn event_from_tuple(
    (id, name, date, thumbnail, visible, created_at, updated_at): EventTuple,
) -> EventRow {
    EventRow {
        id,
        name,
        date,
        thumbnail,
        visible,
        created_at,
        updated_at,
    }
}

fn photo_from_tuple((id, filename, url, event_id, created_at): PhotoTuple) -> PhotoRow {
    PhotoRow {
        id,
        filename,
        url,
        event_id,
        created_at,
    }
}

fn db_error(e: sqlx::Error) -> GalleryError {
    GalleryError::relational(e)
}

/// PostgreSQL-backed relational store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a repository over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds a lazily connecting pool from `config`. No connection is
    /// attempted until the first query, so startup succeeds while the
    /// database is down.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::StoreUnavailable`] if the connection string
    /// is malformed.
    pub fn connect_lazy(config: &GalleryConfig) -> Result<Self, GalleryError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect_lazy(&config.database_url)
            .map_err(db_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `events` and `photos` tables and the photo index if
    /// they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::StoreUnavailable`] on database failure.
    pub async fn migrate(&self) -> Result<(), GalleryError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS events (\
                id TEXT PRIMARY KEY, \
                name TEXT NOT NULL, \
                date TIMESTAMPTZ NOT NULL, \
                thumbnail TEXT, \
                visible BOOLEAN NOT NULL DEFAULT TRUE, \
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(), \
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW())",
        )
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS photos (\
                id TEXT PRIMARY KEY, \
                filename TEXT NOT NULL, \
                url TEXT NOT NULL, \
                event_id TEXT NOT NULL REFERENCES events(id) ON DELETE CASCADE, \
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW())",
        )
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_photos_event_id ON photos(event_id)")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        tracing::info!("relational schema ready");
        Ok(())
    }
}

#[async_trait]
impl EventRepository for PostgresRepository {
    async fn list_events(&self) -> Result<Vec<EventRow>, GalleryError> {
        let rows = sqlx::query_as::<_, EventTuple>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY date DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(event_from_tuple).collect())
    }

    async fn list_photos(&self) -> Result<Vec<PhotoRow>, GalleryError> {
        let rows = sqlx::query_as::<_, PhotoTuple>(&format!(
            "SELECT {PHOTO_COLUMNS} FROM photos ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(photo_from_tuple).collect())
    }

    async fn get_event(&self, id: &str) -> Result<EventRow, GalleryError> {
        sqlx::query_as::<_, EventTuple>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(event_from_tuple)
        .ok_or_else(|| GalleryError::EventNotFound(id.to_string()))
    }

    async fn get_photos_for_event(
        &self,
        event_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<PhotoRow>, GalleryError> {
        let rows = if let Some(limit) = limit {
            sqlx::query_as::<_, PhotoTuple>(&format!(
                "SELECT {PHOTO_COLUMNS} FROM photos WHERE event_id = $1 \
                 ORDER BY created_at ASC LIMIT $2"
            ))
            .bind(event_id)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, PhotoTuple>(&format!(
                "SELECT {PHOTO_COLUMNS} FROM photos WHERE event_id = $1 ORDER BY created_at ASC"
            ))
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(db_error)?;

        Ok(rows.into_iter().map(photo_from_tuple).collect())
    }

    async fn get_photo(&self, id: &str) -> Result<PhotoRow, GalleryError> {
        sqlx::query_as::<_, PhotoTuple>(&format!(
            "SELECT {PHOTO_COLUMNS} FROM photos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(photo_from_tuple)
        .ok_or_else(|| GalleryError::PhotoNotFound(id.to_string()))
    }

    async fn insert_event(&self, row: EventRow) -> Result<EventRow, GalleryError> {
        let stored = sqlx::query_as::<_, EventTuple>(&format!(
            "INSERT INTO events (id, name, date, thumbnail, visible) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {EVENT_COLUMNS}"
        ))
        .bind(&row.id)
        .bind(&row.name)
        .bind(row.date)
        .bind(row.thumbnail.as_deref())
        .bind(row.visible)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(event_from_tuple(stored))
    }

    async fn update_event(&self, id: &str, patch: &EventPatch) -> Result<EventRow, GalleryError> {
        sqlx::query_as::<_, EventTuple>(&format!(
            "UPDATE events SET \
                name = COALESCE($1, name), \
                date = COALESCE($2, date), \
                visible = COALESCE($3, visible), \
                updated_at = NOW() \
             WHERE id = $4 RETURNING {EVENT_COLUMNS}"
        ))
        .bind(patch.name.as_deref())
        .bind(patch.date)
        .bind(patch.visible)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(event_from_tuple)
        .ok_or_else(|| GalleryError::EventNotFound(id.to_string()))
    }

    async fn delete_event(&self, id: &str) -> Result<(), GalleryError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(GalleryError::EventNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn insert_photo(&self, row: PhotoRow) -> Result<PhotoRow, GalleryError> {
        let stored = sqlx::query_as::<_, PhotoTuple>(&format!(
            "INSERT INTO photos (id, filename, url, event_id) \
             VALUES ($1, $2, $3, $4) RETURNING {PHOTO_COLUMNS}"
        ))
        .bind(&row.id)
        .bind(&row.filename)
        .bind(&row.url)
        .bind(&row.event_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let missing_event =
                matches!(&e, sqlx::Error::Database(db) if db.is_foreign_key_violation());
            if missing_event {
                GalleryError::EventNotFound(row.event_id.clone())
            } else {
                db_error(e)
            }
        })?;

        Ok(photo_from_tuple(stored))
    }

    async fn delete_photo(&self, id: &str) -> Result<(), GalleryError> {
        let result = sqlx::query("DELETE FROM photos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(GalleryError::PhotoNotFound(id.to_string()));
        }
        Ok(())
    }
}
