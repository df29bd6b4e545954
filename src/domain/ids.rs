//! Identifier generation for events and photos.
//!
//! Identifiers are opaque strings of the form `{prefix}-{unix_millis}-{suffix}`
//! where the suffix is nine lowercase hex characters taken from a UUID v4.
//! The millisecond component keeps ids roughly creation-ordered; the random
//! suffix keeps ids minted in the same millisecond distinct.

use chrono::Utc;

use crate::error::GalleryError;

/// Prefix of every generated event id.
pub const EVENT_ID_PREFIX: &str = "evento";

/// Prefix of every generated photo id.
pub const PHOTO_ID_PREFIX: &str = "photo";

const SUFFIX_LEN: usize = 9;

/// Mints a fresh event id, e.g. `evento-1736899200000-3f9a0c1b2`.
#[must_use]
pub fn new_event_id() -> String {
    generate(EVENT_ID_PREFIX)
}

/// Mints a fresh photo id, e.g. `photo-1736899200000-a01b2c3d4`.
#[must_use]
pub fn new_photo_id() -> String {
    generate(PHOTO_ID_PREFIX)
}

fn generate(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: String = uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(SUFFIX_LEN)
        .collect();
    format!("{prefix}-{millis}-{suffix}")
}

/// Checks that an externally supplied event id can be used as an
/// object-store prefix.
///
/// # Errors
///
/// Returns [`GalleryError::Validation`] if the id is empty, contains a
/// path separator, or is a relative path component.
pub fn validate_event_id(event_id: &str) -> Result<(), GalleryError> {
    if event_id.trim().is_empty() {
        return Err(GalleryError::Validation("event id is required".to_string()));
    }
    if event_id.contains('/') || event_id.contains('\\') || event_id == "." || event_id == ".." {
        return Err(GalleryError::Validation(format!(
            "invalid event id: {event_id}"
        )));
    }
    Ok(())
}
