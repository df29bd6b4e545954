//! Incoming photo files: validation and object-key derivation.

use bytes::Bytes;

use super::event::event_prefix;
use super::ids::PHOTO_ID_PREFIX;
use crate::error::GalleryError;

/// Content types accepted for photos and thumbnails.
pub const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Largest accepted file, in bytes (10 MiB).
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

/// File name of the per-event thumbnail object.
pub const THUMBNAIL_FILE_NAME: &str = "thumbnail.jpg";

/// A file received from a client, not yet stored anywhere.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    /// File name as supplied by the client.
    pub original_name: String,
    /// Declared MIME type.
    pub content_type: String,
    /// File contents.
    pub bytes: Bytes,
}

impl PhotoUpload {
    /// Creates an upload from its parts.
    #[must_use]
    pub fn new(
        original_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Size of the file in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Checks the content type against [`ALLOWED_CONTENT_TYPES`] and the
    /// size against [`MAX_PHOTO_BYTES`]. Performs no I/O.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::Validation`] naming the offending file.
    pub fn validate(&self) -> Result<(), GalleryError> {
        let content_type = self.content_type.to_ascii_lowercase();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(GalleryError::Validation(format!(
                "file type {} not allowed. Only JPEG, PNG, and WebP are supported.",
                self.content_type
            )));
        }
        if self.bytes.is_empty() {
            return Err(GalleryError::Validation(format!(
                "file {} is empty",
                self.original_name
            )));
        }
        if self.size() > MAX_PHOTO_BYTES {
            return Err(GalleryError::Validation(format!(
                "file {} is too large. Maximum size is 10MB.",
                self.original_name
            )));
        }
        Ok(())
    }

    /// Object key for this file under `event_id`, stamped with the
    /// timestamp and random suffix of `photo_id`:
    /// `{event_id}/{unix_millis}-{suffix}-{sanitized name}`.
    ///
    /// Two files with the same name in one batch get distinct keys.
    #[must_use]
    pub fn object_key(&self, event_id: &str, photo_id: &str) -> String {
        let stamp = photo_id
            .strip_prefix(PHOTO_ID_PREFIX)
            .and_then(|rest| rest.strip_prefix('-'))
            .unwrap_or(photo_id);
        photo_object_key(event_id, &self.original_name, stamp)
    }
}

/// Validates a whole batch. A single bad file rejects the batch.
///
/// # Errors
///
/// Returns [`GalleryError::Validation`] if the batch is empty or any file
/// fails [`PhotoUpload::validate`].
pub fn validate_batch(files: &[PhotoUpload]) -> Result<(), GalleryError> {
    if files.is_empty() {
        return Err(GalleryError::Validation("no files provided".to_string()));
    }
    files.iter().try_for_each(PhotoUpload::validate)
}

/// Replaces every character outside `[A-Za-z0-9.-]` with `_`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "photo".to_string()
    } else {
        sanitized
    }
}

/// Builds `{event_id}/{stamp}-{sanitized name}`.
#[must_use]
pub fn photo_object_key(event_id: &str, original_name: &str, stamp: &str) -> String {
    format!(
        "{}{stamp}-{}",
        event_prefix(event_id),
        sanitize_filename(original_name)
    )
}

/// Well-known key of an event's thumbnail object.
#[must_use]
pub fn thumbnail_object_key(event_id: &str) -> String {
    format!("{}{THUMBNAIL_FILE_NAME}", event_prefix(event_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(size: usize) -> PhotoUpload {
        PhotoUpload::new("beach.jpg", "image/jpeg", vec![0u8; size])
    }

    #[test]
    fn accepts_allowed_types_under_limit() {
        assert!(jpeg(2 * 1024 * 1024).validate().is_ok());
        assert!(
            PhotoUpload::new("a.webp", "image/webp", vec![1u8; 10])
                .validate()
                .is_ok()
        );
        assert!(
            PhotoUpload::new("a.png", "IMAGE/PNG", vec![1u8; 10])
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn rejects_oversized_file() {
        let err = jpeg(15 * 1024 * 1024).validate();
        assert!(matches!(err, Err(GalleryError::Validation(m)) if m.contains("too large")));
        assert!(jpeg(MAX_PHOTO_BYTES).validate().is_ok());
        assert!(jpeg(MAX_PHOTO_BYTES + 1).validate().is_err());
    }

    #[test]
    fn rejects_disallowed_type() {
        let gif = PhotoUpload::new("a.gif", "image/gif", vec![1u8; 10]);
        assert!(matches!(gif.validate(), Err(GalleryError::Validation(_))));
    }

    #[test]
    fn one_bad_file_rejects_the_batch() {
        let batch = vec![jpeg(10), jpeg(MAX_PHOTO_BYTES + 1), jpeg(10)];
        assert!(validate_batch(&batch).is_err());
        assert!(validate_batch(&[]).is_err());
        assert!(validate_batch(&[jpeg(10), jpeg(20)]).is_ok());
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename("My Photo (1).JPG"), "My_Photo__1_.JPG");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("fóto.png"), "f_to.png");
        assert_eq!(sanitize_filename(""), "photo");
    }

    #[test]
    fn keys_are_scoped_under_the_event() {
        assert_eq!(
            photo_object_key("evento-1", "a b.jpg", "1700000000000-3f9a0c1b2"),
            "evento-1/1700000000000-3f9a0c1b2-a_b.jpg"
        );
        assert_eq!(thumbnail_object_key("evento-1"), "evento-1/thumbnail.jpg");
    }

    #[test]
    fn same_name_files_get_distinct_keys() {
        let file = jpeg(10);
        let a = file.object_key("evento-1", "photo-1700000000000-aaaaaaaaa");
        let b = file.object_key("evento-1", "photo-1700000000000-bbbbbbbbb");
        assert_eq!(a, "evento-1/1700000000000-aaaaaaaaa-beach.jpg");
        assert_ne!(a, b);
    }
}
