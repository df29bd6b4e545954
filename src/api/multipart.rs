//! Reading `multipart/form-data` bodies into text fields and uploads.

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::domain::PhotoUpload;
use crate::error::GalleryError;

/// Content type assumed when a file part does not declare one.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A fully buffered form.
#[derive(Debug, Default)]
pub struct Form {
    /// Text fields by name; a repeated name keeps the last value.
    pub text: HashMap<String, String>,
    /// File parts as `(field name, upload)`, in body order.
    pub files: Vec<(String, PhotoUpload)>,
}

impl Form {
    /// Text field `name`, if present.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.text.get(name).map(String::as_str)
    }

    /// Removes and returns every file sent under one of `names`.
    pub fn take_files(&mut self, names: &[&str]) -> Vec<PhotoUpload> {
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(field, _)| names.contains(&field.as_str()));
        self.files = kept;
        taken.into_iter().map(|(_, upload)| upload).collect()
    }
}

/// Buffers every part of `multipart`. Empty file inputs, which browsers
/// send when nothing was picked, are skipped.
///
/// # Errors
///
/// Returns [`GalleryError::Validation`] if the body is malformed.
pub async fn read_form(mut multipart: Multipart) -> Result<Form, GalleryError> {
    let mut form = Form::default();
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field
                    .content_type()
                    .unwrap_or(FALLBACK_CONTENT_TYPE)
                    .to_string();
                let bytes = field.bytes().await.map_err(malformed)?;
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.files
                    .push((name, PhotoUpload::new(file_name, content_type, bytes)));
            }
            None => {
                let value = field.text().await.map_err(malformed)?;
                form.text.insert(name, value);
            }
        }
    }
    Ok(form)
}

fn malformed(e: axum::extract::multipart::MultipartError) -> GalleryError {
    GalleryError::Validation(format!("malformed multipart body: {e}"))
}
