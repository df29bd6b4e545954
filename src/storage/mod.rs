//! Object Store Adapter: bucket/prefix-addressed binary storage.
//!
//! [`ObjectStorage`] is the capability the rest of the crate programs
//! against. [`bucket::BucketStorage`] implements it on top of the
//! `object_store` crate (S3/MinIO in production, an in-memory bucket in
//! tests). Keys are full paths such as `evento-1/1736899200000-beach.jpg`.

pub mod bucket;
pub mod legacy_metadata;
pub mod url;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::GalleryError;

pub use bucket::BucketStorage;
pub use legacy_metadata::{EVENTS_METADATA_KEY, LegacyEventRecord, LegacyMetadata};
pub use url::UrlResolver;

/// Result of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyListing {
    /// Full object keys in lexical order.
    pub keys: Vec<String>,
    /// `true` only when a limit was supplied and reached. Never a signal
    /// that more pages exist when no limit was given.
    pub truncated: bool,
}

/// An object read back from the store.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Object contents.
    pub bytes: Bytes,
    /// Content type recorded at upload, if the backend kept it.
    pub content_type: Option<String>,
}

/// Binary object store addressed by key.
///
/// Backends surface connectivity failures and timeouts as
/// [`GalleryError::StoreUnavailable`].
#[async_trait]
pub trait ObjectStorage: Send + Sync + fmt::Debug {
    /// Stores `bytes` under `key`, overwriting any existing object, and
    /// returns the object's URL.
    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, GalleryError>;

    /// Reads the object stored under `key`.
    ///
    /// Fails with [`GalleryError::ObjectNotFound`] if the key is absent.
    async fn get_object(&self, key: &str) -> Result<StoredObject, GalleryError>;

    /// Deletes `key`. Deleting a missing key succeeds.
    async fn delete_object(&self, key: &str) -> Result<(), GalleryError>;

    /// Deletes every object whose key starts with `prefix` and returns how
    /// many were removed. Zero matches is not an error.
    async fn delete_objects_by_prefix(&self, prefix: &str) -> Result<usize, GalleryError>;

    /// Lists keys starting with `prefix`, stopping at `limit` if given.
    async fn list_object_keys(
        &self,
        prefix: &str,
        limit: Option<usize>,
    ) -> Result<KeyListing, GalleryError>;

    /// Fetchable URL for `key`. Pure; performs no I/O.
    fn resolve_url(&self, key: &str) -> String;

    /// Time-limited URL for `key`. Backends that cannot sign return
    /// [`ObjectStorage::resolve_url`].
    async fn signed_url(&self, key: &str, expires_in: Duration) -> Result<String, GalleryError> {
        let _ = expires_in;
        Ok(self.resolve_url(key))
    }
}

/// Distinct first path segments of every key that contains a `/`, in
/// first-seen order. Keys under `excluded` folders are skipped.
///
/// # Errors
///
/// Propagates listing failures from the backend.
pub async fn list_top_level_folders(
    storage: &dyn ObjectStorage,
    excluded: &[&str],
) -> Result<Vec<String>, GalleryError> {
    let listing = storage.list_object_keys("", None).await?;
    Ok(top_level_folders(&listing.keys, excluded))
}

fn top_level_folders(keys: &[String], excluded: &[&str]) -> Vec<String> {
    let mut folders: Vec<String> = Vec::new();
    for key in keys {
        let Some((folder, _)) = key.split_once('/') else {
            continue;
        };
        if folder.is_empty() || excluded.contains(&folder) {
            continue;
        }
        if !folders.iter().any(|f| f == folder) {
            folders.push(folder.to_string());
        }
    }
    folders
}
