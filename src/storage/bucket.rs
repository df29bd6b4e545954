//! [`ObjectStorage`] backed by the `object_store` crate.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::Method;
use bytes::Bytes;
use futures_util::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::{Attribute, AttributeValue, Attributes, ObjectStore, PutOptions, PutPayload};

use super::{KeyListing, ObjectStorage, StoredObject, UrlResolver};
use crate::config::ObjectStoreConfig;
use crate::error::GalleryError;

/// A single bucket reached through `object_store`.
///
/// Built once at startup: [`BucketStorage::s3`] for MinIO / S3, or
/// [`BucketStorage::in_memory`] for a process-local bucket.
#[derive(Debug, Clone)]
pub struct BucketStorage {
    store: Arc<dyn ObjectStore>,
    signer: Option<Arc<dyn Signer>>,
    urls: UrlResolver,
}

impl BucketStorage {
    /// Connects to an S3-compatible endpoint using path-style requests.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::StoreUnavailable`] if the client cannot be
    /// built from `config`.
    pub fn s3(config: &ObjectStoreConfig, urls: UrlResolver) -> Result<Self, GalleryError> {
        let s3 = AmazonS3Builder::new()
            .with_endpoint(config.endpoint_url())
            .with_bucket_name(config.bucket.as_str())
            .with_region(config.region.as_str())
            .with_access_key_id(config.access_key.as_str())
            .with_secret_access_key(config.secret_key.as_str())
            .with_allow_http(!config.use_ssl)
            .with_virtual_hosted_style_request(false)
            .build()
            .map_err(GalleryError::object)?;
        let s3 = Arc::new(s3);
        let store: Arc<dyn ObjectStore> = Arc::clone(&s3) as Arc<dyn ObjectStore>;
        let signer: Arc<dyn Signer> = s3;

        tracing::info!(
            endpoint = %config.endpoint_url(),
            bucket = %config.bucket,
            "object store configured"
        );
        Ok(Self {
            store,
            signer: Some(signer),
            urls,
        })
    }

    /// Process-local bucket. Contents are lost when the last clone drops.
    #[must_use]
    pub fn in_memory(urls: UrlResolver) -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            signer: None,
            urls,
        }
    }

    /// Wraps an arbitrary `object_store` backend.
    #[must_use]
    pub fn from_store(store: Arc<dyn ObjectStore>, urls: UrlResolver) -> Self {
        Self {
            store,
            signer: None,
            urls,
        }
    }
}

/// Maps an `object_store` failure on `key` into the gallery taxonomy.
fn map_error(key: &str, err: object_store::Error) -> GalleryError {
    match err {
        object_store::Error::NotFound { .. } => GalleryError::ObjectNotFound(key.to_string()),
        other => GalleryError::object(other),
    }
}

/// Splits a key prefix into the directory to list and the remaining
/// partial segment, e.g. `"evento-1/17"` → (`Some("evento-1")`, `"17"`).
fn split_prefix(prefix: &str) -> (Option<Path>, &str) {
    match prefix.rsplit_once('/') {
        Some((dir, rest)) if !dir.is_empty() => (Some(Path::from(dir)), rest),
        Some((_, rest)) => (None, rest),
        None => (None, prefix),
    }
}

#[async_trait]
impl ObjectStorage for BucketStorage {
    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, GalleryError> {
        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );
        let opts = PutOptions {
            attributes,
            ..PutOptions::default()
        };
        let size = bytes.len();
        self.store
            .put_opts(&Path::from(key), PutPayload::from(bytes), opts)
            .await
            .map_err(|e| map_error(key, e))?;

        tracing::debug!(key, size, "object stored");
        Ok(self.resolve_url(key))
    }

    async fn get_object(&self, key: &str) -> Result<StoredObject, GalleryError> {
        let result = self
            .store
            .get(&Path::from(key))
            .await
            .map_err(|e| map_error(key, e))?;
        let content_type = result.attributes.get(&Attribute::ContentType).map(|v| {
            let value: &str = v.as_ref();
            value.to_string()
        });
        let bytes = result.bytes().await.map_err(|e| map_error(key, e))?;
        Ok(StoredObject {
            bytes,
            content_type,
        })
    }

    async fn delete_object(&self, key: &str) -> Result<(), GalleryError> {
        match self.store.delete(&Path::from(key)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(GalleryError::object(e)),
        }
    }

    async fn delete_objects_by_prefix(&self, prefix: &str) -> Result<usize, GalleryError> {
        let listing = self.list_object_keys(prefix, None).await?;
        if listing.keys.is_empty() {
            return Ok(0);
        }

        let locations = futures_util::stream::iter(
            listing
                .keys
                .into_iter()
                .map(|key| Ok::<Path, object_store::Error>(Path::from(key))),
        )
        .boxed();

        let mut deleted = 0usize;
        let mut results = self.store.delete_stream(locations);
        while let Some(result) = results.next().await {
            match result {
                Ok(_) => deleted = deleted.saturating_add(1),
                Err(object_store::Error::NotFound { .. }) => {}
                Err(e) => return Err(GalleryError::object(e)),
            }
        }

        tracing::debug!(prefix, deleted, "objects deleted by prefix");
        Ok(deleted)
    }

    async fn list_object_keys(
        &self,
        prefix: &str,
        limit: Option<usize>,
    ) -> Result<KeyListing, GalleryError> {
        if limit == Some(0) {
            return Ok(KeyListing {
                keys: Vec::new(),
                truncated: true,
            });
        }

        let (dir, _) = split_prefix(prefix);
        let mut stream = self.store.list(dir.as_ref());
        let mut keys = Vec::new();
        while let Some(meta) = stream.next().await {
            let meta = meta.map_err(GalleryError::object)?;
            let key = meta.location.to_string();
            if !key.starts_with(prefix) {
                continue;
            }
            keys.push(key);
            if let Some(limit) = limit
                && keys.len() >= limit
            {
                break;
            }
        }
        // Lexical order on every backend.
        keys.sort();

        let truncated = limit.is_some_and(|limit| keys.len() >= limit);
        Ok(KeyListing { keys, truncated })
    }

    fn resolve_url(&self, key: &str) -> String {
        self.urls.resolve(key)
    }

    async fn signed_url(&self, key: &str, expires_in: Duration) -> Result<String, GalleryError> {
        let Some(signer) = &self.signer else {
            return Ok(self.resolve_url(key));
        };
        let url = signer
            .signed_url(Method::GET, &Path::from(key), expires_in)
            .await
            .map_err(|e| map_error(key, e))?;
        Ok(url.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn storage() -> BucketStorage {
        BucketStorage::in_memory(UrlResolver::public("http://minio:9000/photos"))
    }

    async fn seed(storage: &BucketStorage, keys: &[&str]) {
        for key in keys {
            let put = storage
                .put_object(key, Bytes::from_static(b"img"), "image/jpeg")
                .await;
            assert!(put.is_ok(), "seeding {key} failed");
        }
    }

    #[tokio::test]
    async fn put_returns_resolved_url_and_get_reads_back() {
        let storage = storage();
        let url = storage
            .put_object("evento-1/1-a.jpg", Bytes::from_static(b"abc"), "image/png")
            .await;
        assert_eq!(
            url.ok().as_deref(),
            Some("http://minio:9000/photos/evento-1/1-a.jpg")
        );

        let Ok(obj) = storage.get_object("evento-1/1-a.jpg").await else {
            panic!("object should exist");
        };
        assert_eq!(obj.bytes.as_ref(), b"abc");
        assert_eq!(obj.content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let result = storage().get_object("nope/x.jpg").await;
        assert!(matches!(result, Err(GalleryError::ObjectNotFound(k)) if k == "nope/x.jpg"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let storage = storage();
        seed(&storage, &["evento-1/a.jpg"]).await;
        assert!(storage.delete_object("evento-1/a.jpg").await.is_ok());
        assert!(storage.delete_object("evento-1/a.jpg").await.is_ok());
        assert!(storage.delete_object("never/existed.jpg").await.is_ok());
    }

    #[tokio::test]
    async fn delete_by_prefix_counts_and_tolerates_zero() {
        let storage = storage();
        seed(
            &storage,
            &["evento-1/a.jpg", "evento-1/b.jpg", "evento-10/c.jpg"],
        )
        .await;

        assert_eq!(storage.delete_objects_by_prefix("evento-1/").await.ok(), Some(2));
        assert_eq!(storage.delete_objects_by_prefix("evento-1/").await.ok(), Some(0));

        let Ok(rest) = storage.list_object_keys("", None).await else {
            panic!("listing failed");
        };
        assert_eq!(rest.keys, vec!["evento-10/c.jpg".to_string()]);
    }

    #[tokio::test]
    async fn listing_reports_truncation_only_with_limit() {
        let storage = storage();
        seed(&storage, &["e/1.jpg", "e/2.jpg", "e/3.jpg"]).await;

        let Ok(all) = storage.list_object_keys("e/", None).await else {
            panic!("listing failed");
        };
        assert_eq!(all.keys.len(), 3);
        assert!(!all.truncated);

        let Ok(limited) = storage.list_object_keys("e/", Some(2)).await else {
            panic!("listing failed");
        };
        assert_eq!(limited.keys.len(), 2);
        assert!(limited.truncated);

        let Ok(roomy) = storage.list_object_keys("e/", Some(10)).await else {
            panic!("listing failed");
        };
        assert_eq!(roomy.keys.len(), 3);
        assert!(!roomy.truncated);
    }

    #[tokio::test]
    async fn partial_segment_prefix_filters_keys() {
        let storage = storage();
        seed(&storage, &["e/100-a.jpg", "e/200-b.jpg"]).await;
        let Ok(listing) = storage.list_object_keys("e/1", None).await else {
            panic!("listing failed");
        };
        assert_eq!(listing.keys, vec!["e/100-a.jpg".to_string()]);
    }

    #[tokio::test]
    async fn unsigned_backend_falls_back_to_resolved_url() {
        let url = storage()
            .signed_url("e/1.jpg", Duration::from_secs(60))
            .await;
        assert_eq!(url.ok().as_deref(), Some("http://minio:9000/photos/e/1.jpg"));
    }
}
