//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::auth::{AdminCredentials, JwtSessionVerifier, SessionVerifier};
use crate::config::GalleryConfig;
use crate::persistence::EventRepository;
use crate::service::{GalleryService, Reconciler, SnapshotCache};
use crate::storage::{LegacyMetadata, ObjectStorage};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Gallery service for all reads and mutations.
    pub gallery: Arc<GalleryService>,
    /// Gate in front of every admin route.
    pub verifier: Arc<dyn SessionVerifier>,
    /// Issues session tokens on login.
    pub sessions: Arc<JwtSessionVerifier>,
    /// Configured admin login.
    pub credentials: AdminCredentials,
}

impl AppState {
    /// Wires the reconciler, snapshot cache, gallery service and session
    /// handling over the two store backends.
    #[must_use]
    pub fn new(
        repo: Arc<dyn EventRepository>,
        storage: Arc<dyn ObjectStorage>,
        config: &GalleryConfig,
    ) -> Self {
        let legacy = config
            .legacy_metadata_enabled
            .then(|| LegacyMetadata::new(Arc::clone(&storage)));

        let reconciler = Reconciler::new(Arc::clone(&repo), Arc::clone(&storage), legacy.clone());
        let cache = Arc::new(SnapshotCache::new(reconciler, config.cache_ttl()));
        let gallery = Arc::new(GalleryService::new(repo, storage, cache, legacy));

        let sessions = Arc::new(JwtSessionVerifier::new(
            config.jwt_secret.as_bytes(),
            config.session_ttl_hours,
        ));
        let verifier: Arc<dyn SessionVerifier> = Arc::clone(&sessions) as Arc<dyn SessionVerifier>;

        Self {
            gallery,
            verifier,
            sessions,
            credentials: AdminCredentials::new(
                config.admin_username.as_str(),
                config.admin_password.as_str(),
            ),
        }
    }
}
