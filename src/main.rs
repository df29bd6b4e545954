//! gallery-gateway server entry point.
//!
//! Picks the store backends from configuration and starts the Axum HTTP
//! server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use gallery_gateway::api;
use gallery_gateway::app_state::AppState;
use gallery_gateway::config::{GalleryConfig, ObjectBackend, RelationalBackend};
use gallery_gateway::persistence::{EventRepository, MemoryRepository, PostgresRepository};
use gallery_gateway::storage::{BucketStorage, ObjectStorage, UrlResolver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GalleryConfig::from_env().map_err(|e| anyhow::anyhow!("configuration: {e}"))?;
    tracing::info!(addr = %config.listen_addr, "starting gallery-gateway");

    // Build store adapters
    let repo = relational_backend(&config).await?;
    let storage = object_backend(&config)?;

    // Build application state
    let app_state = AppState::new(repo, storage, &config);

    // Build router
    let app = api::build_router(config.upload_body_limit_bytes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.request_timeout_secs,
                ))),
        )
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn relational_backend(config: &GalleryConfig) -> anyhow::Result<Arc<dyn EventRepository>> {
    match config.relational_backend {
        RelationalBackend::Memory => {
            tracing::warn!("using in-memory relational store, data is lost on restart");
            Ok(Arc::new(MemoryRepository::new()))
        }
        RelationalBackend::Postgres => {
            let repo = PostgresRepository::connect_lazy(config).context("database url")?;
            if let Err(e) = repo.migrate().await {
                tracing::error!(error = %e, "schema bootstrap failed, continuing without it");
            }
            Ok(Arc::new(repo))
        }
    }
}

fn object_backend(config: &GalleryConfig) -> anyhow::Result<Arc<dyn ObjectStorage>> {
    let urls = UrlResolver::from_config(config.public_base_url.as_deref());
    match config.object_backend {
        ObjectBackend::Memory => {
            tracing::warn!("using in-memory object store, data is lost on restart");
            Ok(Arc::new(BucketStorage::in_memory(urls)))
        }
        ObjectBackend::S3 => Ok(Arc::new(
            BucketStorage::s3(&config.object_store, urls).context("object store client")?,
        )),
    }
}
