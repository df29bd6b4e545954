//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Public gallery routes live under `/api/events` and `/api/images`,
//! admin routes under `/api/admin` behind [`session::AdminSession`].

pub mod dto;
pub mod handlers;
pub mod multipart;
#[cfg(feature = "swagger-ui")]
pub mod openapi;
pub mod session;

use axum::Router;
use axum::extract::DefaultBodyLimit;

use crate::app_state::AppState;

/// Builds the complete API router. Request bodies up to `body_limit`
/// bytes are accepted so multi-file uploads fit.
pub fn build_router(body_limit: usize) -> Router<AppState> {
    let router = Router::new()
        .merge(handlers::routes())
        .merge(handlers::system::routes())
        .layer(DefaultBodyLimit::max(body_limit));

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(openapi::swagger_ui());

    router
}
