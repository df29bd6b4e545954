//! Image proxy: serves stored objects when no public base URL is set.

use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::app_state::AppState;
use crate::error::{ErrorResponse, GalleryError};

const CACHE_FOR_A_YEAR: &str = "public, max-age=31536000, immutable";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// `GET /api/images/{*key}`: Stream one stored object.
///
/// # Errors
///
/// Returns [`GalleryError::Validation`] for an unusable key,
/// [`GalleryError::ObjectNotFound`] if nothing is stored under it, or a
/// store error.
#[utoipa::path(
    get,
    path = "/api/images/{key}",
    tag = "Gallery",
    summary = "Fetch an image",
    description = "Returns the object's bytes with its stored content type and a one-year cache lifetime.",
    params(
        ("key" = String, Path, description = "Object key, e.g. `evento-1/1736899200000-beach.jpg`"),
    ),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "No such object", body = ErrorResponse),
    )
)]
pub async fn get_image(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, GalleryError> {
    if key.is_empty() || key.split('/').any(|segment| segment == "..") {
        return Err(GalleryError::Validation(format!("invalid image key: {key}")));
    }
    let object = state.gallery.storage().get_object(&key).await?;
    let content_type = object
        .content_type
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());
    Ok((
        [(CONTENT_TYPE, content_type), (CACHE_CONTROL, CACHE_FOR_A_YEAR.to_string())],
        object.bytes,
    ))
}

/// Image proxy route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/images/{*key}", get(get_image))
}
