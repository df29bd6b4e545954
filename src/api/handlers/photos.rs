//! Photo handlers: listing, download links, admin upload and delete.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use crate::api::dto::{DownloadUrlResponse, LimitParams, MessageResponse, PhotoListResponse};
use crate::api::multipart::read_form;
use crate::api::session::AdminSession;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GalleryError};
use crate::service::gallery_service::DOWNLOAD_URL_TTL;

/// Form field names accepted for photo files.
const FILE_FIELDS: [&str; 2] = ["files", "file"];

/// `GET /api/events/{id}/photos`: Photos of one event.
#[utoipa::path(
    get,
    path = "/api/events/{id}/photos",
    tag = "Gallery",
    summary = "List event photos",
    description = "Photos in upload order. Falls back to the object-store listing when the event has no photo rows.",
    params(
        ("id" = String, Path, description = "Event id"),
        LimitParams,
    ),
    responses(
        (status = 200, description = "Photos", body = PhotoListResponse),
    )
)]
pub async fn list_event_photos(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<LimitParams>,
) -> impl IntoResponse {
    let photos = state.gallery.event_photos(&id, params.limit).await;
    Json(PhotoListResponse::from(photos))
}

/// `GET /api/events/{id}/photos/{photo_id}/download`: Time-limited link.
///
/// # Errors
///
/// Returns [`GalleryError::PhotoNotFound`] if the event has no such photo.
#[utoipa::path(
    get,
    path = "/api/events/{id}/photos/{photo_id}/download",
    tag = "Gallery",
    summary = "Get a download link",
    description = "Returns a presigned URL on S3 backends, otherwise the photo's regular URL.",
    params(
        ("id" = String, Path, description = "Event id"),
        ("photo_id" = String, Path, description = "Photo id"),
    ),
    responses(
        (status = 200, description = "Download link", body = DownloadUrlResponse),
        (status = 404, description = "Photo not found", body = ErrorResponse),
    )
)]
pub async fn photo_download_url(
    State(state): State<AppState>,
    Path((id, photo_id)): Path<(String, String)>,
) -> Result<Json<DownloadUrlResponse>, GalleryError> {
    let url = state.gallery.photo_download_url(&id, &photo_id).await?;
    Ok(Json(DownloadUrlResponse {
        url,
        expires_in_secs: DOWNLOAD_URL_TTL.as_secs(),
    }))
}

/// `POST /api/admin/events/{id}/photos`: Upload photos.
///
/// # Errors
///
/// Returns [`GalleryError::Validation`] if any file is rejected,
/// [`GalleryError::EventNotFound`], or a store error.
#[utoipa::path(
    post,
    path = "/api/admin/events/{id}/photos",
    tag = "Admin",
    summary = "Upload photos",
    description = "Multipart form with one or more `files` parts (JPEG, PNG or WebP, at most 10 MiB each). One bad file rejects the whole batch before anything is stored.",
    params(
        ("id" = String, Path, description = "Event id"),
    ),
    responses(
        (status = 201, description = "Photos stored", body = PhotoListResponse),
        (status = 400, description = "Rejected file", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse),
    )
)]
pub async fn upload_photos(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, GalleryError> {
    let mut form = read_form(multipart).await?;
    let files = form.take_files(&FILE_FIELDS);
    let photos = state.gallery.upload_event_photos(&id, files).await?;
    Ok((StatusCode::CREATED, Json(PhotoListResponse::from(photos))))
}

/// `DELETE /api/admin/events/{id}/photos/{photo_id}`: Delete one photo.
///
/// # Errors
///
/// Returns [`GalleryError::PhotoNotFound`], a store error, or
/// [`GalleryError::PartialFailure`] if only the row was deleted.
#[utoipa::path(
    delete,
    path = "/api/admin/events/{id}/photos/{photo_id}",
    tag = "Admin",
    summary = "Delete a photo",
    params(
        ("id" = String, Path, description = "Event id"),
        ("photo_id" = String, Path, description = "Photo id"),
    ),
    responses(
        (status = 200, description = "Photo deleted", body = MessageResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 404, description = "Photo not found", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse),
    )
)]
pub async fn delete_photo(
    _session: AdminSession,
    State(state): State<AppState>,
    Path((id, photo_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, GalleryError> {
    state.gallery.delete_event_photo(&id, &photo_id).await?;
    Ok(Json(MessageResponse::new(format!("photo {photo_id} deleted"))))
}

/// Photo routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/events/{id}/photos", get(list_event_photos))
        .route(
            "/api/events/{id}/photos/{photo_id}/download",
            get(photo_download_url),
        )
        .route("/api/admin/events/{id}/photos", post(upload_photos))
        .route(
            "/api/admin/events/{id}/photos/{photo_id}",
            delete(delete_photo),
        )
}
