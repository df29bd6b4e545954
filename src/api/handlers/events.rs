//! Event handlers: public listing and lookup, admin CRUD.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{DeleteEventResponse, EventListResponse, RefreshParams, UpdateEventRequest};
use crate::api::multipart::read_form;
use crate::api::session::AdminSession;
use crate::app_state::AppState;
use crate::domain::Event;
use crate::error::{ErrorResponse, GalleryError};

/// `GET /api/events`: Public gallery listing.
#[utoipa::path(
    get,
    path = "/api/events",
    tag = "Gallery",
    summary = "List visible events",
    description = "Returns every visible event of the cached snapshot, newest first, with embedded photos.",
    responses(
        (status = 200, description = "Visible events", body = EventListResponse),
    )
)]
pub async fn list_public_events(State(state): State<AppState>) -> impl IntoResponse {
    Json(EventListResponse::from(state.gallery.list_public_events().await))
}

/// `GET /api/events/{id}`: One visible event.
///
/// # Errors
///
/// Returns [`GalleryError::EventNotFound`] if the event is unknown or
/// hidden.
#[utoipa::path(
    get,
    path = "/api/events/{id}",
    tag = "Gallery",
    summary = "Get a visible event",
    description = "Looks the event up in the stores directly, falling back to the legacy metadata record. Hidden events are reported as not found.",
    params(
        ("id" = String, Path, description = "Event id"),
    ),
    responses(
        (status = 200, description = "Event with photos", body = Event),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_public_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Event>, GalleryError> {
    let event = state.gallery.get_event(&id).await?;
    if !event.visible {
        return Err(GalleryError::EventNotFound(id));
    }
    Ok(Json(event))
}

/// `GET /api/admin/events`: Every event, hidden ones included.
#[utoipa::path(
    get,
    path = "/api/admin/events",
    tag = "Admin",
    summary = "List all events",
    description = "Returns the full snapshot. `refresh=true` bypasses the cache.",
    params(RefreshParams),
    responses(
        (status = 200, description = "All events", body = EventListResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
    )
)]
pub async fn list_admin_events(
    _session: AdminSession,
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
) -> impl IntoResponse {
    let snapshot = state.gallery.list_events(params.refresh).await;
    Json(EventListResponse::from(snapshot.as_ref().clone()))
}

/// `POST /api/admin/events`: Create an event.
///
/// # Errors
///
/// Returns [`GalleryError::Validation`] for missing or bad fields, or a
/// store error.
#[utoipa::path(
    post,
    path = "/api/admin/events",
    tag = "Admin",
    summary = "Create an event",
    description = "Multipart form with `name`, `date` and an optional `thumbnail` image.",
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, description = "Invalid form", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse),
    )
)]
pub async fn create_event(
    _session: AdminSession,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, GalleryError> {
    let mut form = read_form(multipart).await?;
    let thumbnail = form.take_files(&["thumbnail"]).into_iter().next();
    let name = form.text("name").unwrap_or_default();
    let date = form.text("date").unwrap_or_default();

    let event = state.gallery.create_event(name, date, thumbnail).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// `GET /api/admin/events/{id}`: One event of the snapshot.
///
/// # Errors
///
/// Returns [`GalleryError::EventNotFound`] if the snapshot lacks `id`.
#[utoipa::path(
    get,
    path = "/api/admin/events/{id}",
    tag = "Admin",
    summary = "Get an event",
    params(
        ("id" = String, Path, description = "Event id"),
    ),
    responses(
        (status = 200, description = "Event", body = Event),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_admin_event(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Event>, GalleryError> {
    state
        .gallery
        .cache()
        .find_event(&id)
        .await
        .map(Json)
        .ok_or(GalleryError::EventNotFound(id))
}

/// `PUT /api/admin/events/{id}`: Update name, date or visibility.
///
/// # Errors
///
/// Returns [`GalleryError::Validation`] for an empty or bad update, or
/// [`GalleryError::EventNotFound`].
#[utoipa::path(
    put,
    path = "/api/admin/events/{id}",
    tag = "Admin",
    summary = "Update an event",
    params(
        ("id" = String, Path, description = "Event id"),
    ),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Updated event", body = Event),
        (status = 400, description = "Invalid update", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn update_event(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<Json<Event>, GalleryError> {
    let patch = req.into_patch()?;
    let event = state.gallery.update_event(&id, patch).await?;
    Ok(Json(event))
}

/// `DELETE /api/admin/events/{id}`: Delete an event and all its photos.
///
/// # Errors
///
/// Returns [`GalleryError::EventNotFound`] if neither the snapshot nor a
/// direct lookup knows `id`, or a relational store error.
#[utoipa::path(
    delete,
    path = "/api/admin/events/{id}",
    tag = "Admin",
    summary = "Delete an event",
    description = "Removes every object under the event prefix, then the event record. Object cleanup is best-effort.",
    params(
        ("id" = String, Path, description = "Event id"),
    ),
    responses(
        (status = 200, description = "Event deleted", body = DeleteEventResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse),
    )
)]
pub async fn delete_event(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteEventResponse>, GalleryError> {
    if state.gallery.cache().find_event(&id).await.is_none() {
        state.gallery.get_event(&id).await?;
    }
    let outcome = state.gallery.delete_event(&id).await?;
    Ok(Json(DeleteEventResponse::new(id, &outcome)))
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/events", get(list_public_events))
        .route("/api/events/{id}", get(get_public_event))
        .route(
            "/api/admin/events",
            get(list_admin_events).post(create_event),
        )
        .route(
            "/api/admin/events/{id}",
            get(get_admin_event).put(update_event).delete(delete_event),
        )
}
