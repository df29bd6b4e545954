//! OpenAPI document and Swagger UI.

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::dto::{
    DeleteEventResponse, DownloadUrlResponse, EventListResponse, LoginRequest, LoginResponse,
    MessageResponse, PhotoListResponse, UpdateEventRequest,
};
use super::handlers::{auth, events, images, photos, system};
use crate::domain::{Event, Photo};
use crate::error::{ErrorBody, ErrorResponse};

/// OpenAPI description of every route.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "gallery-gateway", description = "Photo gallery events and photos"),
    paths(
        events::list_public_events,
        events::get_public_event,
        events::list_admin_events,
        events::create_event,
        events::get_admin_event,
        events::update_event,
        events::delete_event,
        photos::list_event_photos,
        photos::photo_download_url,
        photos::upload_photos,
        photos::delete_photo,
        images::get_image,
        auth::login,
        auth::logout,
        system::health_handler,
    ),
    components(schemas(
        Event,
        Photo,
        EventListResponse,
        PhotoListResponse,
        UpdateEventRequest,
        DeleteEventResponse,
        DownloadUrlResponse,
        MessageResponse,
        LoginRequest,
        LoginResponse,
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
    ))
)]
pub struct ApiDoc;

/// Swagger UI at `/swagger-ui` serving `/api-docs/openapi.json`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
