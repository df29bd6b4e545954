//! Admin login and logout.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{LoginRequest, LoginResponse, MessageResponse};
use crate::app_state::AppState;
use crate::auth::SESSION_COOKIE;
use crate::error::{ErrorResponse, GalleryError};

/// `POST /api/auth/login`: Start an admin session.
///
/// # Errors
///
/// Returns [`GalleryError::Unauthorized`] for wrong credentials.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    summary = "Log in",
    description = "Checks the configured admin credentials and sets the `admin-session` cookie.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Wrong credentials", body = ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, GalleryError> {
    if !state.credentials.matches(&req.username, &req.password) {
        tracing::warn!(username = %req.username, "admin login rejected");
        return Err(GalleryError::Unauthorized);
    }

    let token = state.sessions.issue(&req.username)?;
    let ttl = state.sessions.ttl();
    let cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        ttl.num_seconds()
    );
    tracing::info!(username = %req.username, "admin logged in");

    Ok((
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            username: req.username,
            token,
            expires_at: Utc::now() + ttl,
        }),
    ))
}

/// `POST /api/auth/logout`: Clear the session cookie.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    summary = "Log out",
    responses(
        (status = 200, description = "Cookie cleared", body = MessageResponse),
    )
)]
pub async fn logout() -> impl IntoResponse {
    let cookie = format!("{SESSION_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0");
    ([(SET_COOKIE, cookie)], Json(MessageResponse::new("logged out")))
}

/// Session routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
}
