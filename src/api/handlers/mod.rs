//! REST endpoint handlers organized by resource.

pub mod auth;
pub mod events;
pub mod images;
pub mod photos;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(events::routes())
        .merge(photos::routes())
        .merge(images::routes())
        .merge(auth::routes())
}
