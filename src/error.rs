//! Gallery error types with HTTP status code mapping.
//!
//! [`GalleryError`] is the central error type for the service. Every
//! adapter, the reconciliation engine, and the mutation coordinator report
//! failures through it. Each variant maps to a specific HTTP status code
//! and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "event not found: evento-1",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`GalleryError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Which backend a store failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// The relational store holding event and photo rows.
    Relational,
    /// The object store holding photo bytes and legacy metadata.
    Object,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Relational => f.write_str("relational store"),
            Self::Object => f.write_str("object store"),
        }
    }
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                |
/// |-----------|-----------------|----------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request            |
/// | 2000–2099 | Not Found       | 404 Not Found              |
/// | 2100–2199 | Identity        | 401 Unauthorized           |
/// | 3000–3999 | Server / Stores | 500 Internal Server Error  |
#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    /// Input was rejected before any I/O took place.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Event with the given ID was not found.
    #[error("event not found: {0}")]
    EventNotFound(String),

    /// Photo row with the given ID was not found.
    #[error("photo not found: {0}")]
    PhotoNotFound(String),

    /// Object-store key was not found.
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// Caller identity missing or invalid.
    #[error("unauthorized")]
    Unauthorized,

    /// A backend could not be reached or timed out.
    #[error("{store} unavailable: {message}")]
    StoreUnavailable {
        /// Store that failed.
        store: StoreKind,
        /// Backend error message.
        message: String,
    },

    /// One store was mutated and the paired operation on the other failed.
    /// Nothing was rolled back.
    #[error("partial failure: {failed}")]
    PartialFailure {
        /// Step that already committed.
        completed: String,
        /// Step that failed.
        failed: String,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GalleryError {
    /// Shorthand for a relational-store [`GalleryError::StoreUnavailable`].
    #[must_use]
    pub fn relational(message: impl std::fmt::Display) -> Self {
        Self::StoreUnavailable {
            store: StoreKind::Relational,
            message: message.to_string(),
        }
    }

    /// Shorthand for an object-store [`GalleryError::StoreUnavailable`].
    #[must_use]
    pub fn object(message: impl std::fmt::Display) -> Self {
        Self::StoreUnavailable {
            store: StoreKind::Object,
            message: message.to_string(),
        }
    }

    /// Returns `true` for the not-found family of variants.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::EventNotFound(_) | Self::PhotoNotFound(_) | Self::ObjectNotFound(_)
        )
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::EventNotFound(_) => 2001,
            Self::PhotoNotFound(_) => 2002,
            Self::ObjectNotFound(_) => 2003,
            Self::Unauthorized => 2100,
            Self::Internal(_) => 3000,
            Self::StoreUnavailable { .. } => 3001,
            Self::PartialFailure { .. } => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::EventNotFound(_) | Self::PhotoNotFound(_) | Self::ObjectNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::StoreUnavailable { .. } | Self::PartialFailure { .. } | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::PartialFailure { completed, .. } => {
                Some(format!("already committed: {completed}"))
            }
            _ => None,
        }
    }
}

impl IntoResponse for GalleryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_taxonomy() {
        assert_eq!(
            GalleryError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GalleryError::PhotoNotFound("p".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GalleryError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GalleryError::relational("down").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn partial_failure_carries_completed_step() {
        let err = GalleryError::PartialFailure {
            completed: "photo row deleted".into(),
            failed: "object delete failed".into(),
        };
        assert_eq!(err.error_code(), 3002);
        assert_eq!(
            err.details().as_deref(),
            Some("already committed: photo row deleted")
        );
    }

    #[test]
    fn store_unavailable_names_the_store() {
        let err = GalleryError::object("connection refused");
        assert_eq!(
            err.to_string(),
            "object store unavailable: connection refused"
        );
        assert!(!err.is_not_found());
        assert!(GalleryError::EventNotFound("e".into()).is_not_found());
    }
}
