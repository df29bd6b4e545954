//! Login request and response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /api/auth/login`.
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Admin user name.
    pub username: String,
    /// Admin password.
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Response body for a successful login. The token is also set as the
/// `admin-session` cookie.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Logged-in user name.
    pub username: String,
    /// Session token, usable as a bearer token.
    pub token: String,
    /// Session expiry.
    pub expires_at: DateTime<Utc>,
}
