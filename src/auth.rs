//! Admin session tokens.
//!
//! The core never checks credentials itself. The HTTP layer asks a
//! [`SessionVerifier`] to turn the caller's token into an
//! [`AdminIdentity`] before any admin route runs.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::GalleryError;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "admin-session";

/// A verified admin caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    /// Admin user name.
    pub username: String,
}

/// Turns a session token into an identity.
pub trait SessionVerifier: Send + Sync + fmt::Debug {
    /// Returns the identity behind `token`, or `None` if the token is
    /// missing, malformed, forged or expired.
    fn verify(&self, token: &str) -> Option<AdminIdentity>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// HS256 JWT sessions signed with a shared secret.
#[derive(Clone)]
pub struct JwtSessionVerifier {
    secret: Vec<u8>,
    ttl: Duration,
}

impl fmt::Debug for JwtSessionVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSessionVerifier")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl JwtSessionVerifier {
    /// Creates a verifier whose tokens live for `ttl_hours`.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>, ttl_hours: u64) -> Self {
        Self {
            secret: secret.into(),
            ttl: i64::try_from(ttl_hours)
                .ok()
                .and_then(Duration::try_hours)
                .unwrap_or_else(|| Duration::hours(24)),
        }
    }

    /// Session lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `username`.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::Internal`] if signing fails.
    pub fn issue(&self, username: &str) -> Result<String, GalleryError> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
                .timestamp(),
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| GalleryError::Internal(format!("session signing: {e}")))
    }
}

impl SessionVerifier for JwtSessionVerifier {
    fn verify(&self, token: &str) -> Option<AdminIdentity> {
        let validation = Validation::new(Algorithm::HS256);
        match jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &validation,
        ) {
            Ok(data) => Some(AdminIdentity {
                username: data.claims.sub,
            }),
            Err(e) => {
                tracing::debug!(error = %e, "session token rejected");
                None
            }
        }
    }
}

/// Configured admin user name and password.
#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    password: String,
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AdminCredentials {
    /// Creates the credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns `true` if both values match.
    #[must_use]
    pub fn matches(&self, username: &str, password: &str) -> bool {
        // Both compared in full, no early exit.
        let user_ok = constant_time_eq(self.username.as_bytes(), username.as_bytes());
        let pass_ok = constant_time_eq(self.password.as_bytes(), password.as_bytes());
        user_ok & pass_ok
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0_u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let verifier = JwtSessionVerifier::new("secret", 24);
        let Ok(token) = verifier.issue("admin") else {
            panic!("issue failed");
        };
        assert_eq!(
            verifier.verify(&token),
            Some(AdminIdentity {
                username: "admin".to_string()
            })
        );
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let Ok(token) = JwtSessionVerifier::new("one", 24).issue("admin") else {
            panic!("issue failed");
        };
        assert!(JwtSessionVerifier::new("two", 24).verify(&token).is_none());
        assert!(JwtSessionVerifier::new("one", 24).verify("garbage").is_none());
    }

    #[test]
    fn out_of_range_ttl_falls_back_instead_of_panicking() {
        assert_eq!(JwtSessionVerifier::new("s", u64::MAX).ttl(), Duration::hours(24));
        assert_eq!(
            JwtSessionVerifier::new("s", i64::MAX.unsigned_abs()).ttl(),
            Duration::hours(24)
        );

        let far = JwtSessionVerifier::new("s", 1_000_000_000_000);
        assert_eq!(far.ttl(), Duration::hours(1_000_000_000_000));
        let Ok(token) = far.issue("admin") else {
            panic!("issue failed");
        };
        assert!(far.verify(&token).is_some());
    }

    #[test]
    fn expired_token_is_rejected() {
        let verifier = JwtSessionVerifier::new("secret", 24);
        let claims = Claims {
            sub: "admin".to_string(),
            iat: 0,
            exp: Utc::now().timestamp() - 3600,
        };
        let Ok(token) = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        ) else {
            panic!("encode failed");
        };
        assert!(verifier.verify(&token).is_none());
    }

    #[test]
    fn credentials_must_both_match() {
        let creds = AdminCredentials::new("admin", "admin123");
        assert!(creds.matches("admin", "admin123"));
        assert!(!creds.matches("admin", "wrong"));
        assert!(!creds.matches("root", "admin123"));
        assert!(!format!("{creds:?}").contains("admin123"));
    }
}
