//! Admin identity extractor.

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;

use crate::app_state::AppState;
use crate::auth::{AdminIdentity, SESSION_COOKIE};
use crate::error::GalleryError;

/// Verified admin caller. Handlers taking this argument answer `401`
/// without a valid session.
///
/// The token is read from the `admin-session` cookie, or from an
/// `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct AdminSession(pub AdminIdentity);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = GalleryError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_cookie(parts)
            .or_else(|| bearer_token(parts))
            .ok_or(GalleryError::Unauthorized)?;
        state
            .verifier
            .verify(&token)
            .map(Self)
            .ok_or(GalleryError::Unauthorized)
    }
}

fn session_cookie(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(header: (&str, &str)) -> Parts {
        let (parts, ()) = Request::builder()
            .header(header.0, header.1)
            .body(())
            .map(Request::into_parts)
            .unwrap_or_else(|_| Request::new(()).into_parts());
        parts
    }

    #[test]
    fn cookie_is_found_among_others() {
        let p = parts(("cookie", "theme=dark; admin-session=abc.def; lang=pt"));
        assert_eq!(session_cookie(&p).as_deref(), Some("abc.def"));
    }

    #[test]
    fn empty_cookie_is_ignored() {
        let p = parts(("cookie", "admin-session="));
        assert_eq!(session_cookie(&p), None);
    }

    #[test]
    fn bearer_header_is_read() {
        let p = parts(("authorization", "Bearer tok"));
        assert_eq!(bearer_token(&p).as_deref(), Some("tok"));
        let p = parts(("authorization", "Basic xyz"));
        assert_eq!(bearer_token(&p), None);
    }
}
