//! Pure URL construction for stored objects.

/// Route served by the image proxy handler.
pub const IMAGE_PROXY_PATH: &str = "/api/images/";

/// Builds fetchable URLs for object keys without touching the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlResolver {
    /// Objects are publicly reachable under this base URL.
    Public {
        /// Base URL without trailing slash, e.g. `http://minio:9000/photos`.
        base: String,
    },
    /// Objects are served through this service's proxy route.
    Proxy {
        /// Route prefix ending in `/`.
        path: String,
    },
}

impl UrlResolver {
    /// Resolver for a public base URL. A trailing slash is tolerated.
    #[must_use]
    pub fn public(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self::Public {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Resolver pointing at [`IMAGE_PROXY_PATH`].
    #[must_use]
    pub fn proxy() -> Self {
        Self::Proxy {
            path: IMAGE_PROXY_PATH.to_string(),
        }
    }

    /// Picks [`UrlResolver::public`] when a base URL is configured,
    /// [`UrlResolver::proxy`] otherwise.
    #[must_use]
    pub fn from_config(public_base_url: Option<&str>) -> Self {
        public_base_url.map_or_else(Self::proxy, Self::public)
    }

    /// URL of the object stored under `key`.
    #[must_use]
    pub fn resolve(&self, key: &str) -> String {
        let key = key.trim_start_matches('/');
        match self {
            Self::Public { base } => format!("{base}/{key}"),
            Self::Proxy { path } => format!("{path}{key}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_base_is_joined_with_single_slash() {
        let r = UrlResolver::public("http://localhost:9000/photos/");
        assert_eq!(
            r.resolve("evento-1/1-a.jpg"),
            "http://localhost:9000/photos/evento-1/1-a.jpg"
        );
    }

    #[test]
    fn missing_public_url_uses_proxy_route() {
        let r = UrlResolver::from_config(None);
        assert_eq!(r.resolve("evento-1/a.jpg"), "/api/images/evento-1/a.jpg");
    }
}
