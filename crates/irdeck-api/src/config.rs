//! Runtime configuration for the hub connection.
//!
//! The CLI rendition of the host-injected runtime config: base URL,
//! optional API key, and whether the hub demands a key for writes.

use url::Url;

use crate::error::{ApiError, ErrorKind};

#[derive(Debug, Clone)]
pub struct HubConfig {
    /// API base including any path prefix, e.g. `http://hub:8000/api`.
    base_url: Url,
    pub api_key: Option<String>,
    /// When true the hub rejects mutating calls without a key; checked
    /// client-side only to give a better error message up front.
    pub write_requires_api_key: bool,
}

impl HubConfig {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::local(ErrorKind::BadRequest, format!("invalid hub URL {base_url:?}: {e}")))?;
        match url.scheme() {
            "http" | "https" => Ok(Self {
                base_url: url,
                api_key: None,
                write_requires_api_key: false,
            }),
            other => Err(ApiError::local(
                ErrorKind::BadRequest,
                format!("unsupported hub URL scheme {other:?} (expected http or https)"),
            )),
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.is_empty());
        self
    }

    pub fn with_write_requires_api_key(mut self, required: bool) -> Self {
        self.write_requires_api_key = required;
        self
    }

    /// Full URL for an API path like `/learn/status`.
    pub fn api_url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        {
            let base_path = url.path().trim_end_matches('/').to_owned();
            url.set_path(&format!("{base_path}/{}", path.trim_start_matches('/')));
        }
        url
    }

    /// WebSocket URL for a push path like `/learn/status/ws`, with
    /// `ws`/`wss` derived from the configured `http`/`https` scheme.
    pub fn ws_url(&self, path: &str) -> Url {
        let mut url = self.api_url(path);
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        // Infallible: ws/wss are valid schemes for http(s) URLs.
        let _ = url.set_scheme(scheme);
        url
    }

    /// True when mutating calls can be expected to pass authentication.
    pub fn can_write(&self) -> bool {
        !self.write_requires_api_key || self.api_key.is_some()
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_joins_under_base_prefix() {
        let config = HubConfig::new("http://hub:8000/api").expect("config");
        assert_eq!(
            config.api_url("/learn/status").as_str(),
            "http://hub:8000/api/learn/status"
        );
        assert_eq!(
            config.api_url("remotes").as_str(),
            "http://hub:8000/api/remotes"
        );
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let config = HubConfig::new("http://hub:8000/api/").expect("config");
        assert_eq!(
            config.api_url("/remotes").as_str(),
            "http://hub:8000/api/remotes"
        );
    }

    #[test]
    fn ws_scheme_follows_http_scheme() {
        let http = HubConfig::new("http://hub:8000/api").expect("config");
        assert_eq!(
            http.ws_url("/learn/status/ws").as_str(),
            "ws://hub:8000/api/learn/status/ws"
        );
        let https = HubConfig::new("https://hub.example/api").expect("config");
        assert_eq!(
            https.ws_url("/learn/status/ws").as_str(),
            "wss://hub.example/api/learn/status/ws"
        );
    }

    #[test]
    fn rejects_non_http_schemes() {
        assert!(HubConfig::new("ftp://hub").is_err());
        assert!(HubConfig::new("not a url").is_err());
    }

    #[test]
    fn empty_api_key_is_treated_as_absent() {
        let config = HubConfig::new("http://hub/api")
            .expect("config")
            .with_api_key(Some(String::new()))
            .with_write_requires_api_key(true);
        assert!(config.api_key.is_none());
        assert!(!config.can_write());
    }

    #[test]
    fn can_write_with_key_or_open_hub() {
        let open = HubConfig::new("http://hub/api").expect("config");
        assert!(open.can_write());
        let locked = HubConfig::new("http://hub/api")
            .expect("config")
            .with_write_requires_api_key(true)
            .with_api_key(Some("secret".to_owned()));
        assert!(locked.can_write());
    }
}
