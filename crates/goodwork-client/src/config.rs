//! Client configuration and HTTP client construction.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use url::Url;

use crate::error::{ClientError, ConfigError};

/// Base URL used when nothing overrides it.
pub const DEFAULT_API_URL: &str = "http://localhost:3333";
/// Per-request timeout used when nothing overrides it.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Reachability poll period used when nothing overrides it.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;
/// Header carrying the per-invocation trace identifier.
pub const HEADER_REQUEST_ID: &str = "x-request-id";

/// Settings shared by every request a client issues.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root that request paths are joined onto.
    pub base_url: Url,
    /// Upper bound on a single HTTP exchange.
    pub timeout: Duration,
    /// Token file; `None` keeps tokens in memory only.
    pub token_path: Option<PathBuf>,
    /// Period of the background reachability poll.
    pub poll_interval: Duration,
    /// Value sent as `x-request-id` on every request.
    pub request_id: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_URL).unwrap_or_else(|_| unreachable!()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            token_path: None,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            request_id: None,
        }
    }
}

impl ClientConfig {
    /// Replace the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `raw` does not parse or is not an
    /// http(s) URL.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(raw)?;
        Ok(self)
    }

    /// Check duration settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroDuration`] for a zero timeout or poll interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroDuration { field: "timeout" });
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "poll_interval",
            });
        }
        Ok(())
    }

    /// Build the reqwest client used for every call.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::HttpClient`] if the TLS backend cannot be set up.
    pub fn build_http_client(&self) -> Result<Client, ClientError> {
        let mut default_headers = HeaderMap::new();
        if let Some(value) = self
            .request_id
            .as_deref()
            .and_then(|id| HeaderValue::from_str(id).ok())
        {
            default_headers.insert(HEADER_REQUEST_ID, value);
        }

        Client::builder()
            .timeout(self.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|source| ClientError::HttpClient { source })
    }
}

/// Parse and normalise a base URL.
///
/// # Errors
///
/// Returns [`ConfigError`] when `raw` does not parse or is not an http(s) URL.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|source| ConfigError::InvalidBaseUrl {
        value: trimmed.to_string(),
        source,
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedBaseUrl {
            value: trimmed.to_string(),
        });
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url.as_str(), "http://localhost:3333/");
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn base_url_override_is_validated() {
        let config = ClientConfig::default()
            .with_base_url(" https://api.example.test/ ")
            .unwrap();
        assert_eq!(config.base_url.host_str(), Some("api.example.test"));

        assert!(matches!(
            ClientConfig::default().with_base_url("not a url"),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            ClientConfig::default().with_base_url("mailto:ops@example.test"),
            Err(ConfigError::UnsupportedBaseUrl { .. })
        ));
    }

    #[test]
    fn zero_durations_are_rejected() {
        let config = ClientConfig {
            poll_interval: Duration::ZERO,
            ..ClientConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroDuration {
                field: "poll_interval"
            })
        ));
    }

    #[test]
    fn http_client_builds_with_request_id() {
        let config = ClientConfig {
            request_id: Some("trace-1".into()),
            ..ClientConfig::default()
        };
        assert!(config.build_http_client().is_ok());
    }
}
