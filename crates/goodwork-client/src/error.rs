//! Error types for client operations.
//!
//! Expected failure modes (offline backend, rejected input, forced
//! re-authentication) are reported through [`crate::ApiOutcome`]; the types
//! here cover the unexpected cases that callers are not meant to branch on.

use thiserror::Error;

/// Failures that escape the request client as `Err`.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A request path could not be joined onto the base URL.
    #[error("invalid request path '{path}'")]
    InvalidPath {
        /// Path supplied by the caller.
        path: String,
        /// Underlying URL parse error.
        #[source]
        source: url::ParseError,
    },
    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    HttpClient {
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// The request failed for a reason other than connectivity.
    #[error("request to {path} failed")]
    Transport {
        /// Request path.
        path: String,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// A response body could not be read.
    #[error("failed to read response body from {path}")]
    Body {
        /// Request path.
        path: String,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// A successful response did not match the expected shape.
    #[error("failed to decode response from {path}")]
    Decode {
        /// Request path.
        path: String,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// A request body could not be serialised.
    #[error("failed to encode request body for {path}")]
    Encode {
        /// Request path.
        path: String,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

/// Failures decoding the claims carried by an access token.
#[derive(Debug, Error)]
pub enum ClaimsError {
    /// The token did not have three dot-separated segments.
    #[error("token is not a three-part JWT")]
    Malformed,
    /// The payload segment was not valid base64url.
    #[error("token payload is not valid base64url")]
    Encoding {
        /// Underlying base64 error.
        #[source]
        source: base64::DecodeError,
    },
    /// The payload segment was not a JSON claims object.
    #[error("token payload is not a claims object")]
    Payload {
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

/// Failures completing a login or registration.
#[derive(Debug, Error)]
pub enum LoginError {
    /// The request itself failed unexpectedly.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// The issued token could not be decoded.
    #[error("login response carried an unreadable token")]
    Claims(#[from] ClaimsError),
    /// The token named a role with no landing page.
    #[error("unsupported account role '{role}'")]
    UnknownRole {
        /// Role claim found in the token.
        role: String,
    },
}

/// Failures building a [`crate::ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The base URL did not parse.
    #[error("invalid base URL '{value}'")]
    InvalidBaseUrl {
        /// Value supplied by the caller.
        value: String,
        /// Underlying URL parse error.
        #[source]
        source: url::ParseError,
    },
    /// The base URL cannot have paths joined onto it (e.g. `mailto:`).
    #[error("base URL '{value}' must be an http(s) URL")]
    UnsupportedBaseUrl {
        /// Value supplied by the caller.
        value: String,
    },
    /// A duration setting was zero.
    #[error("{field} must be greater than zero")]
    ZeroDuration {
        /// Setting name.
        field: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn errors_render_messages_and_sources() {
        let parse = url::Url::parse("::").unwrap_err();
        let invalid = ConfigError::InvalidBaseUrl {
            value: "::".into(),
            source: parse,
        };
        assert_eq!(invalid.to_string(), "invalid base URL '::'");
        assert!(invalid.source().is_some());

        let role = LoginError::UnknownRole {
            role: "owner".into(),
        };
        assert_eq!(role.to_string(), "unsupported account role 'owner'");

        let claims = LoginError::from(ClaimsError::Malformed);
        assert!(matches!(claims, LoginError::Claims(ClaimsError::Malformed)));
        assert_eq!(
            ConfigError::ZeroDuration { field: "timeout" }.to_string(),
            "timeout must be greater than zero"
        );
    }
}
