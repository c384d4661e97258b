//! Account registration, login and token refresh payloads.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterRequest {
    /// Given name.
    #[serde(rename = "firstName")]
    pub first_name: String,
    /// Family name.
    #[serde(rename = "lastName")]
    pub last_name: String,
    /// Unique login name.
    pub username: String,
    /// Plain-text password; validated server-side.
    pub password: String,
    /// `manager` or `employee`.
    pub role: String,
    /// Business code to join at registration time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// Login name.
    pub username: String,
    /// Plain-text password.
    pub password: String,
}

/// Token pair issued by the login and register endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    /// Short-lived access token.
    #[serde(rename = "JWT")]
    pub access_token: String,
    /// Longer-lived refresh token, when the server issues one.
    #[serde(
        rename = "refresh_JWT",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_token: Option<String>,
    /// Echo of the account name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Status message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response of `POST /refresh`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshResponse {
    /// Replacement access token.
    #[serde(rename = "JWT")]
    pub access_token: String,
}
