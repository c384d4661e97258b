//! Unverified access-token claims and the post-login landing decision.
//!
//! Claims are derived data: decode them from the current token whenever they
//! are needed instead of caching them, since a refresh replaces the token.

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

use crate::error::ClaimsError;

/// Claims the backend embeds in its access tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Account role, e.g. `manager`.
    #[serde(default)]
    pub role: Option<String>,
    /// Business join code; empty or absent until the account is linked.
    #[serde(rename = "code", default)]
    pub business_code: Option<String>,
    /// Account identifier.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Token subject (the username).
    #[serde(default)]
    pub sub: Option<String>,
    /// Expiry as seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Parsed role claim.
    #[must_use]
    pub fn role(&self) -> Role {
        Role::from_claim(self.role.as_deref().unwrap_or_default())
    }

    /// Business code, treating an empty claim as absent.
    #[must_use]
    pub fn business_code(&self) -> Option<&str> {
        self.business_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }

    /// Whether `exp` lies at or before `now` (seconds since the epoch).
    ///
    /// Tokens without an expiry never report expired.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp.is_some_and(|exp| exp <= now)
    }
}

/// Account roles known to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Manages a business and its schedules.
    Manager,
    /// Works shifts at a business.
    Employee,
    /// Any role the client has no behaviour for.
    Other(String),
}

impl Role {
    /// Parse a role claim case-insensitively.
    #[must_use]
    pub fn from_claim(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "manager" => Self::Manager,
            "employee" => Self::Employee,
            _ => Self::Other(raw.to_string()),
        }
    }

    /// Lower-case wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Manager => "manager",
            Self::Employee => "employee",
            Self::Other(raw) => raw,
        }
    }
}

/// Where a freshly authenticated user should be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandingPage {
    /// Manager with a linked business.
    ManagerHome,
    /// Manager who still has to create a business.
    CreateBusiness,
    /// Employee home.
    EmployeeHome,
}

impl LandingPage {
    /// Pick the landing page for a set of claims; `None` for unknown roles.
    #[must_use]
    pub fn for_claims(claims: &TokenClaims) -> Option<Self> {
        match claims.role() {
            Role::Manager if claims.business_code().is_some() => Some(Self::ManagerHome),
            Role::Manager => Some(Self::CreateBusiness),
            Role::Employee => Some(Self::EmployeeHome),
            Role::Other(_) => None,
        }
    }

    /// Front-end route of the page.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::ManagerHome => "/manager-home",
            Self::CreateBusiness => "/create-business",
            Self::EmployeeHome => "/employee-home",
        }
    }
}

/// Decode the payload segment of a JWT without verifying its signature.
///
/// # Errors
///
/// Returns [`ClaimsError`] when the token is not a three-part JWT or its
/// payload is not base64url-encoded JSON.
pub fn decode_claims(token: &str) -> Result<TokenClaims, ClaimsError> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(ClaimsError::Malformed);
    };

    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|source| ClaimsError::Encoding { source })?;
    serde_json::from_slice(&bytes).map_err(|source| ClaimsError::Payload { source })
}
