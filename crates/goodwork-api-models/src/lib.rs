#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, unreachable_pub, clippy::all, clippy::pedantic)]

//! Shared HTTP DTOs for the Good Work scheduling API.
//!
//! The backend owns every resource described here; these types only mirror
//! the JSON it emits and accepts. Payloads whose shape the server may extend
//! keep unknown fields in a flattened `extra` map so nothing is dropped on a
//! read-modify-write round trip.

pub mod activity;
pub mod auth;
pub mod business;
pub mod schedule;
pub mod shift;

pub use activity::{ActivityStatus, LogActivityRequest, UpcomingShiftResponse};
pub use auth::{LoginRequest, RefreshResponse, RegisterRequest, TokenResponse};
pub use business::{
    BusinessHours, CreateBusinessRequest, CreateBusinessResponse, HoursError, LinkBusinessRequest,
    LinkBusinessResponse, ensure_unique_days,
};
pub use schedule::{NewScheduleRequest, Schedule, ShiftDraft, ShiftEdit};
pub use shift::{HomeResponse, Shift, ShiftList, ShiftRef, parse_timestamp};

use serde::{Deserialize, Serialize};

/// Generic `{ "message": ... }` envelope returned by most endpoints.
///
/// The development proxy answers unreachable backends with `{ "error": ... }`
/// instead, so both fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiMessage {
    /// Human-readable status or failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error text used by the proxy layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiMessage {
    /// Best available text, preferring `message` over `error`.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .filter(|text| !text.trim().is_empty())
    }
}
