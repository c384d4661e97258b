//! Clock-in/clock-out activity payloads.

use serde::{Deserialize, Serialize};

use crate::shift::Shift;

/// Response of `GET /api/activity`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActivityStatus {
    /// Next shift the employee can clock into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upcoming_shift: Option<Shift>,
    /// Whether the employee is currently clocked in.
    #[serde(default)]
    pub clocked_in: bool,
}

/// Body of `POST /api/log_activity`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogActivityRequest {
    /// Shift being clocked.
    pub shift_id: String,
    /// `true` to clock in, `false` to clock out.
    pub clock_in: bool,
}

/// Response of the upcoming shift endpoint.
///
/// The server answers `202` with only a message when nothing is upcoming.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpcomingShiftResponse {
    /// Status message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Next shift, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift: Option<Shift>,
}
