//! Monthly schedules and the manager-side shift editing payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::shift::Shift;

/// Body of `POST /api/manager/schedules/new`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewScheduleRequest {
    /// Calendar year.
    pub year: i32,
    /// Calendar month, `1..=12`.
    pub month: u32,
}

impl NewScheduleRequest {
    /// Build a request, rejecting months outside `1..=12`.
    #[must_use]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }
}

/// A business schedule for one month.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Schedule {
    /// Server-assigned identifier.
    #[serde(rename = "_id", default)]
    pub id: String,
    /// Calendar year; older records store it as a string.
    #[serde(default)]
    pub year: Value,
    /// Calendar month; older records store it as a string.
    #[serde(default)]
    pub month: Value,
    /// Shifts in the schedule.
    #[serde(default)]
    pub shifts: Vec<Shift>,
    /// Server fields not modelled here.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `POST /api/manager/schedules/add_shift`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShiftDraft {
    /// Schedule receiving the shift.
    pub schedule_id: String,
    /// Employee assigned to the shift.
    pub employee_id: String,
    /// Start timestamp.
    pub start: String,
    /// End timestamp.
    pub end: String,
}

/// Body of the `edit_shift` and `delete_shift` endpoints.
///
/// Delete requests carry only the identifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShiftEdit {
    /// Schedule containing the shift.
    pub schedule_id: String,
    /// Shift being changed.
    pub shift_id: String,
    /// Replacement start timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// Replacement end timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    /// Replacement assignee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
}
