//! Shift records and the home page payload that carries them.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Length assumed for a shift whose end time is missing or unreadable.
pub const DEFAULT_SHIFT_LENGTH_MINUTES: i64 = 60;

/// A single scheduled shift as stored by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Shift {
    /// Server-assigned identifier.
    #[serde(rename = "_id", default)]
    pub id: String,
    /// Start timestamp as emitted by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// End timestamp as emitted by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    /// Assigned employee identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    /// Assigned employee display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    /// Server fields not modelled here.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Shift {
    /// Resolve the shift's time window.
    ///
    /// A missing or unreadable end falls back to one hour after the start.
    /// Returns `None` when the start itself cannot be read.
    #[must_use]
    pub fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.start.as_deref().and_then(parse_timestamp)?;
        let end = self
            .end
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or_else(|| start + Duration::minutes(DEFAULT_SHIFT_LENGTH_MINUTES));
        Some((start, end))
    }
}

/// Parse the timestamp formats the backend is known to emit.
///
/// RFC 3339 values keep their offset; naive values are taken as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// `{ "shifts": [...] }` envelope used by the shift listing endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ShiftList {
    /// Shifts returned by the server.
    #[serde(default, deserialize_with = "shifts_or_empty")]
    pub shifts: Vec<Shift>,
}

/// `{ "shift_id": ... }` body used to post or take a shift.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShiftRef {
    /// Identifier of the shift being acted on.
    pub shift_id: String,
}

/// Response of `GET /api/home`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HomeResponse {
    /// Display name of the user's business.
    #[serde(default)]
    pub business_name: String,
    /// Join code of the business.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_code: Option<String>,
    /// Shifts of the current month's schedule.
    #[serde(default, deserialize_with = "shifts_or_empty")]
    pub shifts: Vec<Shift>,
    /// Identifier of the current month's schedule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<String>,
    /// Status message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HomeResponse {
    /// Schedule identifier, ignoring the literal `"None"` the server emits
    /// when no schedule exists for the month.
    #[must_use]
    pub fn schedule(&self) -> Option<&str> {
        self.schedule_id
            .as_deref()
            .filter(|id| !id.is_empty() && *id != "None")
    }
}

/// The backend sends `""` instead of an empty list when no schedule exists.
fn shifts_or_empty<'de, D>(deserializer: D) -> Result<Vec<Shift>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ShiftsField {
        List(Vec<Shift>),
        Other(Value),
    }

    Ok(match ShiftsField::deserialize(deserializer)? {
        ShiftsField::List(shifts) => shifts,
        ShiftsField::Other(_) => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn home_response_tolerates_empty_string_shifts() {
        let home: HomeResponse = serde_json::from_value(json!({
            "message": "success",
            "business_name": "Cafe",
            "business_code": "ABC123",
            "schedule_id": "None",
            "shifts": ""
        }))
        .unwrap();
        assert!(home.shifts.is_empty());
        assert_eq!(home.schedule(), None);
        assert_eq!(home.business_code.as_deref(), Some("ABC123"));
    }

    #[test]
    fn shift_keeps_unknown_fields() {
        let shift: Shift = serde_json::from_value(json!({
            "_id": "s1",
            "start": "2025-03-01T09:00:00Z",
            "employee_name": "Sam",
            "posted": true
        }))
        .unwrap();
        assert_eq!(shift.id, "s1");
        assert_eq!(shift.extra.get("posted"), Some(&json!(true)));
        let back = serde_json::to_value(&shift).unwrap();
        assert_eq!(back["posted"], json!(true));
    }

    #[test]
    fn window_defaults_missing_end_to_one_hour() {
        let shift = Shift {
            id: "s1".into(),
            start: Some("2025-03-01 09:00:00".into()),
            ..Shift::default()
        };
        let (start, end) = shift.window().unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn window_respects_offsets_and_rejects_garbage() {
        let shift = Shift {
            start: Some("2025-03-01T09:00:00+02:00".into()),
            end: Some("2025-03-01T17:30:00+02:00".into()),
            ..Shift::default()
        };
        let (start, end) = shift.window().unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 1, 7, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 1, 15, 30, 0).unwrap());

        let broken = Shift {
            start: Some("yesterday".into()),
            ..Shift::default()
        };
        assert!(broken.window().is_none());
    }
}
