//! Business creation and linking payloads.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opening hours for a single weekday, serialised as `HH:MM` strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BusinessHours {
    /// Weekday label, e.g. `Monday`.
    pub day: String,
    /// Opening time (`HH:MM`).
    pub open: String,
    /// Closing time (`HH:MM`).
    pub close: String,
}

/// Reasons a set of opening hours is rejected before it is sent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HoursError {
    /// The day label was empty.
    #[error("day label is required")]
    MissingDay,
    /// A time was not a valid `HH:MM` value.
    #[error("invalid time '{value}' for {day}")]
    InvalidTime {
        /// Day the bad value belongs to.
        day: String,
        /// Offending value.
        value: String,
    },
    /// Closing time was not after the opening time.
    #[error("close time must be after open time on {day}")]
    CloseBeforeOpen {
        /// Day with the inverted range.
        day: String,
    },
    /// The same day appeared twice.
    #[error("{day} is listed more than once")]
    DuplicateDay {
        /// Repeated day label.
        day: String,
    },
}

impl BusinessHours {
    /// Build a validated entry, normalising times to zero-padded `HH:MM`.
    ///
    /// # Errors
    ///
    /// Returns [`HoursError`] when the day is blank, a time does not parse,
    /// or the range is empty or inverted.
    pub fn new(day: &str, open: &str, close: &str) -> Result<Self, HoursError> {
        let day = day.trim();
        if day.is_empty() {
            return Err(HoursError::MissingDay);
        }
        let open_at = parse_clock(day, open)?;
        let close_at = parse_clock(day, close)?;
        if open_at >= close_at {
            return Err(HoursError::CloseBeforeOpen {
                day: day.to_string(),
            });
        }
        Ok(Self {
            day: day.to_string(),
            open: open_at.format("%H:%M").to_string(),
            close: close_at.format("%H:%M").to_string(),
        })
    }

    /// Parse a `Day=HH:MM-HH:MM` entry.
    ///
    /// # Errors
    ///
    /// Returns [`HoursError`] for malformed entries or invalid ranges.
    pub fn parse_entry(entry: &str) -> Result<Self, HoursError> {
        let (day, range) = entry.split_once('=').ok_or(HoursError::MissingDay)?;
        let (open, close) = range.split_once('-').ok_or_else(|| HoursError::InvalidTime {
            day: day.trim().to_string(),
            value: range.to_string(),
        })?;
        Self::new(day, open, close)
    }
}

/// Reject duplicate days across a full week of hours.
///
/// # Errors
///
/// Returns [`HoursError::DuplicateDay`] for the first repeated label.
pub fn ensure_unique_days(hours: &[BusinessHours]) -> Result<(), HoursError> {
    let mut seen: Vec<String> = Vec::with_capacity(hours.len());
    for entry in hours {
        let key = entry.day.to_ascii_lowercase();
        if seen.contains(&key) {
            return Err(HoursError::DuplicateDay {
                day: entry.day.clone(),
            });
        }
        seen.push(key);
    }
    Ok(())
}

fn parse_clock(day: &str, value: &str) -> Result<NaiveTime, HoursError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| HoursError::InvalidTime {
        day: day.to_string(),
        value: value.to_string(),
    })
}

/// Body of `POST /api/manager/new/business`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateBusinessRequest {
    /// Display name of the business.
    pub business_name: String,
    /// Weekly opening hours.
    pub hours: Vec<BusinessHours>,
}

/// Response of `POST /api/manager/new/business`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateBusinessResponse {
    /// Status message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Join code assigned to the new business.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_code: Option<String>,
}

/// Body of `POST /api/link_business`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkBusinessRequest {
    /// Business join code.
    pub code: String,
}

/// Response of `POST /api/link_business`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkBusinessResponse {
    /// Reissued access token carrying the new business code.
    #[serde(rename = "JWT", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Status message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
