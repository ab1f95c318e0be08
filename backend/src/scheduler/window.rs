//! Parsing and validation of the configured purchase window.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

use crate::error::ValidationError;

/// Local wall-clock formats accepted for window bounds, most common first.
const FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl ScheduleWindow {
    /// Parses both bounds in `timezone`. A missing bound stays `None`.
    pub fn parse(
        start: Option<&str>,
        end: Option<&str>,
        timezone: FixedOffset,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            start: start.map(|v| parse_local("start", v, timezone)).transpose()?,
            end: end.map(|v| parse_local("end", v, timezone)).transpose()?,
        })
    }

    /// Rejects a window whose start is not strictly before its end.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start >= end => Err(ValidationError::StartNotBeforeEnd {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            }),
            _ => Ok(()),
        }
    }
}

pub fn parse_local(
    field: &'static str,
    value: &str,
    timezone: FixedOffset,
) -> Result<DateTime<Utc>, ValidationError> {
    let invalid = || ValidationError::InvalidDateTime {
        field,
        value: value.to_string(),
    };

    let value = value.trim();
    let naive = FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(invalid)?;

    timezone
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(invalid)
}
