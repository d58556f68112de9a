//! Schedule slot value object ("09:00-10:00").

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{Timestamp, ValidationError};

/// A booked time window within a day, e.g. "09:00-10:00".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeSlot(String);

impl TimeSlot {
    /// Parses and validates a slot string of the form `HH:MM-HH:MM`.
    ///
    /// The end must be strictly after the start.
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let (start, end) = value
            .split_once('-')
            .ok_or_else(|| Self::format_error())?;
        let start = Self::parse_time(start)?;
        let end = Self::parse_time(end)?;
        if end <= start {
            return Err(ValidationError::invalid_format(
                "schedule_time",
                "slot end must be after start",
            ));
        }
        Ok(Self(value))
    }

    /// Returns the slot as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The start-of-window time.
    pub fn start(&self) -> NaiveTime {
        // Validated at construction.
        let (start, _) = self.0.split_once('-').unwrap_or((&self.0, ""));
        Self::parse_time(start).unwrap_or_else(|_| NaiveTime::MIN)
    }

    /// The moment this slot opens on the given date.
    pub fn window_start(&self, date: NaiveDate) -> Timestamp {
        Timestamp::from_datetime(Utc.from_utc_datetime(&date.and_time(self.start())))
    }

    fn parse_time(s: &str) -> Result<NaiveTime, ValidationError> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|_| Self::format_error())
    }

    fn format_error() -> ValidationError {
        ValidationError::invalid_format("schedule_time", "expected HH:MM-HH:MM")
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TimeSlot {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeSlot::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_morning_slot() {
        let slot = TimeSlot::parse("09:00-10:00").unwrap();
        assert_eq!(slot.as_str(), "09:00-10:00");
        assert_eq!(slot.start(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn rejects_missing_separator_and_bad_times() {
        assert!(TimeSlot::parse("09:00").is_err());
        assert!(TimeSlot::parse("9am-10am").is_err());
        assert!(TimeSlot::parse("25:00-26:00").is_err());
        assert!(TimeSlot::parse("").is_err());
    }

    #[test]
    fn rejects_inverted_window() {
        assert!(TimeSlot::parse("10:00-09:00").is_err());
        assert!(TimeSlot::parse("10:00-10:00").is_err());
    }

    #[test]
    fn window_start_combines_date_and_slot_start() {
        let slot = TimeSlot::parse("14:30-15:30").unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 8, 26).unwrap();
        let start = slot.window_start(date);
        assert_eq!(start.as_datetime().to_rfc3339(), "2026-08-26T14:30:00+00:00");
    }
}
