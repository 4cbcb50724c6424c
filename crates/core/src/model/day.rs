use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const DAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DayIndexError {
    #[error("day index must be in 0..=6, got {0}")]
    OutOfRange(u8),
    #[error("invalid day index key: {0:?}")]
    InvalidKey(String),
}

/// Sunday-first day-of-week slot (0 = Sunday, 6 = Saturday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DayIndex(u8);

impl DayIndex {
    pub const SUNDAY: Self = Self(0);
    pub const SATURDAY: Self = Self(6);

    /// # Errors
    ///
    /// Returns `DayIndexError::OutOfRange` for values above 6.
    pub fn new(value: u8) -> Result<Self, DayIndexError> {
        if value > 6 {
            return Err(DayIndexError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn from_weekday(day: Weekday) -> Self {
        // num_days_from_sunday is always in 0..=6
        Self(day.num_days_from_sunday() as u8)
    }

    /// Parses a document key such as `"3"`.
    ///
    /// # Errors
    ///
    /// Returns `DayIndexError` if the key is not a number in range.
    pub fn from_key(key: &str) -> Result<Self, DayIndexError> {
        let value: u8 = key
            .trim()
            .parse()
            .map_err(|_| DayIndexError::InvalidKey(key.to_string()))?;
        Self::new(value)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Short English label used on the progress chart.
    #[must_use]
    pub fn label(self) -> &'static str {
        DAY_LABELS[usize::from(self.0)]
    }

    /// Key used for this day inside the persisted `progressData` map.
    #[must_use]
    pub fn key(self) -> String {
        self.0.to_string()
    }

    pub fn all() -> impl Iterator<Item = DayIndex> {
        (0..7).map(DayIndex)
    }
}

impl TryFrom<u8> for DayIndex {
    type Error = DayIndexError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DayIndex> for u8 {
    fn from(day: DayIndex) -> Self {
        day.0
    }
}

impl fmt::Display for DayIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sunday_is_index_zero() {
        assert_eq!(DayIndex::from_weekday(Weekday::Sun), DayIndex::SUNDAY);
        assert_eq!(DayIndex::from_weekday(Weekday::Sat), DayIndex::SATURDAY);
        assert_eq!(DayIndex::from_weekday(Weekday::Wed).label(), "Wed");
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(DayIndex::new(7), Err(DayIndexError::OutOfRange(7)));
        assert!(DayIndex::from_key("x").is_err());
        assert!(DayIndex::from_key("9").is_err());
    }

    #[test]
    fn parses_document_keys() {
        let day = DayIndex::from_key("4").unwrap();
        assert_eq!(day.value(), 4);
        assert_eq!(day.key(), "4");
        assert_eq!(day.to_string(), "Thu");
    }

    #[test]
    fn all_days_in_order() {
        let labels: Vec<_> = DayIndex::all().map(DayIndex::label).collect();
        assert_eq!(labels, DAY_LABELS);
    }
}
