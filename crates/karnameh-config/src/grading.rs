//! Grading configuration.
//!
//! Lesson timestamps are stored as written by clients. Timestamps carrying a
//! UTC offset are moved into the school's local time before the calendar
//! date is taken, so a lesson at 01:00 Tehran time is not filed under the
//! previous day.
//!
//! # Environment Variables
//!
//! - `SCHOOL_UTC_OFFSET_MINUTES`: offset of the school time zone from UTC in
//!   minutes (default: 210, Iran Standard Time)
//! - `SCHOOL_YEAR`: Jalali year in which the default school year starts. When
//!   unset, the school year containing today is used.

use std::env;

use chrono::{FixedOffset, Offset, Utc};
use tracing::warn;

/// Iran Standard Time, UTC+03:30.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 210;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GradingConfig {
    pub utc_offset_minutes: i32,
    pub school_year: Option<i32>,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            school_year: None,
        }
    }
}

impl GradingConfig {
    pub fn from_env() -> Self {
        let utc_offset_minutes = env::var("SCHOOL_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_UTC_OFFSET_MINUTES);

        let school_year = env::var("SCHOOL_YEAR")
            .ok()
            .and_then(|v| v.trim().parse().ok());

        Self {
            utc_offset_minutes,
            school_year,
        }
    }

    /// The school time zone as a chrono offset.
    ///
    /// Out of range offsets (beyond ±24h) fall back to the default, including
    /// ones too large to convert to seconds.
    pub fn offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| {
                warn!(
                    utc_offset_minutes = self.utc_offset_minutes,
                    "Invalid school UTC offset, using +03:30"
                );
                default_offset()
            })
    }
}

fn default_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60).unwrap_or_else(|| Utc.fix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_tehran() {
        let config = GradingConfig::default();
        assert_eq!(config.offset().local_minus_utc(), 210 * 60);
        assert_eq!(config.school_year, None);
    }

    #[test]
    fn test_out_of_range_offset_falls_back() {
        let config = GradingConfig {
            utc_offset_minutes: 100_000,
            school_year: None,
        };
        assert_eq!(config.offset().local_minus_utc(), 210 * 60);
    }

    #[test]
    fn test_overflowing_offset_falls_back() {
        for utc_offset_minutes in [i32::MAX, i32::MIN] {
            let config = GradingConfig {
                utc_offset_minutes,
                school_year: None,
            };
            assert_eq!(config.offset().local_minus_utc(), 210 * 60);
        }
    }

    #[test]
    fn test_custom_offset() {
        let config = GradingConfig {
            utc_offset_minutes: -300,
            school_year: Some(1403),
        };
        assert_eq!(config.offset().local_minus_utc(), -300 * 60);
    }
}
