use anyhow::anyhow;
use chrono::{NaiveDate, Utc};
use karnameh_config::GradingConfig;
use karnameh_core::AppError;
use karnameh_grading::{JalaliDate, SchoolYear, parse_lesson_date};
use tracing::instrument;

use super::model::JalaliConversion;

/// Oldest and newest school years a request may ask for.
pub const SCHOOL_YEAR_RANGE: std::ops::RangeInclusive<i32> = 1300..=1600;

pub struct CalendarService;

impl CalendarService {
    /// Today's date in the school's time zone.
    pub fn today(config: &GradingConfig) -> NaiveDate {
        Utc::now().with_timezone(&config.offset()).date_naive()
    }

    /// The requested school year, else the configured one, else the one
    /// containing today.
    pub fn resolve_school_year(
        requested: Option<i32>,
        config: &GradingConfig,
    ) -> Result<SchoolYear, AppError> {
        match requested.or(config.school_year) {
            Some(year) if SCHOOL_YEAR_RANGE.contains(&year) => Ok(SchoolYear(year)),
            Some(year) => Err(AppError::bad_request(anyhow!(
                "school_year {} is out of range ({}-{})",
                year,
                SCHOOL_YEAR_RANGE.start(),
                SCHOOL_YEAR_RANGE.end()
            ))),
            None => Ok(SchoolYear::containing(JalaliDate::from_gregorian(
                Self::today(config),
            ))),
        }
    }

    #[instrument(skip(config))]
    pub fn convert(
        raw_date: Option<&str>,
        config: &GradingConfig,
    ) -> Result<JalaliConversion, AppError> {
        let gregorian = match raw_date {
            Some(raw) => parse_lesson_date(raw, config.offset())
                .map_err(|e| AppError::bad_request(anyhow!("Invalid date: {}", e)))?,
            None => Self::today(config),
        };

        let jalali = JalaliDate::from_gregorian(gregorian);
        let school_year = SchoolYear::containing(jalali);
        let academic_month = school_year.slot(jalali);

        Ok(JalaliConversion {
            gregorian,
            jalali,
            formatted: jalali.to_string(),
            month_name: jalali.month_name().to_string(),
            school_year,
            academic_month,
            academic_position: academic_month.map(|m| m.position() as u32 + 1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_convert_first_of_mehr() {
        let conversion =
            CalendarService::convert(Some("2024-09-22"), &GradingConfig::default()).unwrap();

        assert_eq!(conversion.formatted, "1403/07/01");
        assert_eq!(conversion.month_name, "مهر");
        assert_eq!(conversion.school_year, SchoolYear(1403));
        assert_eq!(conversion.academic_position, Some(1));
    }

    #[test]
    fn test_convert_end_of_school_year() {
        let conversion =
            CalendarService::convert(Some("2025-09-21"), &GradingConfig::default()).unwrap();

        assert_eq!(conversion.jalali.month, 6);
        assert_eq!(conversion.school_year, SchoolYear(1403));
        assert_eq!(conversion.academic_position, Some(12));
    }

    #[test]
    fn test_convert_timestamp_uses_school_offset() {
        // 22:00 UTC on 21 Sep is 01:30 on 22 Sep in Tehran
        let conversion =
            CalendarService::convert(Some("2024-09-21T22:00:00Z"), &GradingConfig::default())
                .unwrap();
        assert_eq!(conversion.gregorian.to_string(), "2024-09-22");
    }

    #[test]
    fn test_convert_rejects_garbage() {
        let err = CalendarService::convert(Some("yesterday"), &GradingConfig::default())
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_resolve_school_year_precedence() {
        let config = GradingConfig {
            school_year: Some(1402),
            ..GradingConfig::default()
        };

        assert_eq!(
            CalendarService::resolve_school_year(Some(1403), &config).unwrap(),
            SchoolYear(1403)
        );
        assert_eq!(
            CalendarService::resolve_school_year(None, &config).unwrap(),
            SchoolYear(1402)
        );
        assert!(CalendarService::resolve_school_year(Some(99), &config).is_err());
    }
}
