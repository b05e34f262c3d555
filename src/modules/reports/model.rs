use karnameh_core::serde::empty_string_as_none;
use karnameh_models::TeacherId;
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

/// Query parameters of the report card and cohort sheet.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, Validate)]
pub struct ReportQueryParams {
    /// Jalali year the school year starts in (default: configured or current)
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(range(min = 1300, max = 1600))]
    pub school_year: Option<i32>,
    /// Restrict to the courses of one teacher
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[param(value_type = Option<String>)]
    pub teacher_id: Option<TeacherId>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, Validate)]
pub struct RankingQueryParams {
    /// Jalali year the school year starts in (default: configured or current)
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(range(min = 1300, max = 1600))]
    pub school_year: Option<i32>,
    /// Jalali month (1-12) to rank by instead of the whole year
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(range(min = 1, max = 12))]
    pub month: Option<u32>,
}
