use chrono::NaiveDate;
use karnameh_core::serde::empty_string_as_none;
use karnameh_grading::{AcademicMonth, JalaliDate, SchoolYear};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct JalaliQueryParams {
    /// Gregorian date (`YYYY-MM-DD` or an RFC 3339 timestamp); today when absent
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct JalaliConversion {
    pub gregorian: NaiveDate,
    pub jalali: JalaliDate,
    /// `YYYY/MM/DD`
    pub formatted: String,
    pub month_name: String,
    /// The school year this date falls in
    pub school_year: SchoolYear,
    /// Month slot within `school_year`
    pub academic_month: Option<AcademicMonth>,
    /// 1 for Mehr through 12 for Shahrivar
    pub academic_position: Option<u32>,
}
