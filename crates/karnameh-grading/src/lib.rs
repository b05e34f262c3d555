//! # Karnameh Grading
//!
//! The score aggregation engine. Everything here is synchronous and pure:
//! callers fetch lesson records and overrides, then hand them over.
//!
//! - [`calendar`]: Gregorian to Jalali conversion
//! - [`school_year`]: School year window and month slots
//! - [`intake`]: Parsing lesson dates and bucketing records by month
//! - [`scoring`]: Monthly score normalization and assessment adjustment
//! - [`aggregate`]: Course year averages and report cards
//! - [`ranking`]: Competition ranking, progress and cohort sheets
//!
//! # Example
//!
//! ```ignore
//! use karnameh_grading::{
//!     AssessmentScale, CourseMeta, OverrideTable, SchoolYear, WeightResolver,
//!     aggregate_course, collect_months,
//! };
//!
//! let intake = collect_months(&records, SchoolYear(1403), offset);
//! let scale = AssessmentScale::standard();
//! let overrides = OverrideTable::new(&weights);
//! let resolver = WeightResolver::new(&scale, &overrides, teacher_id);
//! let course = aggregate_course(&intake, &resolver, meta);
//! ```

pub mod aggregate;
pub mod calendar;
pub mod intake;
pub mod ranking;
pub mod school_year;
pub mod scoring;

pub use aggregate::{
    CourseMeta, CourseYearRecord, MonthlyAggregate, ReportCard, WeightedCourse, aggregate_course,
    compose_report, weighted_average, year_average,
};
pub use calendar::{JalaliDate, to_jalali};
pub use intake::{
    AttendanceTally, DateParseError, MonthBucket, MonthlyIntake, collect_months, group_by_student,
    parse_lesson_date,
};
pub use ranking::{
    ClassRanking, ClassStats, CohortMember, CohortSheet, CohortStats, CourseRanking, RankEntry,
    RankTable, SheetCell, SheetRow, build_cohort_sheet, competition_rank, overall_progress,
    progress, rank_class,
};
pub use school_year::{AcademicMonth, SchoolYear};
pub use scoring::{
    AssessmentScale, MAX_SCORE, MonthScore, OverrideTable, WeightResolver, base_score, round2,
    score_month,
};
