//! Record store port.
//!
//! Reports are computed from raw lesson records held by a record store. The
//! store never filters by lesson date: raw dates may be malformed, so the
//! school-year window is applied by the grading engine after fetching.
//!
//! Two adapters implement [`RecordStore`]:
//!
//! - [`PgRecordStore`]: PostgreSQL via SQLx
//! - [`MemoryRecordStore`]: in-process maps, used by tests (`test-utils`)

use async_trait::async_trait;
use axum::http::StatusCode;
use karnameh_core::AppError;
use karnameh_models::{
    AssessmentWeightId, AssessmentWeightOverride, ClassId, ClassInfo, CourseId, CourseInfo,
    CreateAssessmentWeightDto, LessonRecord, LessonRecordQuery, SaveLessonRecordDto, SchoolId,
    StudentId, StudentInfo, TeacherId, TeacherInfo, TeachingAssignment,
};
use thiserror::Error;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod postgres;

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored {column} is not valid: {message}")]
    Corrupt {
        column: &'static str,
        message: String,
    },

    /// A write referenced a school, class, student, teacher or course that
    /// does not exist.
    #[error("{0}")]
    InvalidReference(String),

    #[error("Record store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            StoreError::InvalidReference(_) => StatusCode::BAD_REQUEST,
            StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            StoreError::Database(_) | StoreError::Corrupt { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn into_app_error(self) -> AppError {
        AppError::new(self.status(), self)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Which overrides to read for a school.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideFilter<'a> {
    /// Every override of the school
    All,
    /// School-wide overrides plus those scoped to one of these teachers
    Teachers(&'a [TeacherId]),
}

#[async_trait]
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    async fn lesson_records(&self, query: &LessonRecordQuery) -> StoreResult<Vec<LessonRecord>>;

    /// One page of records, newest first, with the total match count.
    async fn lesson_records_page(
        &self,
        query: &LessonRecordQuery,
        limit: i64,
        offset: i64,
    ) -> StoreResult<(Vec<LessonRecord>, i64)>;

    /// Inserts or replaces the record for the lesson key of `dto`.
    async fn save_lesson_record(&self, dto: &SaveLessonRecordDto) -> StoreResult<LessonRecord>;

    async fn weight_overrides(
        &self,
        school_id: SchoolId,
        filter: OverrideFilter<'_>,
    ) -> StoreResult<Vec<AssessmentWeightOverride>>;

    /// Inserts or replaces the override for (school, teacher scope, label).
    async fn upsert_weight_override(
        &self,
        dto: &CreateAssessmentWeightDto,
    ) -> StoreResult<AssessmentWeightOverride>;

    async fn delete_weight_override(
        &self,
        id: AssessmentWeightId,
    ) -> StoreResult<Option<AssessmentWeightOverride>>;

    async fn student(&self, id: StudentId) -> StoreResult<Option<StudentInfo>>;

    async fn class(&self, id: ClassId) -> StoreResult<Option<ClassInfo>>;

    /// Students of a class ordered by last name, first name.
    async fn class_roster(&self, class_id: ClassId) -> StoreResult<Vec<StudentInfo>>;

    async fn class_assignments(&self, class_id: ClassId) -> StoreResult<Vec<TeachingAssignment>>;

    async fn courses(&self, ids: &[CourseId]) -> StoreResult<Vec<CourseInfo>>;

    async fn teachers(&self, ids: &[TeacherId]) -> StoreResult<Vec<TeacherInfo>>;
}
