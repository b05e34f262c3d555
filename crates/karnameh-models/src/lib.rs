//! # Karnameh Models
//!
//! Domain models and DTOs for the Karnameh API.
//!
//! # Modules
//!
//! - [`ids`]: Strongly typed entity ids
//! - [`lesson_records`]: Raw lesson facts (grades, assessments, attendance)
//! - [`assessment_weights`]: Assessment label weight overrides
//! - [`directory`]: Students, classes, courses and teachers for display
//!
//! # Example
//!
//! ```ignore
//! use karnameh_models::{GradeEntry, StudentId};
//!
//! let grade = GradeEntry::new(17.5, None);
//! assert_eq!(grade.points_possible(), 20.0);
//! ```

pub mod assessment_weights;
pub mod directory;
pub mod ids;
pub mod lesson_records;

pub use assessment_weights::{
    AssessmentWeightFilterParams, AssessmentWeightOverride, CreateAssessmentWeightDto,
    OverrideScope,
};
pub use directory::{ClassInfo, CourseInfo, StudentInfo, TeacherInfo, TeachingAssignment};
pub use ids::{
    AssessmentWeightId, ClassId, CourseId, LessonRecordId, SchoolId, StudentId, TeacherId,
};
pub use lesson_records::{
    AssessmentEntry, AttendanceMark, GradeEntry, LessonKey, LessonRecord,
    LessonRecordFilterParams, LessonRecordQuery, PaginatedLessonRecordsResponse,
    SaveLessonRecordDto,
};
