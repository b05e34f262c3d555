//! Lesson records: the raw facts every report is computed from.
//!
//! One record exists per (school, class, student, teacher, course, lesson
//! date, time slot). Saving a record for an existing key replaces its grade
//! and assessment lists.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use karnameh_core::{PaginationMeta, PaginationParams, serde::empty_string_as_none};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::ids::{ClassId, CourseId, LessonRecordId, SchoolId, StudentId, TeacherId};

/// Points a grade is out of when the teacher did not say.
pub const DEFAULT_TOTAL_POINTS: f64 = 20.0;

/// A numeric grade given during a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_grade_within_total"))]
#[serde(rename_all = "camelCase")]
pub struct GradeEntry {
    #[validate(range(min = 0.0))]
    pub value: f64,
    /// Defaults to 20 when absent
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0))]
    pub total_points: Option<f64>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub description: String,
    #[serde(default)]
    pub date: String,
}

impl GradeEntry {
    pub fn new(value: f64, total_points: Option<f64>) -> Self {
        Self {
            value,
            total_points,
            description: String::new(),
            date: String::new(),
        }
    }

    /// The denominator this grade is out of.
    pub fn points_possible(&self) -> f64 {
        self.total_points.unwrap_or(DEFAULT_TOTAL_POINTS)
    }
}

fn validate_grade_within_total(grade: &GradeEntry) -> Result<(), ValidationError> {
    if grade.value > grade.points_possible() {
        let mut err = ValidationError::new("grade_exceeds_total");
        err.message = Some("grade value cannot exceed total points".into());
        return Err(err);
    }
    Ok(())
}

/// A qualitative assessment ("excellent", "خوب", ...) given during a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct AssessmentEntry {
    #[serde(default)]
    #[validate(length(max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 100))]
    pub value: String,
    #[serde(default)]
    pub date: String,
    /// Explicit adjustment for this entry; takes precedence over any table
    #[serde(default)]
    pub weight: Option<f64>,
}

impl AssessmentEntry {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            value: value.into(),
            date: String::new(),
            weight: None,
        }
    }
}

/// Attendance recorded for a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceMark {
    Present,
    Absent,
    Late,
    /// Attendance was explicitly left blank; not counted
    #[serde(rename = "none")]
    Unmarked,
}

impl AttendanceMark {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
            Self::Unmarked => "none",
        }
    }
}

impl fmt::Display for AttendanceMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAttendanceMark(pub String);

impl fmt::Display for UnknownAttendanceMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown attendance mark '{}'", self.0)
    }
}

impl std::error::Error for UnknownAttendanceMark {}

impl FromStr for AttendanceMark {
    type Err = UnknownAttendanceMark;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            "late" => Ok(Self::Late),
            "none" | "" => Ok(Self::Unmarked),
            other => Err(UnknownAttendanceMark(other.to_string())),
        }
    }
}

/// A stored lesson record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LessonRecord {
    pub id: LessonRecordId,
    pub school_id: SchoolId,
    pub class_id: ClassId,
    pub student_id: StudentId,
    pub teacher_id: TeacherId,
    pub course_id: CourseId,
    /// Lesson date as written by the client; may be malformed
    pub lesson_date: String,
    pub time_slot: String,
    #[serde(default)]
    pub grades: Vec<GradeEntry>,
    #[serde(default)]
    pub assessments: Vec<AssessmentEntry>,
    #[serde(default)]
    pub attendance: Option<AttendanceMark>,
    #[serde(default)]
    pub note: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl LessonRecord {
    /// The identity of the lesson this record belongs to.
    pub fn key(&self) -> LessonKey<'_> {
        LessonKey {
            school_id: self.school_id,
            class_id: self.class_id,
            student_id: self.student_id,
            teacher_id: self.teacher_id,
            course_id: self.course_id,
            lesson_date: &self.lesson_date,
            time_slot: &self.time_slot,
        }
    }
}

/// Natural key of a lesson record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LessonKey<'a> {
    pub school_id: SchoolId,
    pub class_id: ClassId,
    pub student_id: StudentId,
    pub teacher_id: TeacherId,
    pub course_id: CourseId,
    pub lesson_date: &'a str,
    pub time_slot: &'a str,
}

/// Request body for recording a lesson.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct SaveLessonRecordDto {
    pub school_id: SchoolId,
    pub class_id: ClassId,
    pub student_id: StudentId,
    pub teacher_id: TeacherId,
    pub course_id: CourseId,
    #[validate(length(min = 1, max = 64))]
    pub lesson_date: String,
    #[validate(length(min = 1, max = 32))]
    pub time_slot: String,
    #[serde(default)]
    #[validate(nested)]
    pub grades: Vec<GradeEntry>,
    #[serde(default)]
    #[validate(nested)]
    pub assessments: Vec<AssessmentEntry>,
    #[serde(default)]
    pub attendance: Option<AttendanceMark>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

impl SaveLessonRecordDto {
    pub fn key(&self) -> LessonKey<'_> {
        LessonKey {
            school_id: self.school_id,
            class_id: self.class_id,
            student_id: self.student_id,
            teacher_id: self.teacher_id,
            course_id: self.course_id,
            lesson_date: &self.lesson_date,
            time_slot: &self.time_slot,
        }
    }
}

/// Which lesson records to read. `school_id` is always required.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LessonRecordQuery {
    pub school_id: SchoolId,
    pub class_id: Option<ClassId>,
    pub student_id: Option<StudentId>,
    pub teacher_id: Option<TeacherId>,
    pub course_id: Option<CourseId>,
}

impl LessonRecordQuery {
    pub fn school(school_id: SchoolId) -> Self {
        Self {
            school_id,
            class_id: None,
            student_id: None,
            teacher_id: None,
            course_id: None,
        }
    }

    pub fn matches(&self, record: &LessonRecord) -> bool {
        record.school_id == self.school_id
            && self.class_id.is_none_or(|id| id == record.class_id)
            && self.student_id.is_none_or(|id| id == record.student_id)
            && self.teacher_id.is_none_or(|id| id == record.teacher_id)
            && self.course_id.is_none_or(|id| id == record.course_id)
    }
}

/// Query parameters for listing lesson records.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct LessonRecordFilterParams {
    pub school_id: SchoolId,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[param(value_type = Option<String>)]
    pub class_id: Option<ClassId>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[param(value_type = Option<String>)]
    pub student_id: Option<StudentId>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[param(value_type = Option<String>)]
    pub teacher_id: Option<TeacherId>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[param(value_type = Option<String>)]
    pub course_id: Option<CourseId>,
    /// Maximum number of items to return (1-200, default: 20)
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub limit: Option<i64>,
    /// Page number (1-indexed, default: 1)
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<i64>,
}

impl LessonRecordFilterParams {
    pub fn query(&self) -> LessonRecordQuery {
        LessonRecordQuery {
            school_id: self.school_id,
            class_id: self.class_id,
            student_id: self.student_id,
            teacher_id: self.teacher_id,
            course_id: self.course_id,
        }
    }

    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            limit: self.limit,
            page: self.page,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedLessonRecordsResponse {
    pub data: Vec<LessonRecord>,
    pub meta: PaginationMeta,
}
