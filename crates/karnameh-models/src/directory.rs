//! School directory entries used for display names and course credits.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::ids::{ClassId, CourseId, SchoolId, StudentId, TeacherId};

/// Credit units a course carries when none are recorded.
pub const DEFAULT_CREDIT_UNITS: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StudentInfo {
    pub id: StudentId,
    pub school_id: SchoolId,
    pub class_id: ClassId,
    /// School-issued student number
    pub student_code: String,
    pub first_name: String,
    pub last_name: String,
}

impl StudentInfo {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ClassInfo {
    pub id: ClassId,
    pub school_id: SchoolId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CourseInfo {
    pub id: CourseId,
    pub school_id: SchoolId,
    pub name: String,
    /// Credit units (vahed); `None` counts as 1
    pub credit_units: Option<f64>,
}

impl CourseInfo {
    pub fn credits(&self) -> f64 {
        self.credit_units.unwrap_or(DEFAULT_CREDIT_UNITS)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TeacherInfo {
    pub id: TeacherId,
    pub school_id: SchoolId,
    pub first_name: String,
    pub last_name: String,
}

impl TeacherInfo {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }
}

/// A teacher teaching a course to a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TeachingAssignment {
    pub class_id: ClassId,
    pub course_id: CourseId,
    pub teacher_id: TeacherId,
}

fn join_name(first: &str, last: &str) -> String {
    format!("{} {}", first.trim(), last.trim()).trim().to_string()
}
