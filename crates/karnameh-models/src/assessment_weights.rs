//! Per-school overrides for how much a qualitative assessment label moves a
//! monthly score.

use chrono::{DateTime, Utc};
use karnameh_core::serde::empty_string_as_none;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{AssessmentWeightId, SchoolId, TeacherId};

/// Who an override applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverrideScope {
    Global,
    Teacher(TeacherId),
}

/// A stored override mapping a label to a score adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AssessmentWeightOverride {
    pub id: AssessmentWeightId,
    pub school_id: SchoolId,
    /// Absent for school-wide overrides
    pub teacher_id: Option<TeacherId>,
    pub label: String,
    pub weight: f64,
    pub created_at: DateTime<Utc>,
}

impl AssessmentWeightOverride {
    pub fn scope(&self) -> OverrideScope {
        match self.teacher_id {
            Some(teacher_id) => OverrideScope::Teacher(teacher_id),
            None => OverrideScope::Global,
        }
    }
}

/// Request body for creating or replacing an override.
///
/// An existing override with the same school, teacher scope and label is
/// replaced.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateAssessmentWeightDto {
    pub school_id: SchoolId,
    #[serde(default)]
    pub teacher_id: Option<TeacherId>,
    #[validate(length(min = 1, max = 100))]
    pub label: String,
    #[validate(range(min = -20.0, max = 20.0))]
    pub weight: f64,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct AssessmentWeightFilterParams {
    pub school_id: SchoolId,
    /// Restrict to overrides of one teacher (school-wide ones are always included)
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[param(value_type = Option<String>)]
    pub teacher_id: Option<TeacherId>,
}
