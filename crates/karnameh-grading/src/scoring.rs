//! Monthly score normalization and assessment adjustment.
//!
//! A month's grades are normalized onto the 0..=20 scale as
//! `Σvalue / Σtotal_points × 20`, so a 5 point quiz weighs a quarter of a 20
//! point exam. Qualitative assessments then add or subtract points and the
//! result is clamped to `[0, 20]`. A month without grades has no score,
//! whatever its assessments say.

use std::collections::HashMap;

use karnameh_models::{AssessmentEntry, AssessmentWeightOverride, GradeEntry, OverrideScope, TeacherId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Top of the grading scale.
pub const MAX_SCORE: f64 = 20.0;

/// Canonical form of an assessment label used for lookups.
///
/// Case, surrounding space and the separator between words (space,
/// underscore, hyphen or zero-width non-joiner) do not matter, so
/// "Very Weak", "very_weak" and "very-weak" are the same label.
pub fn normalize_label(label: &str) -> String {
    label
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-' || c == '\u{200c}')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// The default label to adjustment map.
///
/// Immutable once built; per-school customisation goes through
/// [`OverrideTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentScale {
    weights: HashMap<String, f64>,
}

impl AssessmentScale {
    /// excellent +2, good +1, average 0, weak -1, very weak -2, under both
    /// their English and Persian names.
    pub fn standard() -> Self {
        Self::from_pairs([
            ("excellent", 2.0),
            ("good", 1.0),
            ("average", 0.0),
            ("weak", -1.0),
            ("very-weak", -2.0),
            ("عالی", 2.0),
            ("خوب", 1.0),
            ("متوسط", 0.0),
            ("ضعیف", -1.0),
            ("بسیار ضعیف", -2.0),
        ])
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let weights = pairs
            .into_iter()
            .map(|(label, weight)| (normalize_label(label.as_ref()), weight))
            .collect();
        Self { weights }
    }

    /// A copy of this scale with one more (or a replaced) label.
    pub fn with_label(&self, label: &str, weight: f64) -> Self {
        let mut weights = self.weights.clone();
        weights.insert(normalize_label(label), weight);
        Self { weights }
    }

    pub fn weight(&self, label: &str) -> Option<f64> {
        self.weights.get(&normalize_label(label)).copied()
    }
}

impl Default for AssessmentScale {
    fn default() -> Self {
        Self::standard()
    }
}

/// Override weights of a school, indexed for lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideTable {
    global: HashMap<String, f64>,
    by_teacher: HashMap<(TeacherId, String), f64>,
}

impl OverrideTable {
    pub fn new<'a, I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = &'a AssessmentWeightOverride>,
    {
        let mut table = Self::default();
        for entry in overrides {
            table.insert(entry.scope(), &entry.label, entry.weight);
        }
        table
    }

    pub fn insert(&mut self, scope: OverrideScope, label: &str, weight: f64) {
        let label = normalize_label(label);
        match scope {
            OverrideScope::Global => {
                self.global.insert(label, weight);
            }
            OverrideScope::Teacher(teacher_id) => {
                self.by_teacher.insert((teacher_id, label), weight);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.by_teacher.is_empty()
    }

    /// Teacher-scoped weight first, then the school-wide one.
    pub fn weight(&self, teacher_id: TeacherId, label: &str) -> Option<f64> {
        let label = normalize_label(label);
        self.by_teacher
            .get(&(teacher_id, label.clone()))
            .or_else(|| self.global.get(&label))
            .copied()
    }
}

/// Resolves assessment adjustments for one teacher's lessons.
#[derive(Debug, Clone, Copy)]
pub struct WeightResolver<'a> {
    scale: &'a AssessmentScale,
    overrides: &'a OverrideTable,
    teacher_id: TeacherId,
}

impl<'a> WeightResolver<'a> {
    pub fn new(scale: &'a AssessmentScale, overrides: &'a OverrideTable, teacher_id: TeacherId) -> Self {
        Self {
            scale,
            overrides,
            teacher_id,
        }
    }

    /// The adjustment an assessment contributes.
    ///
    /// An explicit entry weight wins, then the override tables, then the
    /// default scale. Unknown labels and non-finite weights count as 0.
    pub fn adjustment(&self, entry: &AssessmentEntry) -> f64 {
        let weight = entry
            .weight
            .or_else(|| self.overrides.weight(self.teacher_id, &entry.value))
            .or_else(|| self.scale.weight(&entry.value))
            .unwrap_or(0.0);

        if weight.is_finite() { weight } else { 0.0 }
    }

    pub fn total_adjustment(&self, entries: &[AssessmentEntry]) -> f64 {
        entries.iter().map(|entry| self.adjustment(entry)).sum()
    }
}

/// Normalizes grades onto the 0..=20 scale.
///
/// `None` when there are no grades. Entries with a non-finite value or
/// total are ignored. A non-positive point total gives 0.
pub fn base_score(grades: &[GradeEntry]) -> Option<f64> {
    if grades.is_empty() {
        return None;
    }

    let (earned, possible) = grades
        .iter()
        .filter(|g| g.value.is_finite() && g.points_possible().is_finite())
        .fold((0.0, 0.0), |(earned, possible), g| {
            (earned + g.value, possible + g.points_possible())
        });

    if possible <= 0.0 {
        return Some(0.0);
    }
    Some(earned / possible * MAX_SCORE)
}

/// Clamps a score into `[0, 20]`. NaN becomes 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, MAX_SCORE)
    }
}

/// A scored month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonthScore {
    /// Normalized grade before adjustment
    pub average_grade: Option<f64>,
    /// Sum of assessment adjustments
    pub adjustment: f64,
    pub final_score: Option<f64>,
}

pub fn score_month(
    grades: &[GradeEntry],
    assessments: &[AssessmentEntry],
    resolver: &WeightResolver<'_>,
) -> MonthScore {
    let adjustment = resolver.total_adjustment(assessments);
    let average_grade = base_score(grades);
    let final_score = average_grade.map(|base| clamp_score(base + adjustment));

    MonthScore {
        average_grade,
        adjustment,
        final_score,
    }
}

/// Rounds to two decimals for presentation.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
