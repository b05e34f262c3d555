//! Course year records and report cards.

use std::collections::BTreeMap;

use karnameh_models::{AssessmentEntry, CourseId, GradeEntry, StudentId, TeacherId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    intake::{AttendanceTally, MonthlyIntake},
    school_year::{AcademicMonth, SchoolYear},
    scoring::{WeightResolver, round2, score_month},
};

/// One month of one course for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyAggregate {
    pub month: AcademicMonth,
    pub month_name: String,
    pub grades: Vec<GradeEntry>,
    pub assessments: Vec<AssessmentEntry>,
    pub attendance: AttendanceTally,
    /// Grades normalized to 0..=20, before assessments
    pub average_grade: Option<f64>,
    pub adjustment: f64,
    pub final_score: Option<f64>,
}

/// Display data for a course on a report.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseMeta {
    pub course_id: CourseId,
    pub course_name: String,
    pub teacher_id: TeacherId,
    pub teacher_name: String,
    pub credit_units: f64,
}

/// A student's year in one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CourseYearRecord {
    pub course_id: CourseId,
    pub course_name: String,
    pub teacher_id: TeacherId,
    pub teacher_name: String,
    pub credit_units: f64,
    /// Keyed "1".."12" by Jalali month
    #[schema(value_type = Object)]
    pub months: BTreeMap<AcademicMonth, MonthlyAggregate>,
    pub year_average: Option<f64>,
    /// Records dropped for an unreadable date
    pub skipped_records: usize,
}

impl CourseYearRecord {
    /// Final scores by month, in academic order.
    pub fn monthly_scores(&self) -> impl Iterator<Item = (AcademicMonth, Option<f64>)> + '_ {
        AcademicMonth::ACADEMIC_ORDER
            .into_iter()
            .map(|month| (month, self.months.get(&month).and_then(|m| m.final_score)))
    }
}

/// Mean of the months that have a score. Empty months are not zeros.
pub fn year_average<I>(scores: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = scores
        .into_iter()
        .flatten()
        .fold((0.0, 0_u32), |(sum, count), score| (sum + score, count + 1));

    (count > 0).then(|| sum / f64::from(count))
}

/// Scores every month of an intake into a course year record.
pub fn aggregate_course(
    intake: &MonthlyIntake,
    resolver: &WeightResolver<'_>,
    meta: CourseMeta,
) -> CourseYearRecord {
    let months: BTreeMap<AcademicMonth, MonthlyAggregate> = intake
        .iter()
        .map(|(month, bucket)| {
            let score = score_month(&bucket.grades, &bucket.assessments, resolver);
            let aggregate = MonthlyAggregate {
                month,
                month_name: month.name().to_string(),
                grades: bucket.grades.clone(),
                assessments: bucket.assessments.clone(),
                attendance: bucket.attendance,
                average_grade: score.average_grade,
                adjustment: score.adjustment,
                final_score: score.final_score,
            };
            (month, aggregate)
        })
        .collect();

    let year_average = year_average(months.values().map(|m| m.final_score));

    CourseYearRecord {
        course_id: meta.course_id,
        course_name: meta.course_name,
        teacher_id: meta.teacher_id,
        teacher_name: meta.teacher_name,
        credit_units: meta.credit_units,
        months,
        year_average,
        skipped_records: intake.skipped,
    }
}

/// One course's share of the weighted average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeightedCourse {
    pub course_id: CourseId,
    pub course_name: String,
    /// Year average of the course
    pub grade: f64,
    pub credit_units: f64,
    /// `grade × credit_units`
    pub weighted_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReportCard {
    pub student_id: StudentId,
    pub student_name: String,
    pub school_year: SchoolYear,
    #[schema(value_type = Object)]
    pub courses: BTreeMap<CourseId, CourseYearRecord>,
    /// Credit-weighted mean of the course year averages, two decimals
    pub weighted_average: Option<f64>,
    pub total_credits: f64,
    pub breakdown: Vec<WeightedCourse>,
    /// Credit-weighted mean of each month's course scores, two decimals.
    /// Months without a score in any course are absent.
    #[schema(value_type = Object)]
    pub monthly_weighted_averages: BTreeMap<AcademicMonth, f64>,
    /// Records dropped across all courses for an unreadable date
    pub skipped_records: usize,
}

impl ReportCard {
    /// Unrounded credit-weighted mean of the course year averages.
    pub fn weighted_score(&self) -> Option<f64> {
        credit_weighted(&self.courses, |course| course.year_average)
    }

    /// Unrounded credit-weighted mean of the course scores of one month.
    pub fn month_weighted_score(&self, month: AcademicMonth) -> Option<f64> {
        credit_weighted(&self.courses, |course| {
            course.months.get(&month).and_then(|m| m.final_score)
        })
    }
}

fn credit_weighted<F>(courses: &BTreeMap<CourseId, CourseYearRecord>, score: F) -> Option<f64>
where
    F: Fn(&CourseYearRecord) -> Option<f64>,
{
    weighted_average(
        courses
            .values()
            .filter_map(|course| score(course).map(|s| (s, course.credit_units))),
    )
}

/// `Σ(grade × credits) / Σcredits` over the given pairs.
///
/// `None` when there are no pairs or the credits add up to zero.
pub fn weighted_average<I>(pairs: I) -> Option<f64>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (weighted, credits) = pairs
        .into_iter()
        .fold((0.0, 0.0), |(weighted, credits), (grade, units)| {
            (weighted + grade * units, credits + units)
        });

    (credits > 0.0).then(|| weighted / credits)
}

/// Builds a report card from a student's course records.
pub fn compose_report(
    student_id: StudentId,
    student_name: String,
    school_year: SchoolYear,
    courses: Vec<CourseYearRecord>,
) -> ReportCard {
    let breakdown: Vec<WeightedCourse> = courses
        .iter()
        .filter_map(|course| {
            let grade = course.year_average?;
            Some(WeightedCourse {
                course_id: course.course_id,
                course_name: course.course_name.clone(),
                grade: round2(grade),
                credit_units: course.credit_units,
                weighted_value: round2(grade * course.credit_units),
            })
        })
        .collect();

    let total_credits = breakdown.iter().map(|c| c.credit_units).sum();
    let skipped_records = courses.iter().map(|c| c.skipped_records).sum();

    let mut report = ReportCard {
        student_id,
        student_name,
        school_year,
        courses: courses.into_iter().map(|c| (c.course_id, c)).collect(),
        weighted_average: None,
        total_credits,
        breakdown,
        monthly_weighted_averages: BTreeMap::new(),
        skipped_records,
    };

    report.weighted_average = report.weighted_score().map(round2);
    report.monthly_weighted_averages = AcademicMonth::ACADEMIC_ORDER
        .into_iter()
        .filter_map(|month| Some((month, round2(report.month_weighted_score(month)?))))
        .collect();

    report
}
