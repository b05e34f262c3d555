//! Report cards computed from an exported JSON file instead of the database.
//!
//! The export is either a bare array of lesson records or an object with the
//! records plus optional directory data and overrides:
//!
//! ```json
//! {
//!   "records": [ ... ],
//!   "students": [ ... ],
//!   "courses": [ ... ],
//!   "teachers": [ ... ],
//!   "overrides": [ ... ]
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use chrono::FixedOffset;
use karnameh_grading::{
    AcademicMonth, AssessmentScale, CourseMeta, OverrideTable, ReportCard, SchoolYear,
    WeightResolver, aggregate_course, collect_months, compose_report, group_by_student,
};
use karnameh_models::{
    AssessmentWeightOverride, CourseId, CourseInfo, LessonRecord, StudentId, StudentInfo,
    TeacherId, TeacherInfo, directory::DEFAULT_CREDIT_UNITS,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct LessonExport {
    pub records: Vec<LessonRecord>,
    #[serde(default)]
    pub students: Vec<StudentInfo>,
    #[serde(default)]
    pub courses: Vec<CourseInfo>,
    #[serde(default)]
    pub teachers: Vec<TeacherInfo>,
    #[serde(default)]
    pub overrides: Vec<AssessmentWeightOverride>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExportFile {
    Records(Vec<LessonRecord>),
    Full(LessonExport),
}

impl LessonExport {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        Ok(match serde_json::from_str::<ExportFile>(raw)? {
            ExportFile::Records(records) => Self {
                records,
                ..Self::default()
            },
            ExportFile::Full(export) => export,
        })
    }

    /// One report card per student found in the records, ordered by student id.
    pub fn report_cards(&self, school_year: SchoolYear, school_offset: FixedOffset) -> Vec<ReportCard> {
        let scale = AssessmentScale::standard();
        let overrides = OverrideTable::new(&self.overrides);

        let students: HashMap<StudentId, &StudentInfo> =
            self.students.iter().map(|s| (s.id, s)).collect();
        let courses: HashMap<CourseId, &CourseInfo> =
            self.courses.iter().map(|c| (c.id, c)).collect();
        let teachers: HashMap<TeacherId, &TeacherInfo> =
            self.teachers.iter().map(|t| (t.id, t)).collect();

        group_by_student(&self.records)
            .into_iter()
            .map(|(student_id, records)| {
                let mut by_course: BTreeMap<(CourseId, TeacherId), Vec<&LessonRecord>> =
                    BTreeMap::new();
                for record in records {
                    by_course
                        .entry((record.course_id, record.teacher_id))
                        .or_default()
                        .push(record);
                }

                let course_records = by_course
                    .into_iter()
                    .map(|((course_id, teacher_id), records)| {
                        let course = courses.get(&course_id);
                        let meta = CourseMeta {
                            course_id,
                            course_name: course
                                .map(|c| c.name.clone())
                                .unwrap_or_else(|| course_id.to_string()),
                            teacher_id,
                            teacher_name: teachers
                                .get(&teacher_id)
                                .map(|t| t.full_name())
                                .unwrap_or_else(|| teacher_id.to_string()),
                            credit_units: course.map_or(DEFAULT_CREDIT_UNITS, |c| c.credits()),
                        };

                        let intake = collect_months(records, school_year, school_offset);
                        let resolver = WeightResolver::new(&scale, &overrides, teacher_id);
                        aggregate_course(&intake, &resolver, meta)
                    })
                    .collect();

                let name = students
                    .get(&student_id)
                    .map(|s| s.full_name())
                    .unwrap_or_else(|| student_id.to_string());

                compose_report(student_id, name, school_year, course_records)
            })
            .collect()
    }
}

fn cell(score: Option<f64>) -> String {
    score.map_or_else(|| "-".to_string(), |s| format!("{:.2}", s))
}

/// Plain-text table of a report card, one row per course.
pub fn render_table(report: &ReportCard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", report.student_name, report.student_id);
    let _ = writeln!(out, "School year {}", report.school_year);
    let _ = writeln!(out);

    let _ = write!(out, "{:<24} {:>5}", "Course", "Units");
    for month in AcademicMonth::ACADEMIC_ORDER {
        let _ = write!(out, " {:>6}", month.number());
    }
    let _ = writeln!(out, " {:>7}", "Avg");

    for course in report.courses.values() {
        let _ = write!(
            out,
            "{:<24} {:>5.1}",
            truncate(&course.course_name, 24),
            course.credit_units
        );
        for (_, score) in course.monthly_scores() {
            let _ = write!(out, " {:>6}", cell(score));
        }
        let _ = writeln!(out, " {:>7}", cell(course.year_average));
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Weighted average: {} over {} units",
        cell(report.weighted_average),
        report.total_credits
    );
    if report.skipped_records > 0 {
        let _ = writeln!(out, "Skipped records: {}", report.skipped_records);
    }

    out
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        value.chars().take(width - 1).chain(std::iter::once('…')).collect()
    }
}
