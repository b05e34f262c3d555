//! Raw fact intake: sorting lesson records into month slots.
//!
//! Lesson dates are stored as the client sent them. A record whose date
//! cannot be read is skipped and counted; one bad record never aborts a
//! report.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use karnameh_models::{AssessmentEntry, AttendanceMark, GradeEntry, LessonRecord, StudentId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use utoipa::ToSchema;

use crate::{
    calendar::JalaliDate,
    school_year::{AcademicMonth, SchoolYear},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    #[error("lesson date is empty")]
    Empty,
    #[error("unrecognised lesson date '{0}'")]
    Unrecognised(String),
}

/// Reads a lesson date.
///
/// Accepts `YYYY-MM-DD`, a naive `YYYY-MM-DDTHH:MM:SS[.fff]` (also with a
/// space separator) and RFC 3339 timestamps. Timestamps carrying an offset
/// are moved to `school_offset` before the date is taken.
pub fn parse_lesson_date(raw: &str, school_offset: FixedOffset) -> Result<NaiveDate, DateParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DateParseError::Empty);
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&school_offset).date_naive());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt.date());
        }
    }

    Err(DateParseError::Unrecognised(raw.to_string()))
}

/// Attendance counts for one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceTally {
    pub present: u32,
    pub absent: u32,
    pub late: u32,
    /// Lessons with a present, absent or late mark
    pub total: u32,
}

impl AttendanceTally {
    pub fn record(&mut self, mark: Option<AttendanceMark>) {
        match mark {
            Some(AttendanceMark::Present) => self.present += 1,
            Some(AttendanceMark::Absent) => self.absent += 1,
            Some(AttendanceMark::Late) => self.late += 1,
            Some(AttendanceMark::Unmarked) | None => return,
        }
        self.total += 1;
    }

    pub fn merge(&mut self, other: AttendanceTally) {
        self.present += other.present;
        self.absent += other.absent;
        self.late += other.late;
        self.total += other.total;
    }
}

/// Raw entries collected for one month slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthBucket {
    pub grades: Vec<GradeEntry>,
    pub assessments: Vec<AssessmentEntry>,
    pub attendance: AttendanceTally,
}

impl MonthBucket {
    fn absorb(&mut self, record: &LessonRecord) {
        self.grades.extend(record.grades.iter().cloned());
        self.assessments.extend(record.assessments.iter().cloned());
        self.attendance.record(record.attendance);
    }
}

/// Twelve month buckets of one school year, plus the records that did not
/// make it in.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyIntake {
    pub school_year: SchoolYear,
    buckets: [MonthBucket; 12],
    /// Records whose date could not be parsed
    pub skipped: usize,
    /// Records dated outside the school year
    pub out_of_window: usize,
}

impl MonthlyIntake {
    pub fn new(school_year: SchoolYear) -> Self {
        Self {
            school_year,
            buckets: Default::default(),
            skipped: 0,
            out_of_window: 0,
        }
    }

    pub fn month(&self, month: AcademicMonth) -> &MonthBucket {
        &self.buckets[(month.number() - 1) as usize]
    }

    /// Buckets in academic order (Mehr first).
    pub fn iter(&self) -> impl Iterator<Item = (AcademicMonth, &MonthBucket)> {
        AcademicMonth::ACADEMIC_ORDER
            .into_iter()
            .map(|month| (month, self.month(month)))
    }

    /// Files one record into its month, or counts it as skipped.
    pub fn push(&mut self, record: &LessonRecord, school_offset: FixedOffset) {
        let date = match parse_lesson_date(&record.lesson_date, school_offset) {
            Ok(date) => date,
            Err(err) => {
                warn!(record_id = %record.id, error = %err, "Skipping lesson record with unreadable date");
                self.skipped += 1;
                return;
            }
        };

        match self.school_year.slot(JalaliDate::from_gregorian(date)) {
            Some(month) => self.buckets[(month.number() - 1) as usize].absorb(record),
            None => self.out_of_window += 1,
        }
    }
}

/// Sorts records into the months of `school_year`.
pub fn collect_months<'a, I>(records: I, school_year: SchoolYear, school_offset: FixedOffset) -> MonthlyIntake
where
    I: IntoIterator<Item = &'a LessonRecord>,
{
    let mut intake = MonthlyIntake::new(school_year);
    for record in records {
        intake.push(record, school_offset);
    }
    intake
}

/// Groups a class's records by student, keeping input order within a group.
pub fn group_by_student<'a, I>(records: I) -> BTreeMap<StudentId, Vec<&'a LessonRecord>>
where
    I: IntoIterator<Item = &'a LessonRecord>,
{
    let mut groups: BTreeMap<StudentId, Vec<&LessonRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.student_id).or_default().push(record);
    }
    groups
}
