//! Report orchestration.
//!
//! Directory data and assessment overrides are read once per report. Lesson
//! records are then fetched per (teacher, course) pair concurrently and fed
//! to the grading engine. Nothing here fails a report for a partial outage:
//! a course whose records cannot be read is left out, unreadable overrides
//! fall back to the default scale and missing names fall back to raw ids.

use std::collections::{BTreeSet, HashMap};

use anyhow::anyhow;
use chrono::FixedOffset;
use futures::future::join_all;
use karnameh_cache::{RedisCache, keys};
use karnameh_core::AppError;
use karnameh_grading::{
    AcademicMonth, AssessmentScale, ClassRanking, CohortMember, CohortSheet, CourseMeta, CourseYearRecord,
    OverrideTable, ReportCard, SchoolYear, WeightResolver, aggregate_course, build_cohort_sheet,
    collect_months, compose_report, rank_class,
};
use karnameh_models::{
    ClassId, CourseId, CourseInfo, LessonRecord, LessonRecordQuery, SchoolId, StudentId,
    StudentInfo, TeacherId, TeacherInfo, TeachingAssignment, directory::DEFAULT_CREDIT_UNITS,
};
use tracing::{debug, info, instrument, warn};

use crate::metrics;
use crate::state::AppState;
use crate::store::{OverrideFilter, RecordStore};

/// What a report computation needs from the application.
#[derive(Clone, Copy)]
pub struct ReportContext<'a> {
    pub store: &'a dyn RecordStore,
    pub cache: Option<&'a RedisCache>,
    pub scale: &'a AssessmentScale,
    pub school_offset: FixedOffset,
}

impl<'a> ReportContext<'a> {
    pub fn from_state(state: &'a AppState) -> Self {
        Self {
            store: state.store.as_ref(),
            cache: state.cache(),
            scale: state.scale.as_ref(),
            school_offset: state.grading_config.offset(),
        }
    }
}

/// Display names and credits of the courses and teachers in a report.
#[derive(Debug, Default)]
struct Directory {
    courses: HashMap<CourseId, CourseInfo>,
    teachers: HashMap<TeacherId, TeacherInfo>,
}

impl Directory {
    fn meta(&self, course_id: CourseId, teacher_id: TeacherId) -> CourseMeta {
        let course = self.courses.get(&course_id);
        CourseMeta {
            course_id,
            course_name: course
                .map(|c| c.name.clone())
                .unwrap_or_else(|| course_id.to_string()),
            teacher_id,
            teacher_name: self
                .teachers
                .get(&teacher_id)
                .map(|t| t.full_name())
                .unwrap_or_else(|| teacher_id.to_string()),
            credit_units: course.map_or(DEFAULT_CREDIT_UNITS, |c| c.credits()),
        }
    }
}

fn distinct_teachers(assignments: &[TeachingAssignment]) -> Vec<TeacherId> {
    assignments
        .iter()
        .map(|a| a.teacher_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

async fn load_directory(store: &dyn RecordStore, assignments: &[TeachingAssignment]) -> Directory {
    let course_ids: Vec<CourseId> = assignments
        .iter()
        .map(|a| a.course_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let teacher_ids = distinct_teachers(assignments);

    let (courses, teachers) =
        futures::join!(store.courses(&course_ids), store.teachers(&teacher_ids));

    let courses = courses.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load courses, using raw ids");
        Vec::new()
    });
    let teachers = teachers.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load teachers, using raw ids");
        Vec::new()
    });

    Directory {
        courses: courses.into_iter().map(|c| (c.id, c)).collect(),
        teachers: teachers.into_iter().map(|t| (t.id, t)).collect(),
    }
}

/// Overrides for `teacher_ids` plus the school-wide ones. An unreadable
/// table leaves only the default scale in effect.
async fn load_overrides(
    store: &dyn RecordStore,
    school_id: SchoolId,
    teacher_ids: &[TeacherId],
) -> OverrideTable {
    match store
        .weight_overrides(school_id, OverrideFilter::Teachers(teacher_ids))
        .await
    {
        Ok(overrides) => OverrideTable::new(&overrides),
        Err(e) => {
            warn!(error = %e, school_id = %school_id, "Failed to load assessment overrides, using defaults");
            metrics::track_override_fallback();
            OverrideTable::default()
        }
    }
}

fn compute_course_record<'r, I>(
    ctx: &ReportContext<'_>,
    overrides: &OverrideTable,
    meta: CourseMeta,
    records: I,
    school_year: SchoolYear,
) -> CourseYearRecord
where
    I: IntoIterator<Item = &'r LessonRecord>,
{
    let intake = collect_months(records, school_year, ctx.school_offset);
    if intake.skipped > 0 {
        debug!(course_id = %meta.course_id, skipped = intake.skipped, "Skipped lesson records with unreadable dates");
        metrics::track_lesson_records_skipped(intake.skipped);
    }

    let resolver = WeightResolver::new(ctx.scale, overrides, meta.teacher_id);
    aggregate_course(&intake, &resolver, meta)
}

/// One student's year in one course, read through the cache.
///
/// `None` when the lesson records cannot be fetched.
async fn student_course_record(
    ctx: &ReportContext<'_>,
    overrides: &OverrideTable,
    school_id: SchoolId,
    student_id: StudentId,
    meta: CourseMeta,
    school_year: SchoolYear,
) -> Option<CourseYearRecord> {
    let cache_key = ctx
        .cache
        .map(|cache| keys::course_record(cache.prefix(), student_id, meta.course_id, school_year.0));

    if let (Some(cache), Some(key)) = (ctx.cache, cache_key.as_deref()) {
        let cached = cache.get::<CourseYearRecord>(key).await;
        metrics::track_report_cache_lookup(cached.is_some());
        if let Some(record) = cached {
            debug!(course_id = %meta.course_id, "Course record found in cache");
            return Some(record);
        }
    }

    let query = LessonRecordQuery {
        student_id: Some(student_id),
        teacher_id: Some(meta.teacher_id),
        course_id: Some(meta.course_id),
        ..LessonRecordQuery::school(school_id)
    };

    let records = match ctx.store.lesson_records(&query).await {
        Ok(records) => records,
        Err(e) => {
            warn!(
                error = %e,
                student_id = %student_id,
                course_id = %meta.course_id,
                "Failed to fetch lesson records, leaving course out of the report"
            );
            return None;
        }
    };

    let record = compute_course_record(ctx, overrides, meta, &records, school_year);

    if let (Some(cache), Some(key)) = (ctx.cache, cache_key.as_deref())
        && let Err(e) = cache.set(key, &record).await
    {
        warn!(error = %e, "Failed to cache course record");
    }

    Some(record)
}

fn roster_names(roster: &[StudentInfo]) -> impl Iterator<Item = (StudentId, String)> + '_ {
    roster.iter().map(|s| (s.id, s.full_name()))
}

pub struct ReportService;

impl ReportService {
    /// The report card of a student over the courses taught to their class,
    /// optionally only those of one teacher.
    #[instrument(skip(ctx), fields(student_id = %student_id, school_year = %school_year))]
    pub async fn report_card(
        ctx: &ReportContext<'_>,
        student_id: StudentId,
        school_year: SchoolYear,
        teacher_id: Option<TeacherId>,
    ) -> Result<ReportCard, AppError> {
        let student = ctx
            .store
            .student(student_id)
            .await
            .map_err(|e| e.into_app_error())?
            .ok_or_else(|| AppError::not_found(anyhow!("Student not found")))?;

        let assignments: Vec<TeachingAssignment> = ctx
            .store
            .class_assignments(student.class_id)
            .await
            .map_err(|e| e.into_app_error())?
            .into_iter()
            .filter(|a| teacher_id.is_none_or(|t| a.teacher_id == t))
            .collect();

        let teacher_ids = distinct_teachers(&assignments);
        let (directory, overrides) = futures::join!(
            load_directory(ctx.store, &assignments),
            load_overrides(ctx.store, student.school_id, &teacher_ids)
        );

        let fetches = assignments.iter().map(|a| {
            student_course_record(
                ctx,
                &overrides,
                student.school_id,
                student_id,
                directory.meta(a.course_id, a.teacher_id),
                school_year,
            )
        });
        let courses: Vec<CourseYearRecord> = join_all(fetches).await.into_iter().flatten().collect();

        let report = compose_report(student_id, student.full_name(), school_year, courses);
        metrics::track_report_computed("report_card");

        info!(
            courses = report.courses.len(),
            weighted_average = ?report.weighted_average,
            skipped = report.skipped_records,
            "Report card computed"
        );

        Ok(report)
    }

    /// Monthly grades of every student of a class in one course, with
    /// ranks and progress.
    #[instrument(skip(ctx), fields(class_id = %class_id, course_id = %course_id, school_year = %school_year))]
    pub async fn cohort_sheet(
        ctx: &ReportContext<'_>,
        class_id: ClassId,
        course_id: CourseId,
        school_year: SchoolYear,
        teacher_id: Option<TeacherId>,
    ) -> Result<CohortSheet, AppError> {
        let class = ctx
            .store
            .class(class_id)
            .await
            .map_err(|e| e.into_app_error())?
            .ok_or_else(|| AppError::not_found(anyhow!("Class not found")))?;

        let assigned = ctx
            .store
            .class_assignments(class_id)
            .await
            .map_err(|e| e.into_app_error())?
            .into_iter()
            .find(|a| a.course_id == course_id);

        let Some(teacher_id) = teacher_id.or(assigned.map(|a| a.teacher_id)) else {
            return Err(AppError::not_found(anyhow!(
                "Course is not taught in this class"
            )));
        };

        let assignment = TeachingAssignment {
            class_id,
            course_id,
            teacher_id,
        };
        let (directory, overrides, roster) = futures::join!(
            load_directory(ctx.store, std::slice::from_ref(&assignment)),
            load_overrides(ctx.store, class.school_id, &[teacher_id]),
            ctx.store.class_roster(class_id)
        );
        let roster = roster.map_err(|e| e.into_app_error())?;

        let query = LessonRecordQuery {
            class_id: Some(class_id),
            teacher_id: Some(teacher_id),
            course_id: Some(course_id),
            ..LessonRecordQuery::school(class.school_id)
        };
        let records = ctx
            .store
            .lesson_records(&query)
            .await
            .map_err(|e| e.into_app_error())?;
        let mut by_student = karnameh_grading::group_by_student(&records);

        let meta = directory.meta(course_id, teacher_id);
        let course_name = meta.course_name.clone();
        let members = roster_names(&roster)
            .map(|(student_id, student_name)| {
                let records = by_student.remove(&student_id).unwrap_or_default();
                CohortMember {
                    student_id,
                    student_name,
                    record: compute_course_record(
                        ctx,
                        &overrides,
                        meta.clone(),
                        records,
                        school_year,
                    ),
                }
            })
            .collect();

        let sheet = build_cohort_sheet(school_year, course_id, course_name, members);
        metrics::track_report_computed("cohort_sheet");

        info!(
            students = sheet.stats.total_students,
            ranked = sheet.stats.ranked_students,
            "Cohort sheet computed"
        );

        Ok(sheet)
    }

    /// Overall and per-course rankings of a class, for the whole year or
    /// for one month.
    #[instrument(skip(ctx), fields(class_id = %class_id, school_year = %school_year, month = ?month))]
    pub async fn class_rankings(
        ctx: &ReportContext<'_>,
        class_id: ClassId,
        school_year: SchoolYear,
        month: Option<AcademicMonth>,
    ) -> Result<ClassRanking, AppError> {
        let class = ctx
            .store
            .class(class_id)
            .await
            .map_err(|e| e.into_app_error())?
            .ok_or_else(|| AppError::not_found(anyhow!("Class not found")))?;

        let (roster, assignments) = futures::join!(
            ctx.store.class_roster(class_id),
            ctx.store.class_assignments(class_id)
        );
        let roster = roster.map_err(|e| e.into_app_error())?;
        let assignments = assignments.map_err(|e| e.into_app_error())?;

        let teacher_ids = distinct_teachers(&assignments);
        let (directory, overrides) = futures::join!(
            load_directory(ctx.store, &assignments),
            load_overrides(ctx.store, class.school_id, &teacher_ids)
        );

        let query = LessonRecordQuery {
            class_id: Some(class_id),
            ..LessonRecordQuery::school(class.school_id)
        };
        let records = ctx
            .store
            .lesson_records(&query)
            .await
            .map_err(|e| e.into_app_error())?;

        let mut by_lesson: HashMap<(StudentId, CourseId, TeacherId), Vec<&LessonRecord>> =
            HashMap::new();
        for record in &records {
            by_lesson
                .entry((record.student_id, record.course_id, record.teacher_id))
                .or_default()
                .push(record);
        }

        let reports: Vec<ReportCard> = roster_names(&roster)
            .map(|(student_id, student_name)| {
                let courses = assignments
                    .iter()
                    .map(|a| {
                        let records = by_lesson
                            .get(&(student_id, a.course_id, a.teacher_id))
                            .map(Vec::as_slice)
                            .unwrap_or_default();
                        compute_course_record(
                            ctx,
                            &overrides,
                            directory.meta(a.course_id, a.teacher_id),
                            records.iter().copied(),
                            school_year,
                        )
                    })
                    .collect();
                compose_report(student_id, student_name, school_year, courses)
            })
            .collect();

        let ranking = rank_class(school_year, month, &reports);
        metrics::track_report_computed("class_ranking");

        info!(
            students = ranking.stats.total_students,
            ranked = ranking.stats.ranked_students,
            courses = ranking.stats.total_courses,
            "Class rankings computed"
        );

        Ok(ranking)
    }
}
