//! Lesson record seeding: a school year of weekly lessons per class and course.

use chrono::{Datelike, Duration, NaiveDate};
use karnameh_grading::{JalaliDate, SchoolYear};
use karnameh_models::{AssessmentEntry, AttendanceMark, GradeEntry, StudentId};
use rand::Rng;
use rayon::prelude::*;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Instant;

use super::models::{ClassPlan, LessonSeed};
use super::{SeedResult, values_clause};

const LABELS: [&str; 5] = ["very-weak", "weak", "average", "good", "excellent"];

/// First Gregorian day of a school year (1 Mehr).
pub fn first_day(school_year: SchoolYear) -> Option<NaiveDate> {
    let gregorian_year = school_year.start_year() + 621;
    (15..=30)
        .filter_map(|day| NaiveDate::from_ymd_opt(gregorian_year, 9, day))
        .find(|date| {
            let jalali = JalaliDate::from_gregorian(*date);
            jalali.year == school_year.start_year() && jalali.month == 7 && jalali.day == 1
        })
}

/// Lesson dates every `interval_weeks` weeks from 1 Mehr to the end of Shahrivar.
pub fn lesson_dates(school_year: SchoolYear, interval_weeks: u32) -> Vec<NaiveDate> {
    let Some(start) = first_day(school_year) else {
        return Vec::new();
    };
    let step = Duration::weeks(i64::from(interval_weeks.max(1)));

    std::iter::successors(Some(start), |date| date.checked_add_signed(step))
        .take_while(|date| school_year.contains(JalaliDate::from_gregorian(*date)))
        .collect()
}

fn student_lessons(
    plan: &ClassPlan,
    student_id: StudentId,
    dates: &[NaiveDate],
) -> Vec<LessonSeed> {
    let mut rng = rand::thread_rng();
    let mut lessons = Vec::with_capacity(plan.assignments.len() * dates.len());

    for &(course_id, teacher_id) in &plan.assignments {
        let ability: f64 = rng.gen_range(11.0..19.5);

        for date in dates {
            let lesson_date = date.format("%Y-%m-%d").to_string();
            let mut grades = Vec::new();
            let mut assessments = Vec::new();

            if rng.gen_bool(0.4) {
                let total = if rng.gen_bool(0.2) { 10.0 } else { 20.0 };
                let raw = (ability + rng.gen_range(-3.0..3.0)).clamp(0.0, 20.0);
                let value = (raw * total / 20.0 * 4.0).round() / 4.0;
                let mut grade = GradeEntry::new(value.min(total), Some(total));
                grade.description = "Quiz".to_string();
                grade.date = lesson_date.clone();
                grades.push(grade);
            }

            if rng.gen_bool(0.2) {
                let idx = ((ability - 10.0) / 2.0 + rng.gen_range(-1.0..1.0))
                    .round()
                    .clamp(0.0, 4.0) as usize;
                let mut entry = AssessmentEntry::new(LABELS[idx]);
                entry.title = "Class participation".to_string();
                entry.date = lesson_date.clone();
                assessments.push(entry);
            }

            let attendance = match rng.gen_range(0..100) {
                0..=5 => AttendanceMark::Absent,
                6..=9 => AttendanceMark::Late,
                _ => AttendanceMark::Present,
            };

            lessons.push(LessonSeed {
                school_id: plan.school_id,
                class_id: plan.class_id,
                student_id,
                teacher_id,
                course_id,
                time_slot: format!("P{}", 1 + date.weekday().num_days_from_sunday() % 4),
                lesson_date,
                grades,
                assessments,
                attendance: Some(attendance),
            });
        }
    }

    lessons
}

/// Generates lessons for every student of every class in parallel.
pub fn generate_lessons(plans: &[ClassPlan], dates: &[NaiveDate]) -> Vec<LessonSeed> {
    plans
        .par_iter()
        .flat_map(|plan| {
            plan.students
                .par_iter()
                .flat_map(|&student_id| student_lessons(plan, student_id, dates))
                .collect::<Vec<_>>()
        })
        .collect()
}

pub async fn seed_lessons(
    db: &PgPool,
    plans: &[ClassPlan],
    school_year: SchoolYear,
    interval_weeks: u32,
) -> SeedResult<u64> {
    let start_time = Instant::now();
    let dates = lesson_dates(school_year, interval_weeks);
    println!(
        "📝 Generating lesson records for school year {} ({} lesson days)...",
        school_year,
        dates.len()
    );

    let lessons = generate_lessons(plans, &dates);
    println!("   ✓ Generated {} lessons in {:?}", lessons.len(), start_time.elapsed());

    let insert_start = Instant::now();
    let inserted = insert_lessons_batch(db, &lessons).await?;
    println!(
        "   ✓ Inserted {} lesson records in {:?}",
        inserted,
        insert_start.elapsed()
    );

    Ok(inserted)
}

pub async fn insert_lessons_batch(db: &PgPool, lessons: &[LessonSeed]) -> SeedResult<u64> {
    let mut tx = db.begin().await?;

    // 10 params per lesson
    const BATCH_SIZE: usize = 5000;

    let mut inserted = 0;
    for chunk in lessons.chunks(BATCH_SIZE) {
        inserted += insert_lessons_chunk(&mut tx, chunk).await?;
    }

    tx.commit().await?;
    Ok(inserted)
}

async fn insert_lessons_chunk(
    tx: &mut Transaction<'_, Postgres>,
    lessons: &[LessonSeed],
) -> SeedResult<u64> {
    if lessons.is_empty() {
        return Ok(0);
    }

    let query = format!(
        "INSERT INTO lesson_records \
         (school_id, class_id, student_id, teacher_id, course_id, lesson_date, time_slot, grades, assessments, attendance) \
         VALUES {} ON CONFLICT ON CONSTRAINT lesson_records_lesson_key DO NOTHING",
        values_clause(lessons.len(), 10)
    );

    let mut q = sqlx::query(&query);
    for lesson in lessons {
        q = q
            .bind(lesson.school_id)
            .bind(lesson.class_id)
            .bind(lesson.student_id)
            .bind(lesson.teacher_id)
            .bind(lesson.course_id)
            .bind(&lesson.lesson_date)
            .bind(&lesson.time_slot)
            .bind(Json(&lesson.grades))
            .bind(Json(&lesson.assessments))
            .bind(lesson.attendance.map(AttendanceMark::as_str));
    }

    Ok(q.execute(&mut **tx).await?.rows_affected())
}
