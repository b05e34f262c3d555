//! School directory seeding: schools, classes, teachers, courses, students
//! and the course assignments of each class.

use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, StreetName};
use fake::faker::name::en::{FirstName, LastName};
use karnameh_models::{ClassId, CourseId, SchoolId, StudentId, TeacherId};
use rand::Rng;
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Instant;

use super::models::{ClassPlan, ClassSeed, CourseSeed, SchoolSeed, SeedConfig, StudentSeed, TeacherSeed};
use super::{SeedResult, values_clause};

const SUBJECTS: [(&str, f64); 10] = [
    ("Mathematics", 4.0),
    ("Persian Literature", 3.0),
    ("Physics", 3.0),
    ("Chemistry", 3.0),
    ("Biology", 2.0),
    ("English", 2.0),
    ("Arabic", 2.0),
    ("Religious Studies", 2.0),
    ("Geography", 1.0),
    ("History", 1.0),
];

pub fn generate_schools(count: usize) -> Vec<SchoolSeed> {
    (0..count)
        .into_par_iter()
        .map(|idx| {
            let city: String = CityName().fake();
            let street: String = StreetName().fake();
            let building: String = BuildingNumber().fake();

            SchoolSeed {
                name: format!("{} High School #{}", city, idx + 1),
                address: format!("{} {}, {}", building, street, city),
            }
        })
        .collect()
}

pub fn generate_classes(school_ids: &[SchoolId], per_school: usize) -> Vec<ClassSeed> {
    school_ids
        .iter()
        .flat_map(|&school_id| {
            (0..per_school).map(move |idx| ClassSeed {
                school_id,
                name: class_name(idx),
            })
        })
        .collect()
}

fn class_name(idx: usize) -> String {
    let grade = 10 + idx / 3;
    let section = (b'A' + (idx % 3) as u8) as char;
    format!("Grade {}-{}", grade, section)
}

pub fn generate_teachers(school_ids: &[SchoolId], per_school: usize) -> Vec<TeacherSeed> {
    school_ids
        .par_iter()
        .flat_map(|&school_id| {
            (0..per_school)
                .map(|_| TeacherSeed {
                    school_id,
                    first_name: FirstName().fake(),
                    last_name: LastName().fake(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Courses cycle through a fixed subject list; some are left without
/// credit units to exercise the default.
pub fn generate_courses(school_ids: &[SchoolId], per_school: usize) -> Vec<CourseSeed> {
    school_ids
        .iter()
        .flat_map(|&school_id| {
            (0..per_school).map(move |idx| {
                let (name, credits) = SUBJECTS[idx % SUBJECTS.len()];
                CourseSeed {
                    school_id,
                    name: name.to_string(),
                    credit_units: (idx % 5 != 4).then_some(credits),
                }
            })
        })
        .collect()
}

pub fn generate_students(classes: &[(ClassId, SchoolId)], per_class: usize) -> Vec<StudentSeed> {
    classes
        .par_iter()
        .enumerate()
        .flat_map(|(class_idx, &(class_id, school_id))| {
            (0..per_class)
                .map(|student_idx| StudentSeed {
                    school_id,
                    class_id,
                    student_code: format!("S{:05}", class_idx * 1000 + student_idx),
                    first_name: FirstName().fake(),
                    last_name: LastName().fake(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Picks a teacher for every course of every class of a school.
pub fn plan_assignments(
    class_ids: &[ClassId],
    course_ids: &[CourseId],
    teacher_ids: &[TeacherId],
) -> Vec<(ClassId, CourseId, TeacherId)> {
    if teacher_ids.is_empty() {
        return Vec::new();
    }

    let mut rng = rand::thread_rng();
    class_ids
        .iter()
        .flat_map(|&class_id| course_ids.iter().map(move |&course_id| (class_id, course_id)))
        .map(|(class_id, course_id)| {
            let teacher_id = teacher_ids[rng.gen_range(0..teacher_ids.len())];
            (class_id, course_id, teacher_id)
        })
        .collect()
}

/// Seeds the directory for `config.num_schools` schools and returns one plan
/// per class for lesson generation.
pub async fn seed_directory(db: &PgPool, config: &SeedConfig) -> SeedResult<Vec<ClassPlan>> {
    let start_time = Instant::now();
    println!("🏫 Seeding {} schools...", config.num_schools);

    let mut tx = db.begin().await?;

    let schools = generate_schools(config.num_schools);
    let school_ids: Vec<SchoolId> = insert_rows::<_, SchoolId, _>(
        &mut tx,
        "schools (name, address)",
        &schools,
        2,
        |q, s| q.bind(&s.name).bind(&s.address),
    )
    .await?;

    let mut plans = Vec::with_capacity(school_ids.len() * config.classes_per_school);

    for school_id in &school_ids {
        let school = std::slice::from_ref(school_id);

        let classes = generate_classes(school, config.classes_per_school);
        let class_ids: Vec<ClassId> = insert_rows::<_, ClassId, _>(
            &mut tx,
            "classes (school_id, name)",
            &classes,
            2,
            |q, c| q.bind(c.school_id).bind(&c.name),
        )
        .await?;

        let teachers = generate_teachers(school, config.teachers_per_school);
        let teacher_ids: Vec<TeacherId> = insert_rows::<_, TeacherId, _>(
            &mut tx,
            "teachers (school_id, first_name, last_name)",
            &teachers,
            3,
            |q, t| q.bind(t.school_id).bind(&t.first_name).bind(&t.last_name),
        )
        .await?;

        let courses = generate_courses(school, config.courses_per_school);
        let course_ids: Vec<CourseId> = insert_rows::<_, CourseId, _>(
            &mut tx,
            "courses (school_id, name, credit_units)",
            &courses,
            3,
            |q, c| q.bind(c.school_id).bind(&c.name).bind(c.credit_units),
        )
        .await?;

        let class_keys: Vec<(ClassId, SchoolId)> =
            class_ids.iter().map(|&id| (id, *school_id)).collect();
        let students = generate_students(&class_keys, config.students_per_class);
        let student_ids: Vec<StudentId> = insert_rows::<_, StudentId, _>(
            &mut tx,
            "students (school_id, class_id, student_code, first_name, last_name)",
            &students,
            5,
            |q, s| {
                q.bind(s.school_id)
                    .bind(s.class_id)
                    .bind(&s.student_code)
                    .bind(&s.first_name)
                    .bind(&s.last_name)
            },
        )
        .await?;

        let assignments = plan_assignments(&class_ids, &course_ids, &teacher_ids);
        insert_assignments(&mut tx, &assignments).await?;

        for &class_id in &class_ids {
            let students = student_ids
                .iter()
                .zip(&students)
                .filter(|(_, seed)| seed.class_id == class_id)
                .map(|(id, _)| *id)
                .collect();
            let assignments = assignments
                .iter()
                .filter(|(c, _, _)| *c == class_id)
                .map(|&(_, course_id, teacher_id)| (course_id, teacher_id))
                .collect();

            plans.push(ClassPlan {
                school_id: *school_id,
                class_id,
                students,
                assignments,
            });
        }
    }

    tx.commit().await?;

    println!(
        "   ✓ Inserted {} classes and {} students in {:?}",
        plans.len(),
        plans.iter().map(|p| p.students.len()).sum::<usize>(),
        start_time.elapsed()
    );

    Ok(plans)
}

type PgQueryScalar<'q, T> =
    sqlx::query::QueryScalar<'q, Postgres, T, sqlx::postgres::PgArguments>;

/// Multi-row INSERT ... RETURNING id, chunked to stay under the bind limit.
async fn insert_rows<S, T, F>(
    tx: &mut Transaction<'_, Postgres>,
    target: &str,
    rows: &[S],
    columns: usize,
    bind: F,
) -> SeedResult<Vec<T>>
where
    T: Send + Unpin + for<'a> sqlx::Decode<'a, Postgres> + sqlx::Type<Postgres>,
    F: for<'q> Fn(PgQueryScalar<'q, T>, &'q S) -> PgQueryScalar<'q, T>,
{
    const MAX_BINDS: usize = 60_000;
    let batch_size = (MAX_BINDS / columns).max(1);

    let mut ids = Vec::with_capacity(rows.len());
    for chunk in rows.chunks(batch_size) {
        if chunk.is_empty() {
            continue;
        }

        let query = format!(
            "INSERT INTO {} VALUES {} RETURNING id",
            target,
            values_clause(chunk.len(), columns)
        );

        let mut q = sqlx::query_scalar::<_, T>(&query);
        for row in chunk {
            q = bind(q, row);
        }
        ids.extend(q.fetch_all(&mut **tx).await?);
    }

    Ok(ids)
}

async fn insert_assignments(
    tx: &mut Transaction<'_, Postgres>,
    assignments: &[(ClassId, CourseId, TeacherId)],
) -> SeedResult<()> {
    const BATCH_SIZE: usize = 2000;

    for chunk in assignments.chunks(BATCH_SIZE) {
        if chunk.is_empty() {
            continue;
        }

        let query = format!(
            "INSERT INTO class_assignments (class_id, course_id, teacher_id) VALUES {} \
             ON CONFLICT (class_id, course_id) DO UPDATE SET teacher_id = EXCLUDED.teacher_id",
            values_clause(chunk.len(), 3)
        );

        let mut q = sqlx::query(&query);
        for (class_id, course_id, teacher_id) in chunk {
            q = q.bind(class_id).bind(course_id).bind(teacher_id);
        }
        q.execute(&mut **tx).await?;
    }

    Ok(())
}
