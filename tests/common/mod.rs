#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use karnameh::router::init_router;
use karnameh::state::AppState;
use karnameh::store::{MemoryRecordStore, RecordStore};
use karnameh_config::GradingConfig;
use karnameh_models::{
    AssessmentEntry, ClassId, ClassInfo, CourseId, CourseInfo, GradeEntry, SaveLessonRecordDto,
    SchoolId, StudentId, StudentInfo, TeacherId, TeacherInfo,
};
use tower::ServiceExt;

pub const SCHOOL: SchoolId = SchoolId::from_u128(0x100);
pub const CLASS: ClassId = ClassId::from_u128(0x200);
pub const SARA: StudentId = StudentId::from_u128(0x301);
pub const ALI: StudentId = StudentId::from_u128(0x302);
/// Enrolled but never graded
pub const NEDA: StudentId = StudentId::from_u128(0x303);
pub const MATH_TEACHER: TeacherId = TeacherId::from_u128(0x401);
pub const PHYSICS_TEACHER: TeacherId = TeacherId::from_u128(0x402);
pub const MATH: CourseId = CourseId::from_u128(0x501);
pub const PHYSICS: CourseId = CourseId::from_u128(0x502);

fn student(id: StudentId, code: &str, first: &str, last: &str) -> StudentInfo {
    StudentInfo {
        id,
        school_id: SCHOOL,
        class_id: CLASS,
        student_code: code.into(),
        first_name: first.into(),
        last_name: last.into(),
    }
}

fn teacher(id: TeacherId, first: &str, last: &str) -> TeacherInfo {
    TeacherInfo {
        id,
        school_id: SCHOOL,
        first_name: first.into(),
        last_name: last.into(),
    }
}

/// Class 10-A with three students, mathematics (4 units) and physics
/// (2 units), and no lesson records.
pub async fn directory_store() -> Arc<MemoryRecordStore> {
    let store = Arc::new(MemoryRecordStore::new());

    store
        .add_class(ClassInfo {
            id: CLASS,
            school_id: SCHOOL,
            name: "10-A".into(),
        })
        .await;
    store.add_student(student(SARA, "S00001", "Sara", "Ahmadi")).await;
    store.add_student(student(ALI, "S00002", "Ali", "Rezaei")).await;
    store.add_student(student(NEDA, "S00003", "Neda", "Karimi")).await;
    store.add_teacher(teacher(MATH_TEACHER, "Reza", "Karimi")).await;
    store.add_teacher(teacher(PHYSICS_TEACHER, "Maryam", "Hosseini")).await;
    store
        .add_course(CourseInfo {
            id: MATH,
            school_id: SCHOOL,
            name: "Mathematics".into(),
            credit_units: Some(4.0),
        })
        .await;
    store
        .add_course(CourseInfo {
            id: PHYSICS,
            school_id: SCHOOL,
            name: "Physics".into(),
            credit_units: Some(2.0),
        })
        .await;
    store.assign(CLASS, MATH, MATH_TEACHER).await;
    store.assign(CLASS, PHYSICS, PHYSICS_TEACHER).await;

    store
}

pub fn lesson(
    student_id: StudentId,
    course_id: CourseId,
    date: &str,
    grades: Vec<GradeEntry>,
    assessments: Vec<&str>,
) -> SaveLessonRecordDto {
    let teacher_id = if course_id == PHYSICS {
        PHYSICS_TEACHER
    } else {
        MATH_TEACHER
    };

    SaveLessonRecordDto {
        school_id: SCHOOL,
        class_id: CLASS,
        student_id,
        teacher_id,
        course_id,
        lesson_date: date.into(),
        time_slot: "P1".into(),
        grades,
        assessments: assessments.into_iter().map(AssessmentEntry::new).collect(),
        attendance: None,
        note: None,
    }
}

/// The directory plus a school year 1403 of lessons:
///
/// | student | mathematics (Mehr, Aban) | physics (Mehr) | weighted |
/// |---------|--------------------------|----------------|----------|
/// | Sara    | 16, 16 + excellent = 18  | 15             | 16.33    |
/// | Ali     | 18, 9/10 = 18            | 12 + weak = 11 | 15.67    |
/// | Neda    | none                     | none           | none     |
///
/// Sara also has a mathematics record with an unreadable date.
pub async fn graded_store() -> Arc<MemoryRecordStore> {
    let store = directory_store().await;

    let lessons = [
        lesson(SARA, MATH, "2024-10-01", vec![GradeEntry::new(16.0, None)], vec![]),
        lesson(
            SARA,
            MATH,
            "2024-11-15",
            vec![GradeEntry::new(16.0, None)],
            vec!["excellent"],
        ),
        lesson(SARA, MATH, "not a date", vec![GradeEntry::new(20.0, None)], vec![]),
        lesson(SARA, PHYSICS, "2024-10-02", vec![GradeEntry::new(15.0, None)], vec![]),
        lesson(ALI, MATH, "2024-10-01", vec![GradeEntry::new(18.0, None)], vec![]),
        lesson(ALI, MATH, "2024-11-15", vec![GradeEntry::new(9.0, Some(10.0))], vec![]),
        lesson(ALI, PHYSICS, "2024-10-02", vec![GradeEntry::new(12.0, None)], vec!["weak"]),
    ];

    for dto in &lessons {
        store.save_lesson_record(dto).await.unwrap();
    }

    store
}

pub fn setup_test_app(store: Arc<MemoryRecordStore>) -> Router {
    let mut state = AppState::new(store);
    state.grading_config = GradingConfig::default();
    init_router(state)
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    read_json(app, request).await
}

pub async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap();
    read_json(app, request).await
}

async fn read_json(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    // Extractor rejections answer in plain text
    let body = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&body).into_owned())
        })
    };
    (status, body)
}

pub fn approx(value: &serde_json::Value, expected: f64) -> bool {
    value.as_f64().is_some_and(|v| (v - expected).abs() < 1e-9)
}
