mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::*;
use tower::ServiceExt;

#[tokio::test]
async fn test_get_report_card() {
    let app = setup_test_app(graded_store().await);

    let (status, body) = get_json(
        app,
        &format!("/api/reports/students/{}/report-card?school_year=1403", SARA),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["student_name"], "Sara Ahmadi");
    assert_eq!(body["school_year"], 1403);
    assert!(approx(&body["weighted_average"], 16.33));
    assert!(approx(&body["total_credits"], 6.0));
    assert_eq!(body["skipped_records"], 1);

    let math = &body["courses"][MATH.to_string()];
    assert_eq!(math["course_name"], "Mathematics");
    assert!(approx(&math["year_average"], 17.0));
    assert!(approx(&math["months"]["8"]["final_score"], 18.0));
    assert!(approx(&math["months"]["8"]["adjustment"], 2.0));
}

#[tokio::test]
async fn test_get_report_card_filtered_by_teacher() {
    let app = setup_test_app(graded_store().await);

    let (status, body) = get_json(
        app,
        &format!(
            "/api/reports/students/{}/report-card?school_year=1403&teacher_id={}",
            ALI, PHYSICS_TEACHER
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["courses"].as_object().unwrap().len(), 1);
    assert!(approx(&body["weighted_average"], 11.0));
}

#[tokio::test]
async fn test_get_report_card_unknown_student() {
    let app = setup_test_app(graded_store().await);

    let (status, body) = get_json(
        app,
        "/api/reports/students/00000000-0000-0000-0000-00000000dead/report-card?school_year=1403",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Student not found"));
}

#[tokio::test]
async fn test_get_report_card_rejects_bad_parameters() {
    let store = graded_store().await;

    let (status, _) = get_json(
        setup_test_app(store.clone()),
        &format!("/api/reports/students/{}/report-card?school_year=99", SARA),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(
        setup_test_app(store.clone()),
        &format!(
            "/api/reports/students/{}/report-card?school_year=1403&teacher_id=nobody",
            SARA
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(
        setup_test_app(store),
        "/api/reports/students/not-a-uuid/report-card?school_year=1403",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_report_card_etag_revalidation() {
    let store = graded_store().await;
    let uri = format!("/api/reports/students/{}/report-card?school_year=1403", SARA);

    let response = setup_test_app(store.clone())
        .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::CACHE_CONTROL));
    let etag = response.headers().get(header::ETAG).unwrap().clone();

    let response = setup_test_app(store)
        .oneshot(
            Request::builder()
                .uri(&uri)
                .header(header::IF_NONE_MATCH, etag)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn test_get_cohort_sheet() {
    let app = setup_test_app(graded_store().await);

    let (status, body) = get_json(
        app,
        &format!(
            "/api/reports/classes/{}/courses/{}/monthly?school_year=1403",
            CLASS, MATH
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["course_name"], "Mathematics");
    assert_eq!(body["stats"]["total_students"], 3);
    assert_eq!(body["stats"]["ranked_students"], 2);

    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["student_name"], "Ali Rezaei");
    assert_eq!(rows[0]["year_rank"], 1);
    assert_eq!(rows[1]["student_name"], "Sara Ahmadi");
    assert!(approx(&rows[1]["months"]["8"]["progress"], 12.5));
    assert!(rows[2]["year_rank"].is_null());
}

#[tokio::test]
async fn test_get_cohort_sheet_course_not_taught() {
    let app = setup_test_app(graded_store().await);

    let (status, _) = get_json(
        app,
        &format!(
            "/api/reports/classes/{}/courses/00000000-0000-0000-0000-000000000599/monthly?school_year=1403",
            CLASS
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_class_rankings() {
    let app = setup_test_app(graded_store().await);

    let (status, body) = get_json(
        app,
        &format!("/api/reports/classes/{}/rankings?school_year=1403", CLASS),
    )
    .await;

    assert_eq!(status, StatusCode::OK);

    let overall = body["overall"].as_array().unwrap();
    assert_eq!(overall.len(), 2);
    assert_eq!(overall[0]["student_id"], SARA.to_string());
    assert_eq!(overall[0]["rank"], 1);
    assert_eq!(overall[1]["student_id"], ALI.to_string());
    assert_eq!(overall[1]["rank"], 2);

    let math = body["courses"][MATH.to_string()]["rankings"].as_array().unwrap();
    assert_eq!(math[0]["student_id"], ALI.to_string());
    assert_eq!(body["stats"]["total_courses"], 2);
    assert_eq!(body["student_names"][NEDA.to_string()], "Neda Karimi");
}

#[tokio::test]
async fn test_get_class_rankings_for_one_month() {
    let store = graded_store().await;

    let (status, body) = get_json(
        setup_test_app(store.clone()),
        &format!("/api/reports/classes/{}/rankings?school_year=1403&month=7", CLASS),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["month"], 7);
    let physics = body["courses"][PHYSICS.to_string()]["rankings"]
        .as_array()
        .unwrap();
    assert_eq!(physics[0]["student_id"], SARA.to_string());
    assert!(approx(&physics[0]["score"], 15.0));

    let (status, body) = get_json(
        setup_test_app(store),
        &format!("/api/reports/classes/{}/rankings?school_year=1403&month=13", CLASS),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("month"));
}

#[tokio::test]
async fn test_report_card_lists_monthly_weighted_averages() {
    let app = setup_test_app(graded_store().await);

    let (status, body) = get_json(
        app,
        &format!("/api/reports/students/{}/report-card?school_year=1403", ALI),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(approx(&body["monthly_weighted_averages"]["7"], 15.67));
    assert!(approx(&body["monthly_weighted_averages"]["8"], 18.0));
    assert!(body["monthly_weighted_averages"]["9"].is_null());
}

#[tokio::test]
async fn test_get_class_rankings_unknown_class() {
    let app = setup_test_app(graded_store().await);

    let (status, _) = get_json(
        app,
        "/api/reports/classes/00000000-0000-0000-0000-00000000dead/rankings?school_year=1403",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_saved_lesson_changes_report() {
    let store = graded_store().await;

    let (status, _) = send_json(
        setup_test_app(store.clone()),
        "PUT",
        "/api/lesson-records",
        serde_json::json!({
            "school_id": SCHOOL,
            "class_id": CLASS,
            "student_id": SARA,
            "teacher_id": PHYSICS_TEACHER,
            "course_id": PHYSICS,
            "lesson_date": "2024-10-02",
            "time_slot": "P1",
            "grades": [{ "value": 19 }]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get_json(
        setup_test_app(store),
        &format!("/api/reports/students/{}/report-card?school_year=1403", SARA),
    )
    .await;

    assert!(approx(&body["courses"][PHYSICS.to_string()]["year_average"], 19.0));
    // (17 * 4 + 19 * 2) / 6
    assert!(approx(&body["weighted_average"], 17.67));
}
