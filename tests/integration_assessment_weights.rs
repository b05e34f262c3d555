mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_create_assessment_weight_normalizes_label() {
    let app = setup_test_app(directory_store().await);

    let (status, body) = send_json(
        app,
        "POST",
        "/api/assessment-weights",
        json!({
            "school_id": SCHOOL,
            "label": "  Very Weak ",
            "weight": -3.5
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["label"], "very-weak");
    assert_eq!(body["weight"], -3.5);
    assert!(body["teacher_id"].is_null());
}

#[tokio::test]
async fn test_create_assessment_weight_replaces_same_scope() {
    let store = directory_store().await;
    let body = |weight: f64| {
        json!({
            "school_id": SCHOOL,
            "teacher_id": MATH_TEACHER,
            "label": "excellent",
            "weight": weight
        })
    };

    let (_, first) = send_json(
        setup_test_app(store.clone()),
        "POST",
        "/api/assessment-weights",
        body(3.0),
    )
    .await;
    let (_, second) = send_json(
        setup_test_app(store.clone()),
        "POST",
        "/api/assessment-weights",
        body(4.0),
    )
    .await;

    assert_eq!(first["id"], second["id"]);
    assert_eq!(second["weight"], 4.0);

    let (status, list) = get_json(
        setup_test_app(store),
        &format!("/api/assessment-weights?school_id={}", SCHOOL),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_assessment_weight_validation() {
    let store = directory_store().await;

    let (status, _) = send_json(
        setup_test_app(store.clone()),
        "POST",
        "/api/assessment-weights",
        json!({ "school_id": SCHOOL, "label": "excellent", "weight": 40 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_json(
        setup_test_app(store.clone()),
        "POST",
        "/api/assessment-weights",
        json!({ "school_id": SCHOOL, "label": " _ ", "weight": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("label"));

    let (status, _) = send_json(
        setup_test_app(store),
        "POST",
        "/api/assessment-weights",
        json!({
            "school_id": SCHOOL,
            "teacher_id": "00000000-0000-0000-0000-00000000dead",
            "label": "excellent",
            "weight": 1
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_assessment_weights_for_teacher() {
    let store = directory_store().await;
    for (teacher_id, label) in [
        (None, "good"),
        (Some(MATH_TEACHER), "excellent"),
        (Some(PHYSICS_TEACHER), "weak"),
    ] {
        let (status, _) = send_json(
            setup_test_app(store.clone()),
            "POST",
            "/api/assessment-weights",
            json!({ "school_id": SCHOOL, "teacher_id": teacher_id, "label": label, "weight": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = get_json(
        setup_test_app(store),
        &format!(
            "/api/assessment-weights?school_id={}&teacher_id={}",
            SCHOOL, MATH_TEACHER
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let mut labels: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["label"].as_str().unwrap())
        .collect();
    labels.sort();
    assert_eq!(labels, vec!["excellent", "good"]);
}

#[tokio::test]
async fn test_delete_assessment_weight() {
    let store = directory_store().await;
    let (_, created) = send_json(
        setup_test_app(store.clone()),
        "POST",
        "/api/assessment-weights",
        json!({ "school_id": SCHOOL, "label": "good", "weight": 1.5 }),
    )
    .await;
    let uri = format!("/api/assessment-weights/{}", created["id"].as_str().unwrap());

    let response = setup_test_app(store.clone())
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(&uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = setup_test_app(store)
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(&uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_weight_override_changes_report() {
    let store = graded_store().await;

    let (status, _) = send_json(
        setup_test_app(store.clone()),
        "POST",
        "/api/assessment-weights",
        json!({
            "school_id": SCHOOL,
            "teacher_id": MATH_TEACHER,
            "label": "EXCELLENT",
            "weight": 4
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = get_json(
        setup_test_app(store),
        &format!("/api/reports/students/{}/report-card?school_year=1403", SARA),
    )
    .await;

    let math = &body["courses"][MATH.to_string()];
    assert!(approx(&math["months"]["8"]["final_score"], 20.0));
    assert!(approx(&math["year_average"], 18.0));
}
