mod common;

use axum::http::StatusCode;
use common::*;
use karnameh::modules::reports::{ReportContext, ReportService};
use karnameh::store::{MemoryRecordStore, RecordStore};
use karnameh_config::GradingConfig;
use karnameh_core::AppError;
use karnameh_grading::{
    AcademicMonth, AssessmentScale, ClassRanking, CohortSheet, ReportCard, SchoolYear,
};
use karnameh_models::{
    ClassId, CourseId, CreateAssessmentWeightDto, GradeEntry, StudentId, TeacherId,
};

const YEAR: SchoolYear = SchoolYear(1403);

fn mehr() -> AcademicMonth {
    AcademicMonth::new(7).unwrap()
}

fn aban() -> AcademicMonth {
    AcademicMonth::new(8).unwrap()
}

async fn report_card(
    store: &MemoryRecordStore,
    student_id: StudentId,
    teacher_id: Option<TeacherId>,
) -> Result<ReportCard, AppError> {
    let scale = AssessmentScale::standard();
    let ctx = ReportContext {
        store,
        cache: None,
        scale: &scale,
        school_offset: GradingConfig::default().offset(),
    };
    ReportService::report_card(&ctx, student_id, YEAR, teacher_id).await
}

async fn cohort_sheet(
    store: &MemoryRecordStore,
    class_id: ClassId,
    course_id: CourseId,
) -> Result<CohortSheet, AppError> {
    let scale = AssessmentScale::standard();
    let ctx = ReportContext {
        store,
        cache: None,
        scale: &scale,
        school_offset: GradingConfig::default().offset(),
    };
    ReportService::cohort_sheet(&ctx, class_id, course_id, YEAR, None).await
}

async fn class_rankings(
    store: &MemoryRecordStore,
    class_id: ClassId,
    month: Option<AcademicMonth>,
) -> Result<ClassRanking, AppError> {
    let scale = AssessmentScale::standard();
    let ctx = ReportContext {
        store,
        cache: None,
        scale: &scale,
        school_offset: GradingConfig::default().offset(),
    };
    ReportService::class_rankings(&ctx, class_id, YEAR, month).await
}

#[tokio::test]
async fn test_report_card_weighted_by_credits() {
    let store = graded_store().await;

    let report = report_card(&store, SARA, None).await.unwrap();

    assert_eq!(report.student_name, "Sara Ahmadi");
    assert_eq!(report.courses.len(), 2);

    let math = &report.courses[&MATH];
    assert_eq!(math.course_name, "Mathematics");
    assert_eq!(math.teacher_name, "Reza Karimi");
    assert_eq!(math.months[&mehr()].final_score, Some(16.0));
    assert_eq!(math.months[&aban()].final_score, Some(18.0));
    assert_eq!(math.months[&aban()].adjustment, 2.0);
    assert_eq!(math.year_average, Some(17.0));
    assert_eq!(math.skipped_records, 1);

    assert_eq!(report.courses[&PHYSICS].year_average, Some(15.0));
    assert_eq!(report.weighted_average, Some(16.33));
    assert_eq!(report.total_credits, 6.0);
    assert_eq!(report.breakdown.len(), 2);
    assert_eq!(report.skipped_records, 1);
}

#[tokio::test]
async fn test_report_card_monthly_weighted_averages() {
    let store = graded_store().await;

    let report = report_card(&store, SARA, None).await.unwrap();

    // Mehr: (16 × 4 + 15 × 2) / 6, Aban: mathematics only
    let months = &report.monthly_weighted_averages;
    assert_eq!(months.len(), 2);
    assert_eq!(months[&mehr()], 15.67);
    assert_eq!(months[&aban()], 18.0);
}

#[tokio::test]
async fn test_report_card_normalizes_partial_points() {
    let store = graded_store().await;

    let report = report_card(&store, ALI, None).await.unwrap();

    let math = &report.courses[&MATH];
    assert_eq!(math.months[&aban()].final_score, Some(18.0));
    assert_eq!(math.year_average, Some(18.0));
    assert_eq!(report.courses[&PHYSICS].year_average, Some(11.0));
    assert_eq!(report.weighted_average, Some(15.67));
}

#[tokio::test]
async fn test_report_card_without_records() {
    let store = graded_store().await;

    let report = report_card(&store, NEDA, None).await.unwrap();

    assert_eq!(report.courses.len(), 2);
    assert!(report.courses.values().all(|c| c.year_average.is_none()));
    assert_eq!(report.weighted_average, None);
    assert_eq!(report.total_credits, 0.0);
    assert!(report.breakdown.is_empty());
}

#[tokio::test]
async fn test_report_card_unknown_student() {
    let store = graded_store().await;

    let err = report_card(&store, StudentId::from_u128(0xdead), None)
        .await
        .unwrap_err();

    assert_eq!(err.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_report_card_filtered_by_teacher() {
    let store = graded_store().await;

    let report = report_card(&store, SARA, Some(PHYSICS_TEACHER)).await.unwrap();

    assert_eq!(report.courses.len(), 1);
    assert!(report.courses.contains_key(&PHYSICS));
    assert_eq!(report.weighted_average, Some(15.0));
}

#[tokio::test]
async fn test_report_card_ignores_other_school_years() {
    let store = graded_store().await;
    // 1 Mehr 1404, the first day of the next school year
    store
        .save_lesson_record(&lesson(
            SARA,
            PHYSICS,
            "2025-09-23",
            vec![GradeEntry::new(2.0, None)],
            vec![],
        ))
        .await
        .unwrap();

    let report = report_card(&store, SARA, None).await.unwrap();

    assert_eq!(report.courses[&PHYSICS].year_average, Some(15.0));
    assert_eq!(report.courses[&PHYSICS].skipped_records, 0);
}

#[tokio::test]
async fn test_failing_course_is_left_out() {
    let store = graded_store().await;
    store.fail_course_fetches(MATH).await;

    let report = report_card(&store, SARA, None).await.unwrap();

    assert_eq!(report.courses.len(), 1);
    assert!(report.courses.contains_key(&PHYSICS));
    assert_eq!(report.weighted_average, Some(15.0));
    assert_eq!(report.total_credits, 2.0);
}

#[tokio::test]
async fn test_unknown_course_falls_back_to_raw_id() {
    let store = graded_store().await;
    let chemistry = CourseId::from_u128(0x599);
    store.assign(CLASS, chemistry, MATH_TEACHER).await;

    let report = report_card(&store, SARA, None).await.unwrap();

    let course = &report.courses[&chemistry];
    assert_eq!(course.course_name, chemistry.to_string());
    assert_eq!(course.credit_units, 1.0);
    assert_eq!(course.year_average, None);
    assert_eq!(report.weighted_average, Some(16.33));
}

#[tokio::test]
async fn test_unreadable_overrides_fall_back_to_scale() {
    let store = graded_store().await;
    store
        .upsert_weight_override(&CreateAssessmentWeightDto {
            school_id: SCHOOL,
            teacher_id: None,
            label: "excellent".into(),
            weight: 4.0,
        })
        .await
        .unwrap();
    store.fail_override_fetches().await;

    let report = report_card(&store, SARA, None).await.unwrap();

    assert_eq!(report.courses[&MATH].months[&aban()].final_score, Some(18.0));
}

#[tokio::test]
async fn test_teacher_override_beats_school_override() {
    let store = graded_store().await;
    let overrides = [
        (None, "excellent", 3.0),
        (None, "weak", -3.0),
        (Some(MATH_TEACHER), "excellent", 1.0),
    ];
    for (teacher_id, label, weight) in overrides {
        store
            .upsert_weight_override(&CreateAssessmentWeightDto {
                school_id: SCHOOL,
                teacher_id,
                label: label.into(),
                weight,
            })
            .await
            .unwrap();
    }

    let sara = report_card(&store, SARA, None).await.unwrap();
    assert_eq!(sara.courses[&MATH].months[&aban()].final_score, Some(17.0));
    assert_eq!(sara.courses[&MATH].year_average, Some(16.5));

    let ali = report_card(&store, ALI, None).await.unwrap();
    assert_eq!(ali.courses[&PHYSICS].year_average, Some(9.0));
}

#[tokio::test]
async fn test_cohort_sheet_ranks_and_progress() {
    let store = graded_store().await;

    let sheet = cohort_sheet(&store, CLASS, MATH).await.unwrap();

    assert_eq!(sheet.course_name, "Mathematics");
    assert_eq!(sheet.stats.total_students, 3);
    assert_eq!(sheet.stats.ranked_students, 2);
    assert_eq!(sheet.stats.class_average, Some(17.5));

    let order: Vec<StudentId> = sheet.rows.iter().map(|r| r.student_id).collect();
    assert_eq!(order, vec![ALI, SARA, NEDA]);

    let ali = &sheet.rows[0];
    assert_eq!(ali.year_rank, Some(1));
    assert_eq!(ali.months[&mehr()].rank, Some(1));
    assert_eq!(ali.months[&aban()].rank, Some(1));
    assert_eq!(ali.months[&aban()].progress, Some(0.0));

    let sara = &sheet.rows[1];
    assert_eq!(sara.year_rank, Some(2));
    assert_eq!(sara.months[&mehr()].rank, Some(2));
    assert_eq!(sara.months[&aban()].rank, Some(1));
    assert_eq!(sara.months[&aban()].progress, Some(12.5));
    assert_eq!(sara.overall_progress, Some(12.5));

    let neda = &sheet.rows[2];
    assert_eq!(neda.year_rank, None);
    assert_eq!(neda.year_average, None);
    assert_eq!(neda.months.len(), 12);
}

#[tokio::test]
async fn test_cohort_sheet_unassigned_course() {
    let store = graded_store().await;

    let err = cohort_sheet(&store, CLASS, CourseId::from_u128(0x599))
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);

    let err = cohort_sheet(&store, ClassId::from_u128(0xdead), MATH)
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cohort_sheet_fetch_failure_is_an_error() {
    let store = graded_store().await;
    store.fail_course_fetches(MATH).await;

    let err = cohort_sheet(&store, CLASS, MATH).await.unwrap_err();

    assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_class_rankings() {
    let store = graded_store().await;

    let ranking = class_rankings(&store, CLASS, None).await.unwrap();

    let overall: Vec<(StudentId, u32)> = ranking
        .overall
        .iter()
        .map(|e| (e.student_id, e.rank))
        .collect();
    assert_eq!(overall, vec![(SARA, 1), (ALI, 2)]);
    assert_eq!(ranking.overall[0].score, 16.33);

    let math: Vec<StudentId> = ranking.courses[&MATH]
        .rankings
        .iter()
        .map(|e| e.student_id)
        .collect();
    assert_eq!(math, vec![ALI, SARA]);

    let physics: Vec<StudentId> = ranking.courses[&PHYSICS]
        .rankings
        .iter()
        .map(|e| e.student_id)
        .collect();
    assert_eq!(physics, vec![SARA, ALI]);

    assert_eq!(ranking.student_names[&NEDA], "Neda Karimi");
    assert_eq!(ranking.stats.total_students, 3);
    assert_eq!(ranking.stats.ranked_students, 2);
    assert_eq!(ranking.stats.total_courses, 2);
    let average = ranking.stats.class_average.unwrap();
    assert!((average - 16.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_class_rankings_shared_scores() {
    let store = directory_store().await;
    for student_id in [SARA, ALI] {
        store
            .save_lesson_record(&lesson(
                student_id,
                MATH,
                "2024-10-01",
                vec![GradeEntry::new(15.0, None)],
                vec![],
            ))
            .await
            .unwrap();
    }
    store
        .save_lesson_record(&lesson(
            NEDA,
            MATH,
            "2024-10-01",
            vec![GradeEntry::new(12.0, None)],
            vec![],
        ))
        .await
        .unwrap();

    let ranking = class_rankings(&store, CLASS, None).await.unwrap();

    let ranks: Vec<u32> = ranking.overall.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![1, 1, 3]);
}

#[tokio::test]
async fn test_class_rankings_for_one_month() {
    let store = graded_store().await;
    store
        .save_lesson_record(&lesson(
            NEDA,
            PHYSICS,
            "2024-10-20",
            vec![GradeEntry::new(19.0, None)],
            vec![],
        ))
        .await
        .unwrap();

    let ranking = class_rankings(&store, CLASS, Some(mehr())).await.unwrap();

    assert_eq!(ranking.month, Some(mehr()));
    let overall: Vec<(StudentId, u32)> = ranking
        .overall
        .iter()
        .map(|e| (e.student_id, e.rank))
        .collect();
    // Sara (16 × 4 + 15 × 2) / 6 and Ali (18 × 4 + 11 × 2) / 6 share a rank
    assert_eq!(overall[0], (NEDA, 1));
    assert_eq!(overall[1].1, 2);
    assert_eq!(overall[2].1, 2);
    assert_eq!(ranking.overall[1].score, 15.67);

    let physics: Vec<StudentId> = ranking.courses[&PHYSICS]
        .rankings
        .iter()
        .map(|e| e.student_id)
        .collect();
    assert_eq!(physics, vec![NEDA, SARA, ALI]);

    let aban = class_rankings(&store, CLASS, Some(aban())).await.unwrap();
    assert_eq!(aban.stats.ranked_students, 2);
    assert!(aban.overall.iter().all(|e| e.rank == 1 && e.score == 18.0));
}
