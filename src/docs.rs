use utoipa::OpenApi;

use karnameh_core::{PaginationMeta, PaginationParams};
use karnameh_grading::{
    AcademicMonth, AttendanceTally, ClassRanking, ClassStats, CohortSheet, CohortStats,
    CourseRanking, CourseYearRecord, JalaliDate, MonthlyAggregate, RankEntry, RankTable,
    ReportCard, SchoolYear, SheetCell, SheetRow, WeightedCourse,
};
use karnameh_models::{
    AssessmentEntry, AssessmentWeightOverride, AttendanceMark, CreateAssessmentWeightDto,
    GradeEntry, LessonRecord, PaginatedLessonRecordsResponse, SaveLessonRecordDto,
};

use crate::modules::calendar::JalaliConversion;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::reports::controller::get_report_card,
        crate::modules::reports::controller::get_cohort_sheet,
        crate::modules::reports::controller::get_class_rankings,
        crate::modules::lesson_records::controller::save_lesson_record,
        crate::modules::lesson_records::controller::list_lesson_records,
        crate::modules::assessment_weights::controller::list_assessment_weights,
        crate::modules::assessment_weights::controller::create_assessment_weight,
        crate::modules::assessment_weights::controller::delete_assessment_weight,
        crate::modules::calendar::controller::convert_to_jalali,
    ),
    components(
        schemas(
            ReportCard,
            CourseYearRecord,
            MonthlyAggregate,
            WeightedCourse,
            AttendanceTally,
            CohortSheet,
            CohortStats,
            SheetRow,
            SheetCell,
            RankTable,
            RankEntry,
            ClassRanking,
            ClassStats,
            CourseRanking,
            SchoolYear,
            AcademicMonth,
            JalaliDate,
            JalaliConversion,
            LessonRecord,
            SaveLessonRecordDto,
            GradeEntry,
            AssessmentEntry,
            AttendanceMark,
            PaginatedLessonRecordsResponse,
            AssessmentWeightOverride,
            CreateAssessmentWeightDto,
            PaginationMeta,
            PaginationParams,
        )
    ),
    tags(
        (name = "Reports", description = "Report cards, cohort grade sheets and class rankings"),
        (name = "Lesson Records", description = "Raw grades, assessments and attendance per lesson"),
        (name = "Assessment Weights", description = "Per-school adjustments for qualitative assessments"),
        (name = "Calendar", description = "Jalali calendar and school year lookup")
    ),
    info(
        title = "Karnameh API",
        version = "0.1.0",
        description = "Monthly and yearly score aggregation over raw lesson records, on the Jalali school year.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;
