use karnameh_cache::{RedisCache, invalidate};
use karnameh_config::GradingConfig;
use karnameh_core::{AppError, PaginationMeta};
use karnameh_grading::parse_lesson_date;
use karnameh_models::{
    LessonRecord, LessonRecordFilterParams, PaginatedLessonRecordsResponse, SaveLessonRecordDto,
};
use tracing::{error, info, instrument, warn};

use crate::metrics;
use crate::store::RecordStore;

pub struct LessonRecordService;

impl LessonRecordService {
    /// Inserts the record, or replaces the grade and assessment lists of the
    /// record already stored for the same lesson.
    ///
    /// Unreadable lesson dates are stored as sent; reports skip them.
    #[instrument(
        skip(store, cache, grading, dto),
        fields(
            student_id = %dto.student_id,
            course_id = %dto.course_id,
            lesson_date = %dto.lesson_date,
            db.operation = "UPSERT",
            db.table = "lesson_records"
        )
    )]
    pub async fn save(
        store: &dyn RecordStore,
        cache: Option<&RedisCache>,
        grading: &GradingConfig,
        dto: SaveLessonRecordDto,
    ) -> Result<LessonRecord, AppError> {
        if let Err(e) = parse_lesson_date(&dto.lesson_date, grading.offset()) {
            warn!(error = %e, "Lesson date is unreadable and will be skipped in reports");
        }

        let record = store.save_lesson_record(&dto).await.map_err(|e| {
            error!(error = %e, "Failed to save lesson record");
            e.into_app_error()
        })?;

        invalidate::lesson_record(cache, record.student_id, record.course_id).await;
        metrics::track_lesson_record_saved();

        info!(
            record_id = %record.id,
            grades = record.grades.len(),
            assessments = record.assessments.len(),
            "Lesson record saved"
        );

        Ok(record)
    }

    #[instrument(skip(store, filters), fields(school_id = %filters.school_id, db.operation = "SELECT", db.table = "lesson_records"))]
    pub async fn list(
        store: &dyn RecordStore,
        filters: LessonRecordFilterParams,
    ) -> Result<PaginatedLessonRecordsResponse, AppError> {
        let pagination = filters.pagination();

        let (data, total) = store
            .lesson_records_page(&filters.query(), pagination.limit(), pagination.offset())
            .await
            .map_err(|e| e.into_app_error())?;

        Ok(PaginatedLessonRecordsResponse {
            data,
            meta: PaginationMeta::new(&pagination, total),
        })
    }
}
