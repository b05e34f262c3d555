use anyhow::anyhow;
use karnameh_cache::{RedisCache, invalidate};
use karnameh_core::AppError;
use karnameh_grading::scoring::normalize_label;
use karnameh_models::{
    AssessmentWeightFilterParams, AssessmentWeightId, AssessmentWeightOverride,
    CreateAssessmentWeightDto,
};
use tracing::{debug, info, instrument};

use crate::store::{OverrideFilter, RecordStore};

pub struct AssessmentWeightService;

impl AssessmentWeightService {
    /// Overrides of a school. With a teacher filter, that teacher's overrides
    /// plus the school-wide ones.
    #[instrument(skip(store, filters), fields(school_id = %filters.school_id, db.operation = "SELECT", db.table = "assessment_weight_overrides"))]
    pub async fn list(
        store: &dyn RecordStore,
        filters: AssessmentWeightFilterParams,
    ) -> Result<Vec<AssessmentWeightOverride>, AppError> {
        let teachers: Vec<_> = filters.teacher_id.into_iter().collect();
        let filter = if teachers.is_empty() {
            OverrideFilter::All
        } else {
            OverrideFilter::Teachers(&teachers)
        };

        store
            .weight_overrides(filters.school_id, filter)
            .await
            .map_err(|e| e.into_app_error())
    }

    /// Stores the override under its normalized label, replacing one with the
    /// same school, teacher scope and label. Every cached report is dropped.
    #[instrument(skip(store, cache, dto), fields(school_id = %dto.school_id, label = %dto.label, db.operation = "UPSERT", db.table = "assessment_weight_overrides"))]
    pub async fn upsert(
        store: &dyn RecordStore,
        cache: Option<&RedisCache>,
        mut dto: CreateAssessmentWeightDto,
    ) -> Result<AssessmentWeightOverride, AppError> {
        let label = normalize_label(&dto.label);
        if label.is_empty() {
            return Err(AppError::bad_request(anyhow!("label must contain a word")));
        }
        debug!(raw = %dto.label, normalized = %label, "Normalized assessment label");
        dto.label = label;

        let stored = store
            .upsert_weight_override(&dto)
            .await
            .map_err(|e| e.into_app_error())?;

        invalidate::assessment_weights(cache, stored.school_id).await;

        info!(
            override_id = %stored.id,
            teacher_id = ?stored.teacher_id,
            weight = stored.weight,
            "Assessment weight stored"
        );

        Ok(stored)
    }

    #[instrument(skip(store, cache), fields(db.operation = "DELETE", db.table = "assessment_weight_overrides"))]
    pub async fn delete(
        store: &dyn RecordStore,
        cache: Option<&RedisCache>,
        id: AssessmentWeightId,
    ) -> Result<(), AppError> {
        let deleted = store
            .delete_weight_override(id)
            .await
            .map_err(|e| e.into_app_error())?
            .ok_or_else(|| AppError::not_found(anyhow!("Assessment weight not found")))?;

        invalidate::assessment_weights(cache, deleted.school_id).await;

        info!(override_id = %id, label = %deleted.label, "Assessment weight deleted");
        Ok(())
    }
}
