use async_trait::async_trait;
use chrono::{DateTime, Utc};
use karnameh_models::{
    AssessmentEntry, AssessmentWeightId, AssessmentWeightOverride, AttendanceMark, ClassId,
    ClassInfo, CourseId, CourseInfo, CreateAssessmentWeightDto, GradeEntry, LessonRecord,
    LessonRecordId, LessonRecordQuery, SaveLessonRecordDto, SchoolId, StudentId, StudentInfo,
    TeacherId, TeacherInfo, TeachingAssignment,
};
use sqlx::{FromRow, PgPool, types::Json};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{OverrideFilter, RecordStore, StoreError, StoreResult};

const LESSON_COLUMNS: &str = "id, school_id, class_id, student_id, teacher_id, course_id, \
     lesson_date, time_slot, grades, assessments, attendance, note, updated_at";

const LESSON_FILTER: &str = "school_id = $1 \
     AND ($2::uuid IS NULL OR class_id = $2) \
     AND ($3::uuid IS NULL OR student_id = $3) \
     AND ($4::uuid IS NULL OR teacher_id = $4) \
     AND ($5::uuid IS NULL OR course_id = $5)";

const OVERRIDE_COLUMNS: &str = "id, school_id, teacher_id, label, weight, created_at";

#[derive(FromRow)]
struct LessonRecordRow {
    id: LessonRecordId,
    school_id: SchoolId,
    class_id: ClassId,
    student_id: StudentId,
    teacher_id: TeacherId,
    course_id: CourseId,
    lesson_date: String,
    time_slot: String,
    grades: Json<Vec<GradeEntry>>,
    assessments: Json<Vec<AssessmentEntry>>,
    attendance: Option<String>,
    note: Option<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LessonRecordRow> for LessonRecord {
    type Error = StoreError;

    fn try_from(row: LessonRecordRow) -> Result<Self, Self::Error> {
        let attendance = row
            .attendance
            .as_deref()
            .map(str::parse::<AttendanceMark>)
            .transpose()
            .map_err(|e| StoreError::Corrupt {
                column: "lesson_records.attendance",
                message: e.to_string(),
            })?;

        Ok(LessonRecord {
            id: row.id,
            school_id: row.school_id,
            class_id: row.class_id,
            student_id: row.student_id,
            teacher_id: row.teacher_id,
            course_id: row.course_id,
            lesson_date: row.lesson_date,
            time_slot: row.time_slot,
            grades: row.grades.0,
            assessments: row.assessments.0,
            attendance,
            note: row.note,
            updated_at: row.updated_at,
        })
    }
}

fn into_records(rows: Vec<LessonRecordRow>) -> StoreResult<Vec<LessonRecord>> {
    rows.into_iter().map(LessonRecord::try_from).collect()
}

fn uuids<T: Copy + Into<Uuid>>(ids: &[T]) -> Vec<Uuid> {
    ids.iter().map(|&id| id.into()).collect()
}

/// Maps constraint violations of a write to [`StoreError::InvalidReference`].
fn write_error(err: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err
        && (db_err.is_foreign_key_violation() || db_err.is_check_violation())
    {
        return StoreError::InvalidReference(format!(
            "{} refers to an unknown school, class, student, teacher or course",
            what
        ));
    }
    StoreError::Database(err)
}

/// [`RecordStore`] backed by PostgreSQL.
#[derive(Clone, Debug)]
pub struct PgRecordStore {
    db: PgPool,
}

impl PgRecordStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    #[instrument(skip(self), fields(db.table = "lesson_records"))]
    async fn lesson_records(&self, query: &LessonRecordQuery) -> StoreResult<Vec<LessonRecord>> {
        let sql = format!(
            "SELECT {} FROM lesson_records WHERE {} ORDER BY lesson_date, time_slot, id",
            LESSON_COLUMNS, LESSON_FILTER
        );

        let rows = sqlx::query_as::<_, LessonRecordRow>(&sql)
            .bind(query.school_id)
            .bind(query.class_id)
            .bind(query.student_id)
            .bind(query.teacher_id)
            .bind(query.course_id)
            .fetch_all(&self.db)
            .await?;

        debug!(count = rows.len(), "Fetched lesson records");
        into_records(rows)
    }

    #[instrument(skip(self), fields(db.table = "lesson_records"))]
    async fn lesson_records_page(
        &self,
        query: &LessonRecordQuery,
        limit: i64,
        offset: i64,
    ) -> StoreResult<(Vec<LessonRecord>, i64)> {
        let sql = format!(
            "SELECT {} FROM lesson_records WHERE {} \
             ORDER BY updated_at DESC, id LIMIT $6 OFFSET $7",
            LESSON_COLUMNS, LESSON_FILTER
        );

        let rows = sqlx::query_as::<_, LessonRecordRow>(&sql)
            .bind(query.school_id)
            .bind(query.class_id)
            .bind(query.student_id)
            .bind(query.teacher_id)
            .bind(query.course_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM lesson_records WHERE {}", LESSON_FILTER);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(query.school_id)
            .bind(query.class_id)
            .bind(query.student_id)
            .bind(query.teacher_id)
            .bind(query.course_id)
            .fetch_one(&self.db)
            .await?;

        Ok((into_records(rows)?, total))
    }

    #[instrument(skip(self, dto), fields(db.operation = "UPSERT", db.table = "lesson_records", student_id = %dto.student_id, course_id = %dto.course_id))]
    async fn save_lesson_record(&self, dto: &SaveLessonRecordDto) -> StoreResult<LessonRecord> {
        let sql = format!(
            "INSERT INTO lesson_records \
             (school_id, class_id, student_id, teacher_id, course_id, lesson_date, time_slot, \
              grades, assessments, attendance, note) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT ON CONSTRAINT lesson_records_lesson_key DO UPDATE SET \
             grades = EXCLUDED.grades, \
             assessments = EXCLUDED.assessments, \
             attendance = EXCLUDED.attendance, \
             note = EXCLUDED.note, \
             updated_at = NOW() \
             RETURNING {}",
            LESSON_COLUMNS
        );

        let row = sqlx::query_as::<_, LessonRecordRow>(&sql)
            .bind(dto.school_id)
            .bind(dto.class_id)
            .bind(dto.student_id)
            .bind(dto.teacher_id)
            .bind(dto.course_id)
            .bind(&dto.lesson_date)
            .bind(&dto.time_slot)
            .bind(Json(&dto.grades))
            .bind(Json(&dto.assessments))
            .bind(dto.attendance.map(AttendanceMark::as_str))
            .bind(&dto.note)
            .fetch_one(&self.db)
            .await
            .map_err(|e| write_error(e, "Lesson record"))?;

        row.try_into()
    }

    #[instrument(skip(self), fields(db.table = "assessment_weight_overrides"))]
    async fn weight_overrides(
        &self,
        school_id: SchoolId,
        filter: OverrideFilter<'_>,
    ) -> StoreResult<Vec<AssessmentWeightOverride>> {
        let overrides = match filter {
            OverrideFilter::All => {
                let sql = format!(
                    "SELECT {} FROM assessment_weight_overrides WHERE school_id = $1 \
                     ORDER BY label, teacher_id NULLS FIRST",
                    OVERRIDE_COLUMNS
                );
                sqlx::query_as::<_, AssessmentWeightOverride>(&sql)
                    .bind(school_id)
                    .fetch_all(&self.db)
                    .await?
            }
            OverrideFilter::Teachers(teacher_ids) => {
                let sql = format!(
                    "SELECT {} FROM assessment_weight_overrides \
                     WHERE school_id = $1 AND (teacher_id IS NULL OR teacher_id = ANY($2)) \
                     ORDER BY label, teacher_id NULLS FIRST",
                    OVERRIDE_COLUMNS
                );
                sqlx::query_as::<_, AssessmentWeightOverride>(&sql)
                    .bind(school_id)
                    .bind(uuids(teacher_ids))
                    .fetch_all(&self.db)
                    .await?
            }
        };

        Ok(overrides)
    }

    #[instrument(skip(self, dto), fields(db.operation = "UPSERT", db.table = "assessment_weight_overrides", label = %dto.label))]
    async fn upsert_weight_override(
        &self,
        dto: &CreateAssessmentWeightDto,
    ) -> StoreResult<AssessmentWeightOverride> {
        let sql = format!(
            "INSERT INTO assessment_weight_overrides (school_id, teacher_id, label, weight) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (school_id, COALESCE(teacher_id, '00000000-0000-0000-0000-000000000000'::uuid), label) \
             DO UPDATE SET weight = EXCLUDED.weight \
             RETURNING {}",
            OVERRIDE_COLUMNS
        );

        sqlx::query_as::<_, AssessmentWeightOverride>(&sql)
            .bind(dto.school_id)
            .bind(dto.teacher_id)
            .bind(&dto.label)
            .bind(dto.weight)
            .fetch_one(&self.db)
            .await
            .map_err(|e| write_error(e, "Assessment weight"))
    }

    #[instrument(skip(self), fields(db.operation = "DELETE", db.table = "assessment_weight_overrides"))]
    async fn delete_weight_override(
        &self,
        id: AssessmentWeightId,
    ) -> StoreResult<Option<AssessmentWeightOverride>> {
        let sql = format!(
            "DELETE FROM assessment_weight_overrides WHERE id = $1 RETURNING {}",
            OVERRIDE_COLUMNS
        );

        Ok(sqlx::query_as::<_, AssessmentWeightOverride>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?)
    }

    #[instrument(skip(self), fields(db.table = "students"))]
    async fn student(&self, id: StudentId) -> StoreResult<Option<StudentInfo>> {
        Ok(sqlx::query_as::<_, StudentInfo>(
            "SELECT id, school_id, class_id, student_code, first_name, last_name \
             FROM students WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?)
    }

    #[instrument(skip(self), fields(db.table = "classes"))]
    async fn class(&self, id: ClassId) -> StoreResult<Option<ClassInfo>> {
        Ok(
            sqlx::query_as::<_, ClassInfo>("SELECT id, school_id, name FROM classes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.db)
                .await?,
        )
    }

    #[instrument(skip(self), fields(db.table = "students"))]
    async fn class_roster(&self, class_id: ClassId) -> StoreResult<Vec<StudentInfo>> {
        Ok(sqlx::query_as::<_, StudentInfo>(
            "SELECT id, school_id, class_id, student_code, first_name, last_name \
             FROM students WHERE class_id = $1 ORDER BY last_name, first_name, id",
        )
        .bind(class_id)
        .fetch_all(&self.db)
        .await?)
    }

    #[instrument(skip(self), fields(db.table = "class_assignments"))]
    async fn class_assignments(&self, class_id: ClassId) -> StoreResult<Vec<TeachingAssignment>> {
        Ok(sqlx::query_as::<_, TeachingAssignment>(
            "SELECT class_id, course_id, teacher_id FROM class_assignments \
             WHERE class_id = $1 ORDER BY course_id",
        )
        .bind(class_id)
        .fetch_all(&self.db)
        .await?)
    }

    #[instrument(skip(self, ids), fields(db.table = "courses", count = ids.len()))]
    async fn courses(&self, ids: &[CourseId]) -> StoreResult<Vec<CourseInfo>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(sqlx::query_as::<_, CourseInfo>(
            "SELECT id, school_id, name, credit_units FROM courses WHERE id = ANY($1)",
        )
        .bind(uuids(ids))
        .fetch_all(&self.db)
        .await?)
    }

    #[instrument(skip(self, ids), fields(db.table = "teachers", count = ids.len()))]
    async fn teachers(&self, ids: &[TeacherId]) -> StoreResult<Vec<TeacherInfo>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(sqlx::query_as::<_, TeacherInfo>(
            "SELECT id, school_id, first_name, last_name FROM teachers WHERE id = ANY($1)",
        )
        .bind(uuids(ids))
        .fetch_all(&self.db)
        .await?)
    }
}
