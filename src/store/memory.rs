//! In-memory [`RecordStore`] for tests.
//!
//! Mirrors the PostgreSQL adapter: lesson keys and override scopes are
//! unique, writes must reference known directory entries, and lesson dates
//! are stored verbatim. Fetches can be made to fail on purpose to exercise
//! the report fallbacks.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use karnameh_models::{
    AssessmentWeightId, AssessmentWeightOverride, ClassId, ClassInfo, CourseId, CourseInfo,
    CreateAssessmentWeightDto, LessonRecord, LessonRecordId, LessonRecordQuery,
    SaveLessonRecordDto, SchoolId, StudentId, StudentInfo, TeacherId, TeacherInfo,
    TeachingAssignment,
};
use tokio::sync::RwLock;

use super::{OverrideFilter, RecordStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    records: Vec<LessonRecord>,
    overrides: Vec<AssessmentWeightOverride>,
    students: HashMap<StudentId, StudentInfo>,
    classes: HashMap<ClassId, ClassInfo>,
    courses: HashMap<CourseId, CourseInfo>,
    teachers: HashMap<TeacherId, TeacherInfo>,
    assignments: Vec<TeachingAssignment>,
    failing_courses: HashSet<CourseId>,
    failing_overrides: bool,
}

#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    tables: RwLock<Tables>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_class(&self, class: ClassInfo) {
        self.tables.write().await.classes.insert(class.id, class);
    }

    pub async fn add_student(&self, student: StudentInfo) {
        self.tables.write().await.students.insert(student.id, student);
    }

    pub async fn add_course(&self, course: CourseInfo) {
        self.tables.write().await.courses.insert(course.id, course);
    }

    pub async fn add_teacher(&self, teacher: TeacherInfo) {
        self.tables.write().await.teachers.insert(teacher.id, teacher);
    }

    /// Assigns `teacher_id` to teach `course_id` in `class_id`, replacing any
    /// previous teacher.
    pub async fn assign(&self, class_id: ClassId, course_id: CourseId, teacher_id: TeacherId) {
        let mut tables = self.tables.write().await;
        tables
            .assignments
            .retain(|a| !(a.class_id == class_id && a.course_id == course_id));
        tables.assignments.push(TeachingAssignment {
            class_id,
            course_id,
            teacher_id,
        });
    }

    /// Stores a record as is, bypassing validation and key replacement.
    pub async fn insert_raw_record(&self, record: LessonRecord) {
        self.tables.write().await.records.push(record);
    }

    /// Makes lesson record fetches filtered to `course_id` fail.
    pub async fn fail_course_fetches(&self, course_id: CourseId) {
        self.tables.write().await.failing_courses.insert(course_id);
    }

    pub async fn fail_override_fetches(&self) {
        self.tables.write().await.failing_overrides = true;
    }

    pub async fn record_count(&self) -> usize {
        self.tables.read().await.records.len()
    }
}

impl Tables {
    fn check_lesson_references(&self, dto: &SaveLessonRecordDto) -> StoreResult<()> {
        let known = self
            .students
            .get(&dto.student_id)
            .is_some_and(|s| s.school_id == dto.school_id)
            && self
                .classes
                .get(&dto.class_id)
                .is_some_and(|c| c.school_id == dto.school_id)
            && self.courses.contains_key(&dto.course_id)
            && self.teachers.contains_key(&dto.teacher_id);

        if known {
            Ok(())
        } else {
            Err(StoreError::InvalidReference(
                "Lesson record refers to an unknown school, class, student, teacher or course"
                    .to_string(),
            ))
        }
    }

    fn matching(&self, query: &LessonRecordQuery) -> StoreResult<Vec<LessonRecord>> {
        if let Some(course_id) = query.course_id
            && self.failing_courses.contains(&course_id)
        {
            return Err(StoreError::Unavailable(format!(
                "lesson records of course {} cannot be read",
                course_id
            )));
        }

        Ok(self
            .records
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn lesson_records(&self, query: &LessonRecordQuery) -> StoreResult<Vec<LessonRecord>> {
        let mut records = self.tables.read().await.matching(query)?;
        records.sort_by(|a, b| {
            (&a.lesson_date, &a.time_slot, a.id).cmp(&(&b.lesson_date, &b.time_slot, b.id))
        });
        Ok(records)
    }

    async fn lesson_records_page(
        &self,
        query: &LessonRecordQuery,
        limit: i64,
        offset: i64,
    ) -> StoreResult<(Vec<LessonRecord>, i64)> {
        let mut records = self.tables.read().await.matching(query)?;
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));

        let total = records.len() as i64;
        let page = records
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect();

        Ok((page, total))
    }

    async fn save_lesson_record(&self, dto: &SaveLessonRecordDto) -> StoreResult<LessonRecord> {
        let mut tables = self.tables.write().await;
        tables.check_lesson_references(dto)?;

        let now = Utc::now();
        let key = dto.key();
        if let Some(existing) = tables.records.iter_mut().find(|r| r.key() == key) {
            existing.grades = dto.grades.clone();
            existing.assessments = dto.assessments.clone();
            existing.attendance = dto.attendance;
            existing.note = dto.note.clone();
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let record = LessonRecord {
            id: LessonRecordId::new(),
            school_id: dto.school_id,
            class_id: dto.class_id,
            student_id: dto.student_id,
            teacher_id: dto.teacher_id,
            course_id: dto.course_id,
            lesson_date: dto.lesson_date.clone(),
            time_slot: dto.time_slot.clone(),
            grades: dto.grades.clone(),
            assessments: dto.assessments.clone(),
            attendance: dto.attendance,
            note: dto.note.clone(),
            updated_at: now,
        };
        tables.records.push(record.clone());
        Ok(record)
    }

    async fn weight_overrides(
        &self,
        school_id: SchoolId,
        filter: OverrideFilter<'_>,
    ) -> StoreResult<Vec<AssessmentWeightOverride>> {
        let tables = self.tables.read().await;
        if tables.failing_overrides {
            return Err(StoreError::Unavailable(
                "assessment weight overrides cannot be read".to_string(),
            ));
        }

        let mut overrides: Vec<AssessmentWeightOverride> = tables
            .overrides
            .iter()
            .filter(|o| o.school_id == school_id)
            .filter(|o| match (filter, o.teacher_id) {
                (OverrideFilter::All, _) | (OverrideFilter::Teachers(_), None) => true,
                (OverrideFilter::Teachers(ids), Some(teacher_id)) => ids.contains(&teacher_id),
            })
            .cloned()
            .collect();
        overrides.sort_by(|a, b| (&a.label, a.teacher_id).cmp(&(&b.label, b.teacher_id)));

        Ok(overrides)
    }

    async fn upsert_weight_override(
        &self,
        dto: &CreateAssessmentWeightDto,
    ) -> StoreResult<AssessmentWeightOverride> {
        let mut tables = self.tables.write().await;

        if let Some(teacher_id) = dto.teacher_id
            && !tables.teachers.contains_key(&teacher_id)
        {
            return Err(StoreError::InvalidReference(
                "Assessment weight refers to an unknown teacher".to_string(),
            ));
        }

        if let Some(existing) = tables.overrides.iter_mut().find(|o| {
            o.school_id == dto.school_id && o.teacher_id == dto.teacher_id && o.label == dto.label
        }) {
            existing.weight = dto.weight;
            return Ok(existing.clone());
        }

        let created = AssessmentWeightOverride {
            id: AssessmentWeightId::new(),
            school_id: dto.school_id,
            teacher_id: dto.teacher_id,
            label: dto.label.clone(),
            weight: dto.weight,
            created_at: Utc::now(),
        };
        tables.overrides.push(created.clone());
        Ok(created)
    }

    async fn delete_weight_override(
        &self,
        id: AssessmentWeightId,
    ) -> StoreResult<Option<AssessmentWeightOverride>> {
        let mut tables = self.tables.write().await;
        let position = tables.overrides.iter().position(|o| o.id == id);
        Ok(position.map(|idx| tables.overrides.remove(idx)))
    }

    async fn student(&self, id: StudentId) -> StoreResult<Option<StudentInfo>> {
        Ok(self.tables.read().await.students.get(&id).cloned())
    }

    async fn class(&self, id: ClassId) -> StoreResult<Option<ClassInfo>> {
        Ok(self.tables.read().await.classes.get(&id).cloned())
    }

    async fn class_roster(&self, class_id: ClassId) -> StoreResult<Vec<StudentInfo>> {
        let tables = self.tables.read().await;
        let mut roster: Vec<StudentInfo> = tables
            .students
            .values()
            .filter(|s| s.class_id == class_id)
            .cloned()
            .collect();
        roster.sort_by(|a, b| {
            (&a.last_name, &a.first_name, a.id).cmp(&(&b.last_name, &b.first_name, b.id))
        });
        Ok(roster)
    }

    async fn class_assignments(&self, class_id: ClassId) -> StoreResult<Vec<TeachingAssignment>> {
        let tables = self.tables.read().await;
        let mut assignments: Vec<TeachingAssignment> = tables
            .assignments
            .iter()
            .filter(|a| a.class_id == class_id)
            .copied()
            .collect();
        assignments.sort_by_key(|a| a.course_id);
        Ok(assignments)
    }

    async fn courses(&self, ids: &[CourseId]) -> StoreResult<Vec<CourseInfo>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.courses.get(id).cloned())
            .collect())
    }

    async fn teachers(&self, ids: &[TeacherId]) -> StoreResult<Vec<TeacherInfo>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.teachers.get(id).cloned())
            .collect())
    }
}
