//! Cache keys for derived reports and their invalidation.
//!
//! A student's year in a course is cached under
//! `{prefix}:report:{student}:{course}:{school_year}`. Any write to that
//! student's lesson records in the course drops every school year of it; any
//! change to assessment weights drops all reports.

use karnameh_models::{CourseId, SchoolId, StudentId};
use tracing::warn;

use crate::RedisCache;

fn build_key(prefix: &str, parts: &[&str]) -> String {
    format!("{}:{}", prefix, parts.join(":"))
}

/// Key of one student's computed year in one course.
pub fn course_record(prefix: &str, student_id: StudentId, course_id: CourseId, school_year: i32) -> String {
    build_key(
        prefix,
        &[
            "report",
            &student_id.to_string(),
            &course_id.to_string(),
            &school_year.to_string(),
        ],
    )
}

/// Every school year of one student's course.
pub fn student_course_pattern(prefix: &str, student_id: StudentId, course_id: CourseId) -> String {
    build_key(
        prefix,
        &["report", &student_id.to_string(), &course_id.to_string(), "*"],
    )
}

/// Every cached report.
pub fn reports_pattern(prefix: &str) -> String {
    build_key(prefix, &["report", "*"])
}

/// Invalidation helpers. A missing cache is a no-op and failures are only
/// logged; the next read recomputes from lesson records anyway.
pub mod invalidate {
    use super::*;

    /// Call after saving a lesson record.
    pub async fn lesson_record(cache: Option<&RedisCache>, student_id: StudentId, course_id: CourseId) {
        let Some(cache) = cache else { return };

        let pattern = student_course_pattern(cache.prefix(), student_id, course_id);
        if let Err(e) = cache.invalidate_pattern(&pattern).await {
            warn!(
                error = %e,
                student_id = %student_id,
                course_id = %course_id,
                "Failed to invalidate cached course record"
            );
        }
    }

    /// Call after creating or deleting an assessment weight override.
    pub async fn assessment_weights(cache: Option<&RedisCache>, school_id: SchoolId) {
        let Some(cache) = cache else { return };

        if let Err(e) = cache.invalidate_pattern(&reports_pattern(cache.prefix())).await {
            warn!(error = %e, school_id = %school_id, "Failed to invalidate cached reports");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_record_key() {
        let student = StudentId::nil();
        let course = CourseId::from_u128(1);
        let key = course_record("karnameh", student, course, 1403);

        assert!(key.starts_with("karnameh:report:"));
        assert!(key.ends_with(":1403"));
        assert!(key.contains(&student.to_string()));
        assert!(key.contains(&course.to_string()));
    }

    #[test]
    fn test_student_course_pattern_covers_every_year() {
        let student = StudentId::from_u128(5);
        let course = CourseId::from_u128(6);
        let pattern = student_course_pattern("karnameh", student, course);
        let key = course_record("karnameh", student, course, 1402);

        assert_eq!(pattern.trim_end_matches('*'), key.trim_end_matches("1402"));
    }

    #[test]
    fn test_reports_pattern_uses_prefix() {
        assert_eq!(reports_pattern("school-a"), "school-a:report:*");
    }

    #[tokio::test]
    async fn test_invalidate_without_cache_is_noop() {
        invalidate::lesson_record(None, StudentId::nil(), CourseId::nil()).await;
        invalidate::assessment_weights(None, SchoolId::nil()).await;
    }
}
