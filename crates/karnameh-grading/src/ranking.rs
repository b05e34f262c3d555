//! Competition ranking, progress and cohort tables.
//!
//! Ranks follow the "1224" scheme: equal scores share the better rank and
//! the next distinct score takes its 1-based position. Students without a
//! score are left out of the ranking rather than placed last.

use std::{cmp::Ordering, collections::BTreeMap};

use karnameh_models::{CourseId, StudentId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    aggregate::{CourseYearRecord, ReportCard, year_average},
    school_year::{AcademicMonth, SchoolYear},
    scoring::round2,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RankEntry {
    pub student_id: StudentId,
    pub score: f64,
    pub rank: u32,
}

/// Ranks scores highest first.
///
/// `None` and non-finite scores are unranked. Students with equal scores are
/// listed by id.
pub fn competition_rank<I>(scores: I) -> Vec<RankEntry>
where
    I: IntoIterator<Item = (StudentId, Option<f64>)>,
{
    let mut scored: Vec<(StudentId, f64)> = scores
        .into_iter()
        .filter_map(|(id, score)| score.filter(|s| s.is_finite()).map(|s| (id, s)))
        .collect();

    scored.sort_by(|a, b| match b.1.total_cmp(&a.1) {
        Ordering::Equal => a.0.cmp(&b.0),
        other => other,
    });

    let mut ranked: Vec<RankEntry> = Vec::with_capacity(scored.len());
    for (index, (student_id, score)) in scored.into_iter().enumerate() {
        let rank = match ranked.last() {
            Some(prev) if prev.score == score => prev.rank,
            _ => index as u32 + 1,
        };
        ranked.push(RankEntry {
            student_id,
            score,
            rank,
        });
    }
    ranked
}

/// Percentage change from `previous` to `current`.
pub fn progress(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    match (current, previous) {
        (Some(current), Some(previous)) if previous != 0.0 => {
            Some((current - previous) / previous * 100.0)
        }
        _ => None,
    }
}

/// Change from the first to the last scored month of the year.
///
/// Needs at least two scored months.
pub fn overall_progress<I>(scores: I) -> Option<f64>
where
    I: IntoIterator<Item = (AcademicMonth, Option<f64>)>,
{
    let mut scored: Vec<(AcademicMonth, f64)> = scores
        .into_iter()
        .filter_map(|(month, score)| score.map(|s| (month, s)))
        .collect();
    if scored.len() < 2 {
        return None;
    }
    scored.sort_by_key(|(month, _)| month.position());

    let first = scored.first().map(|(_, s)| *s);
    let last = scored.last().map(|(_, s)| *s);
    progress(last, first)
}

/// Ranks per month and for the year average, keyed by student.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RankTable {
    #[schema(value_type = Object)]
    pub months: BTreeMap<AcademicMonth, BTreeMap<StudentId, u32>>,
    #[schema(value_type = Object)]
    pub year_average: BTreeMap<StudentId, u32>,
}

impl RankTable {
    pub fn build(records: &[(StudentId, &CourseYearRecord)]) -> Self {
        let months = AcademicMonth::ACADEMIC_ORDER
            .into_iter()
            .map(|month| {
                let ranks = competition_rank(records.iter().map(|(id, record)| {
                    (*id, record.months.get(&month).and_then(|m| m.final_score))
                }));
                (month, rank_map(&ranks))
            })
            .collect();

        let year = competition_rank(records.iter().map(|(id, r)| (*id, r.year_average)));

        Self {
            months,
            year_average: rank_map(&year),
        }
    }

    pub fn month_rank(&self, month: AcademicMonth, student_id: StudentId) -> Option<u32> {
        self.months.get(&month)?.get(&student_id).copied()
    }
}

fn rounded(entries: Vec<RankEntry>) -> Vec<RankEntry> {
    entries
        .into_iter()
        .map(|entry| RankEntry {
            score: round2(entry.score),
            ..entry
        })
        .collect()
}

fn rank_map(entries: &[RankEntry]) -> BTreeMap<StudentId, u32> {
    entries.iter().map(|e| (e.student_id, e.rank)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CohortStats {
    pub total_students: usize,
    /// Students with a score
    pub ranked_students: usize,
    /// Mean of the ranked scores, two decimals
    pub class_average: Option<f64>,
}

impl CohortStats {
    pub fn new(total_students: usize, ranked: &[RankEntry]) -> Self {
        Self {
            total_students,
            ranked_students: ranked.len(),
            class_average: year_average(ranked.iter().map(|e| Some(e.score))).map(round2),
        }
    }
}

/// One cell of a cohort grade sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SheetCell {
    pub final_score: Option<f64>,
    pub rank: Option<u32>,
    /// Percent change from the previous month
    pub progress: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SheetRow {
    pub student_id: StudentId,
    pub student_name: String,
    #[schema(value_type = Object)]
    pub months: BTreeMap<AcademicMonth, SheetCell>,
    pub year_average: Option<f64>,
    pub year_rank: Option<u32>,
    pub overall_progress: Option<f64>,
}

/// A course's monthly grades for a whole class, with ranks and progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CohortSheet {
    pub school_year: SchoolYear,
    pub course_id: CourseId,
    pub course_name: String,
    pub rows: Vec<SheetRow>,
    pub ranks: RankTable,
    pub stats: CohortStats,
}

/// Input row for [`build_cohort_sheet`].
#[derive(Debug, Clone)]
pub struct CohortMember {
    pub student_id: StudentId,
    pub student_name: String,
    pub record: CourseYearRecord,
}

pub fn build_cohort_sheet(
    school_year: SchoolYear,
    course_id: CourseId,
    course_name: String,
    members: Vec<CohortMember>,
) -> CohortSheet {
    let records: Vec<(StudentId, &CourseYearRecord)> =
        members.iter().map(|m| (m.student_id, &m.record)).collect();
    let ranks = RankTable::build(&records);
    let year_ranking = competition_rank(records.iter().map(|(id, r)| (*id, r.year_average)));
    let stats = CohortStats::new(members.len(), &year_ranking);

    let mut rows: Vec<SheetRow> = members
        .iter()
        .map(|member| {
            let scores: BTreeMap<AcademicMonth, Option<f64>> = member.record.monthly_scores().collect();
            let months = AcademicMonth::ACADEMIC_ORDER
                .into_iter()
                .map(|month| {
                    let final_score = scores.get(&month).copied().flatten();
                    let previous = month.previous().and_then(|p| scores.get(&p).copied().flatten());
                    let cell = SheetCell {
                        final_score,
                        rank: ranks.month_rank(month, member.student_id),
                        progress: progress(final_score, previous).map(round2),
                    };
                    (month, cell)
                })
                .collect();

            SheetRow {
                student_id: member.student_id,
                student_name: member.student_name.clone(),
                months,
                year_average: member.record.year_average.map(round2),
                year_rank: ranks.year_average.get(&member.student_id).copied(),
                overall_progress: overall_progress(scores).map(round2),
            }
        })
        .collect();

    // Ranked students first, best first; then the rest by name
    rows.sort_by(|a, b| match (a.year_rank, b.year_rank) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.student_id.cmp(&b.student_id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.student_name.cmp(&b.student_name),
    });

    CohortSheet {
        school_year,
        course_id,
        course_name,
        rows,
        ranks,
        stats,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CourseRanking {
    pub course_id: CourseId,
    pub course_name: String,
    pub rankings: Vec<RankEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClassStats {
    pub total_students: usize,
    pub ranked_students: usize,
    pub class_average: Option<f64>,
    pub total_courses: usize,
}

/// Overall and per-course rankings of a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClassRanking {
    pub school_year: SchoolYear,
    /// Month the ranking covers, the whole year when absent
    pub month: Option<AcademicMonth>,
    /// Ranked by credit-weighted average
    pub overall: Vec<RankEntry>,
    #[schema(value_type = Object)]
    pub courses: BTreeMap<CourseId, CourseRanking>,
    #[schema(value_type = Object)]
    pub student_names: BTreeMap<StudentId, String>,
    pub stats: ClassStats,
}

/// Ranks a class by credit-weighted average and each course by its score.
///
/// With a `month` the ranking uses that month's scores, otherwise the year
/// averages. Ranks are decided on unrounded scores, only the reported
/// scores are rounded.
pub fn rank_class(
    school_year: SchoolYear,
    month: Option<AcademicMonth>,
    reports: &[ReportCard],
) -> ClassRanking {
    let overall = competition_rank(reports.iter().map(|report| {
        let score = match month {
            Some(month) => report.month_weighted_score(month),
            None => report.weighted_score(),
        };
        (report.student_id, score)
    }));

    let mut course_scores: BTreeMap<CourseId, (String, Vec<(StudentId, Option<f64>)>)> = BTreeMap::new();
    for report in reports {
        for (course_id, record) in &report.courses {
            let score = match month {
                Some(month) => record.months.get(&month).and_then(|m| m.final_score),
                None => record.year_average,
            };
            course_scores
                .entry(*course_id)
                .or_insert_with(|| (record.course_name.clone(), Vec::new()))
                .1
                .push((report.student_id, score));
        }
    }

    let courses: BTreeMap<CourseId, CourseRanking> = course_scores
        .into_iter()
        .map(|(course_id, (course_name, scores))| {
            let ranking = CourseRanking {
                course_id,
                course_name,
                rankings: rounded(competition_rank(scores)),
            };
            (course_id, ranking)
        })
        .collect();

    let cohort = CohortStats::new(reports.len(), &overall);
    let stats = ClassStats {
        total_students: cohort.total_students,
        ranked_students: cohort.ranked_students,
        class_average: cohort.class_average,
        total_courses: courses.len(),
    };

    ClassRanking {
        school_year,
        month,
        overall: rounded(overall),
        student_names: reports
            .iter()
            .map(|r| (r.student_id, r.student_name.clone()))
            .collect(),
        courses,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use karnameh_models::{GradeEntry, TeacherId};

    use super::*;
    use crate::{
        aggregate::{MonthlyAggregate, compose_report},
        intake::AttendanceTally,
    };

    const MATH: CourseId = CourseId::from_u128(50);

    fn sid(n: u128) -> StudentId {
        StudentId::from_u128(n)
    }

    fn month(n: u32) -> AcademicMonth {
        AcademicMonth::new(n).unwrap()
    }

    fn record(scores: &[(u32, f64)]) -> CourseYearRecord {
        let months: BTreeMap<AcademicMonth, MonthlyAggregate> = scores
            .iter()
            .map(|&(n, score)| {
                let aggregate = MonthlyAggregate {
                    month: month(n),
                    month_name: month(n).name().to_string(),
                    grades: vec![GradeEntry::new(score, None)],
                    assessments: Vec::new(),
                    attendance: AttendanceTally::default(),
                    average_grade: Some(score),
                    adjustment: 0.0,
                    final_score: Some(score),
                };
                (month(n), aggregate)
            })
            .collect();
        let year_average = year_average(months.values().map(|m| m.final_score));

        CourseYearRecord {
            course_id: MATH,
            course_name: "Mathematics".into(),
            teacher_id: TeacherId::from_u128(40),
            teacher_name: "Reza Karimi".into(),
            credit_units: 2.0,
            months,
            year_average,
            skipped_records: 0,
        }
    }

    fn member(n: u128, record: CourseYearRecord) -> CohortMember {
        CohortMember {
            student_id: sid(n),
            student_name: format!("student {n}"),
            record,
        }
    }

    fn ranks(entries: &[RankEntry]) -> Vec<u32> {
        entries.iter().map(|e| e.rank).collect()
    }

    #[test]
    fn test_ties_share_rank_and_leave_gap() {
        let ranked = competition_rank([
            (sid(1), Some(20.0)),
            (sid(2), Some(18.0)),
            (sid(3), Some(18.0)),
            (sid(4), Some(15.0)),
        ]);
        assert_eq!(ranks(&ranked), vec![1, 2, 2, 4]);
    }

    #[test]
    fn test_unscored_students_are_unranked() {
        let ranked = competition_rank([(sid(1), None), (sid(2), Some(20.0)), (sid(3), Some(18.0))]);
        assert_eq!(ranks(&ranked), vec![1, 2]);
        assert!(ranked.iter().all(|e| e.student_id != sid(1)));
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let ranked = competition_rank([
            (sid(4), Some(15.0)),
            (sid(3), Some(18.0)),
            (sid(1), Some(20.0)),
            (sid(2), Some(18.0)),
        ]);
        let ids: Vec<StudentId> = ranked.iter().map(|e| e.student_id).collect();
        assert_eq!(ids, vec![sid(1), sid(2), sid(3), sid(4)]);
        assert_eq!(ranks(&ranked), vec![1, 2, 2, 4]);
    }

    #[test]
    fn test_nan_is_unranked() {
        let ranked = competition_rank([(sid(1), Some(f64::NAN)), (sid(2), Some(10.0))]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].rank, 1);
    }

    #[test]
    fn test_all_tied() {
        let ranked = competition_rank([(sid(1), Some(12.0)), (sid(2), Some(12.0)), (sid(3), Some(12.0))]);
        assert_eq!(ranks(&ranked), vec![1, 1, 1]);
    }

    #[test]
    fn test_progress_guards() {
        assert_eq!(progress(Some(18.0), Some(16.0)), Some(12.5));
        assert_eq!(progress(Some(18.0), Some(0.0)), None);
        assert_eq!(progress(None, Some(16.0)), None);
        assert_eq!(progress(Some(16.0), None), None);
    }

    #[test]
    fn test_overall_progress_uses_academic_order() {
        let m = |n| AcademicMonth::new(n).unwrap();
        // Mehr (first) to Farvardin (later in the school year)
        let scores = [(m(1), Some(15.0)), (m(7), Some(10.0)), (m(9), None)];
        assert_eq!(overall_progress(scores), Some(50.0));
        assert_eq!(overall_progress([(m(7), Some(10.0))]), None);
    }

    #[test]
    fn test_cohort_stats() {
        let ranked = competition_rank([(sid(1), Some(18.0)), (sid(2), Some(15.0)), (sid(3), None)]);
        let stats = CohortStats::new(3, &ranked);
        assert_eq!(stats.total_students, 3);
        assert_eq!(stats.ranked_students, 2);
        assert_eq!(stats.class_average, Some(16.5));

        assert_eq!(CohortStats::new(0, &[]).class_average, None);
    }

    #[test]
    fn test_farvardin_progress_against_esfand() {
        let sheet = build_cohort_sheet(
            SchoolYear(1403),
            MATH,
            "Mathematics".into(),
            vec![member(1, record(&[(12, 16.0), (1, 18.0)]))],
        );

        let row = &sheet.rows[0];
        assert_eq!(row.months[&month(1)].progress, Some(12.5));
        // Bahman is empty
        assert_eq!(row.months[&month(12)].progress, None);
        assert_eq!(row.overall_progress, Some(12.5));
    }

    #[test]
    fn test_close_scores_rank_alike_on_sheet_and_class_ranking() {
        let first = record(&[(7, 16.664)]);
        let second = record(&[(7, 16.6649)]);

        let sheet = build_cohort_sheet(
            SchoolYear(1403),
            MATH,
            "Mathematics".into(),
            vec![member(1, first.clone()), member(2, second.clone())],
        );
        assert_eq!(sheet.ranks.year_average[&sid(2)], 1);
        assert_eq!(sheet.ranks.year_average[&sid(1)], 2);

        let reports = vec![
            compose_report(sid(1), "student 1".into(), SchoolYear(1403), vec![first]),
            compose_report(sid(2), "student 2".into(), SchoolYear(1403), vec![second]),
        ];
        let expected = vec![(sid(2), 1), (sid(1), 2)];
        let by_rank = |entries: &[RankEntry]| -> Vec<(StudentId, u32)> {
            entries.iter().map(|e| (e.student_id, e.rank)).collect()
        };

        for scope in [None, Some(month(7))] {
            let ranking = rank_class(SchoolYear(1403), scope, &reports);
            assert_eq!(by_rank(&ranking.overall), expected);
            assert_eq!(by_rank(&ranking.courses[&MATH].rankings), expected);
            assert!(ranking.overall.iter().all(|e| e.score == 16.66));
        }
    }

    #[test]
    fn test_rank_class_for_one_month() {
        let reports = vec![
            compose_report(
                sid(1),
                "student 1".into(),
                SchoolYear(1403),
                vec![record(&[(7, 20.0), (8, 12.0)])],
            ),
            compose_report(
                sid(2),
                "student 2".into(),
                SchoolYear(1403),
                vec![record(&[(7, 14.0), (8, 15.0)])],
            ),
            compose_report(sid(3), "student 3".into(), SchoolYear(1403), vec![record(&[(7, 18.0)])]),
        ];

        let year = rank_class(SchoolYear(1403), None, &reports);
        assert_eq!(year.month, None);
        assert_eq!(year.overall[0].student_id, sid(3));

        let aban = rank_class(SchoolYear(1403), Some(month(8)), &reports);
        assert_eq!(aban.month, Some(month(8)));
        assert_eq!(aban.overall.len(), 2);
        assert_eq!(aban.overall[0].student_id, sid(2));
        assert_eq!(aban.overall[0].score, 15.0);
        assert_eq!(aban.overall[1].student_id, sid(1));
        assert_eq!(aban.stats.ranked_students, 2);
        assert_eq!(aban.stats.class_average, Some(13.5));
        assert_eq!(aban.courses[&MATH].rankings.len(), 2);
    }
}
