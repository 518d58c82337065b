use std::collections::BTreeSet;

use anyhow::{anyhow, Context, Result};
use sqlx::PgPool;
use time::{Date, PrimitiveDateTime};
use uuid::Uuid;

use crate::db::models::{LessonProgress, StudentAnalytics};
use crate::db::types::{ProgressStatus, RiskLevel};
use crate::repositories;
use crate::services::engagement;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AnalyticsSnapshot {
    pub(crate) lessons_completed: i32,
    pub(crate) completion_percentage: f64,
    pub(crate) average_score: Option<f64>,
    pub(crate) total_time_spent: i64,
    pub(crate) current_streak: i32,
    pub(crate) longest_streak: i32,
    pub(crate) engagement_score: i32,
    pub(crate) risk_level: RiskLevel,
}

/// Recomputes a student's per-course analytics from the full set of their
/// progress rows. Not incremental: the same rows always produce the same
/// snapshot.
pub(crate) fn compute_snapshot(
    rows: &[LessonProgress],
    total_lessons: i32,
    today: Date,
) -> AnalyticsSnapshot {
    let lessons_completed =
        rows.iter().filter(|row| row.status == ProgressStatus::Completed).count() as i32;

    let completion_percentage = if total_lessons > 0 {
        lessons_completed as f64 / total_lessons as f64 * 100.0
    } else {
        0.0
    };

    let scores: Vec<f64> = rows.iter().filter_map(|row| row.score).collect();
    let average_score = if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    };

    let total_time_spent = rows.iter().map(|row| row.time_spent_seconds.max(0)).sum();

    let active_days: BTreeSet<Date> = rows.iter().map(|row| row.last_accessed.date()).collect();
    let (current_streak, longest_streak) = streaks(&active_days, today);

    let engagement_score = engagement::engagement_score(
        completion_percentage,
        average_score,
        current_streak,
        total_time_spent,
    );
    let risk_level = engagement::classify_risk(completion_percentage, engagement_score);

    AnalyticsSnapshot {
        lessons_completed,
        completion_percentage,
        average_score,
        total_time_spent,
        current_streak,
        longest_streak,
        engagement_score,
        risk_level,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CourseRollup {
    pub(crate) completion_rate: f64,
    pub(crate) average_score: Option<f64>,
    pub(crate) struggling_students: usize,
}

/// Course-wide rollup across every enrolled student's snapshot. Completion
/// rate is the share of students who finished the course; struggling
/// students sit below 30% completion.
pub(crate) fn course_rollup(stats: &[StudentAnalytics]) -> CourseRollup {
    let completion_rate = if stats.is_empty() {
        0.0
    } else {
        let completed =
            stats.iter().filter(|entry| entry.completion_percentage >= 100.0).count();
        completed as f64 / stats.len() as f64 * 100.0
    };

    let scored: Vec<f64> = stats.iter().filter_map(|entry| entry.average_score).collect();
    let average_score = if scored.is_empty() {
        None
    } else {
        Some(scored.iter().sum::<f64>() / scored.len() as f64)
    };

    let struggling_students =
        stats.iter().filter(|entry| entry.completion_percentage < 30.0).count();

    CourseRollup { completion_rate, average_score, struggling_students }
}

/// Next completion milestone ahead of the student, gone once the course is
/// finished.
pub(crate) fn milestone_for(completion_percentage: f64) -> Option<&'static str> {
    if completion_percentage < 25.0 {
        Some("25% Complete")
    } else if completion_percentage < 50.0 {
        Some("50% Complete")
    } else if completion_percentage < 75.0 {
        Some("75% Complete")
    } else if completion_percentage < 100.0 {
        Some("Course Complete")
    } else {
        None
    }
}

/// Streaks of consecutive active days. The current streak counts back from
/// today, tolerating a not-yet-active today (a streak survives until a full
/// day is missed).
fn streaks(active_days: &BTreeSet<Date>, today: Date) -> (i32, i32) {
    let mut longest = 0i32;
    let mut run = 0i32;
    let mut previous: Option<Date> = None;

    for day in active_days {
        run = match previous {
            Some(prev) if prev.next_day() == Some(*day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(*day);
    }

    let anchor = if active_days.contains(&today) {
        Some(today)
    } else {
        today.previous_day().filter(|yesterday| active_days.contains(yesterday))
    };

    let mut current = 0i32;
    if let Some(mut day) = anchor {
        while active_days.contains(&day) {
            current += 1;
            match day.previous_day() {
                Some(prev) => day = prev,
                None => break,
            }
        }
    }

    (current, longest)
}

/// Loads the student's progress for the course and upserts the recomputed
/// snapshot. Deliberately not serialized against concurrent progress writes;
/// with per-student write rates the last full recompute winning is acceptable.
pub(crate) async fn refresh_student_analytics(
    pool: &PgPool,
    student_id: &str,
    course_id: &str,
    now: PrimitiveDateTime,
) -> Result<AnalyticsSnapshot> {
    let course = repositories::courses::find_by_id(pool, course_id)
        .await
        .context("Failed to fetch course for analytics refresh")?
        .ok_or_else(|| anyhow!("Course not found for analytics refresh"))?;

    let rows = repositories::lesson_progress::list_for_student_course(pool, student_id, course_id)
        .await
        .context("Failed to load progress rows for analytics refresh")?;

    let snapshot = compute_snapshot(&rows, course.total_lessons, now.date());

    repositories::analytics::upsert(
        pool,
        repositories::analytics::UpsertAnalytics {
            id: &Uuid::new_v4().to_string(),
            student_id,
            course_id,
            snapshot: &snapshot,
            last_activity: now,
            updated_at: now,
        },
    )
    .await
    .context("Failed to upsert student analytics")?;

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn progress_row(
        status: ProgressStatus,
        score: Option<f64>,
        time_spent_seconds: i64,
        last_accessed: PrimitiveDateTime,
    ) -> LessonProgress {
        LessonProgress {
            id: Uuid::new_v4().to_string(),
            student_id: "student-1".to_string(),
            lesson_id: Uuid::new_v4().to_string(),
            status,
            progress_percentage: 0.0,
            score,
            max_score: score.map(|_| 100.0),
            time_spent_seconds,
            first_accessed: last_accessed,
            last_accessed,
            completed_at: matches!(status, ProgressStatus::Completed).then_some(last_accessed),
        }
    }

    #[test]
    fn empty_rows_produce_zeroed_critical_snapshot() {
        let snapshot = compute_snapshot(&[], 10, date!(2026 - 03 - 10));
        assert_eq!(snapshot.lessons_completed, 0);
        assert_eq!(snapshot.completion_percentage, 0.0);
        assert_eq!(snapshot.average_score, None);
        assert_eq!(snapshot.engagement_score, 0);
        assert_eq!(snapshot.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn zero_total_lessons_does_not_divide() {
        let rows = vec![progress_row(
            ProgressStatus::Completed,
            Some(90.0),
            600,
            datetime!(2026-03-10 10:00:00),
        )];
        let snapshot = compute_snapshot(&rows, 0, date!(2026 - 03 - 10));
        assert_eq!(snapshot.completion_percentage, 0.0);
    }

    #[test]
    fn snapshot_aggregates_scores_and_time() {
        let rows = vec![
            progress_row(
                ProgressStatus::Completed,
                Some(80.0),
                1800,
                datetime!(2026-03-09 10:00:00),
            ),
            progress_row(
                ProgressStatus::Completed,
                Some(90.0),
                1800,
                datetime!(2026-03-10 10:00:00),
            ),
            progress_row(ProgressStatus::InProgress, None, 600, datetime!(2026-03-10 12:00:00)),
        ];
        let snapshot = compute_snapshot(&rows, 4, date!(2026 - 03 - 10));

        assert_eq!(snapshot.lessons_completed, 2);
        assert_eq!(snapshot.completion_percentage, 50.0);
        assert_eq!(snapshot.average_score, Some(85.0));
        assert_eq!(snapshot.total_time_spent, 4200);
        assert_eq!(snapshot.current_streak, 2);
        assert_eq!(snapshot.longest_streak, 2);
    }

    #[test]
    fn snapshot_is_idempotent_for_same_rows() {
        let rows = vec![progress_row(
            ProgressStatus::Completed,
            Some(75.0),
            1200,
            datetime!(2026-03-08 09:00:00),
        )];
        let first = compute_snapshot(&rows, 5, date!(2026 - 03 - 10));
        let second = compute_snapshot(&rows, 5, date!(2026 - 03 - 10));
        assert_eq!(first, second);
    }

    #[test]
    fn current_streak_broken_by_missed_day() {
        let days: BTreeSet<Date> =
            [date!(2026 - 03 - 05), date!(2026 - 03 - 06), date!(2026 - 03 - 08)]
                .into_iter()
                .collect();
        let (current, longest) = streaks(&days, date!(2026 - 03 - 10));
        assert_eq!(current, 0);
        assert_eq!(longest, 2);
    }

    fn analytics_row(completion_percentage: f64, average_score: Option<f64>) -> StudentAnalytics {
        let now = datetime!(2026 - 03 - 10 12:00);
        StudentAnalytics {
            id: Uuid::new_v4().to_string(),
            student_id: Uuid::new_v4().to_string(),
            course_id: "course-1".to_string(),
            lessons_completed: 0,
            completion_percentage,
            average_score,
            total_time_spent: 0,
            current_streak: 0,
            longest_streak: 0,
            engagement_score: 0,
            risk_level: RiskLevel::Medium,
            last_activity: now,
            updated_at: now,
        }
    }

    #[test]
    fn empty_course_rolls_up_to_zeroes() {
        let rollup = course_rollup(&[]);
        assert_eq!(rollup.completion_rate, 0.0);
        assert_eq!(rollup.average_score, None);
        assert_eq!(rollup.struggling_students, 0);
    }

    #[test]
    fn rollup_counts_finishers_and_strugglers() {
        let stats = [
            analytics_row(100.0, Some(90.0)),
            analytics_row(50.0, Some(70.0)),
            analytics_row(20.0, None),
            analytics_row(10.0, None),
        ];
        let rollup = course_rollup(&stats);
        assert_eq!(rollup.completion_rate, 25.0);
        assert_eq!(rollup.average_score, Some(80.0));
        assert_eq!(rollup.struggling_students, 2);
    }

    #[test]
    fn milestones_point_at_next_quartile() {
        assert_eq!(milestone_for(0.0), Some("25% Complete"));
        assert_eq!(milestone_for(10.0), Some("25% Complete"));
        assert_eq!(milestone_for(25.0), Some("50% Complete"));
        assert_eq!(milestone_for(60.0), Some("75% Complete"));
        assert_eq!(milestone_for(75.0), Some("Course Complete"));
        assert_eq!(milestone_for(100.0), None);
    }

    #[test]
    fn current_streak_counts_back_from_today_or_yesterday() {
        let days: BTreeSet<Date> =
            [date!(2026 - 03 - 08), date!(2026 - 03 - 09), date!(2026 - 03 - 10)]
                .into_iter()
                .collect();
        assert_eq!(streaks(&days, date!(2026 - 03 - 10)), (3, 3));
        // Today has no activity yet: the run ending yesterday still counts.
        assert_eq!(streaks(&days, date!(2026 - 03 - 11)), (3, 3));
        assert_eq!(streaks(&days, date!(2026 - 03 - 12)), (0, 3));
    }
}
