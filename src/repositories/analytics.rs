use sqlx::PgPool;

use crate::db::models::StudentAnalytics;
use crate::services::analytics::AnalyticsSnapshot;

const COLUMNS: &str = "\
    id, student_id, course_id, lessons_completed, completion_percentage, \
    average_score, total_time_spent, current_streak, longest_streak, \
    engagement_score, risk_level, last_activity, updated_at";

pub(crate) async fn find_for_student_course(
    pool: &PgPool,
    student_id: &str,
    course_id: &str,
) -> Result<Option<StudentAnalytics>, sqlx::Error> {
    sqlx::query_as::<_, StudentAnalytics>(&format!(
        "SELECT {COLUMNS} FROM student_analytics WHERE student_id = $1 AND course_id = $2"
    ))
    .bind(student_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_for_course(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<StudentAnalytics>, sqlx::Error> {
    sqlx::query_as::<_, StudentAnalytics>(&format!(
        "SELECT {COLUMNS} FROM student_analytics
         WHERE course_id = $1
         ORDER BY engagement_score ASC"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_for_students_course(
    pool: &PgPool,
    student_ids: &[String],
    course_id: &str,
) -> Result<Vec<StudentAnalytics>, sqlx::Error> {
    sqlx::query_as::<_, StudentAnalytics>(&format!(
        "SELECT {COLUMNS} FROM student_analytics
         WHERE student_id = ANY($1) AND course_id = $2
         ORDER BY engagement_score ASC"
    ))
    .bind(student_ids)
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct UpsertAnalytics<'a> {
    pub id: &'a str,
    pub student_id: &'a str,
    pub course_id: &'a str,
    pub snapshot: &'a AnalyticsSnapshot,
    pub last_activity: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn upsert(
    pool: &PgPool,
    params: UpsertAnalytics<'_>,
) -> Result<StudentAnalytics, sqlx::Error> {
    sqlx::query_as::<_, StudentAnalytics>(&format!(
        "INSERT INTO student_analytics (
            id, student_id, course_id, lessons_completed, completion_percentage,
            average_score, total_time_spent, current_streak, longest_streak,
            engagement_score, risk_level, last_activity, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)
        ON CONFLICT (student_id, course_id) DO UPDATE SET
            lessons_completed = EXCLUDED.lessons_completed,
            completion_percentage = EXCLUDED.completion_percentage,
            average_score = EXCLUDED.average_score,
            total_time_spent = EXCLUDED.total_time_spent,
            current_streak = EXCLUDED.current_streak,
            longest_streak = EXCLUDED.longest_streak,
            engagement_score = EXCLUDED.engagement_score,
            risk_level = EXCLUDED.risk_level,
            last_activity = EXCLUDED.last_activity,
            updated_at = EXCLUDED.updated_at
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.course_id)
    .bind(params.snapshot.lessons_completed)
    .bind(params.snapshot.completion_percentage)
    .bind(params.snapshot.average_score)
    .bind(params.snapshot.total_time_spent)
    .bind(params.snapshot.current_streak)
    .bind(params.snapshot.longest_streak)
    .bind(params.snapshot.engagement_score)
    .bind(params.snapshot.risk_level)
    .bind(params.last_activity)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}
