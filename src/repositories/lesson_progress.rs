use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::LessonProgress;
use crate::db::types::ProgressStatus;

const COLUMNS: &str = "\
    id, student_id, lesson_id, status, progress_percentage, score, max_score, \
    time_spent_seconds, first_accessed, last_accessed, completed_at";

pub(crate) async fn find_for_student_lesson(
    pool: &PgPool,
    student_id: &str,
    lesson_id: &str,
) -> Result<Option<LessonProgress>, sqlx::Error> {
    sqlx::query_as::<_, LessonProgress>(&format!(
        "SELECT {COLUMNS} FROM lesson_progress WHERE student_id = $1 AND lesson_id = $2"
    ))
    .bind(student_id)
    .bind(lesson_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_for_student_course(
    pool: &PgPool,
    student_id: &str,
    course_id: &str,
) -> Result<Vec<LessonProgress>, sqlx::Error> {
    sqlx::query_as::<_, LessonProgress>(
        "SELECT lp.id, lp.student_id, lp.lesson_id, lp.status, lp.progress_percentage,
                lp.score, lp.max_score, lp.time_spent_seconds,
                lp.first_accessed, lp.last_accessed, lp.completed_at
         FROM lesson_progress lp
         JOIN lessons l ON l.id = lp.lesson_id
         WHERE lp.student_id = $1 AND l.course_id = $2
         ORDER BY l.order_index",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct ProgressUpsert<'a> {
    pub student_id: &'a str,
    pub lesson_id: &'a str,
    pub status: ProgressStatus,
    pub progress_percentage: f64,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
    pub time_spent_delta: i64,
    pub now: time::PrimitiveDateTime,
}

/// Inserts or advances a progress row. Time spent accumulates; scores and
/// status take the incoming values; first_accessed is written once.
pub(crate) async fn upsert(
    pool: &PgPool,
    params: ProgressUpsert<'_>,
) -> Result<LessonProgress, sqlx::Error> {
    let completed_at =
        matches!(params.status, ProgressStatus::Completed).then_some(params.now);

    sqlx::query_as::<_, LessonProgress>(&format!(
        "INSERT INTO lesson_progress (
            id, student_id, lesson_id, status, progress_percentage, score, max_score,
            time_spent_seconds, first_accessed, last_accessed, completed_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$9,$10)
        ON CONFLICT (student_id, lesson_id) DO UPDATE SET
            status = EXCLUDED.status,
            progress_percentage = EXCLUDED.progress_percentage,
            score = COALESCE(EXCLUDED.score, lesson_progress.score),
            max_score = COALESCE(EXCLUDED.max_score, lesson_progress.max_score),
            time_spent_seconds = lesson_progress.time_spent_seconds + $8,
            last_accessed = EXCLUDED.last_accessed,
            completed_at = COALESCE(lesson_progress.completed_at, EXCLUDED.completed_at)
        RETURNING {COLUMNS}",
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(params.student_id)
    .bind(params.lesson_id)
    .bind(params.status)
    .bind(params.progress_percentage)
    .bind(params.score)
    .bind(params.max_score)
    .bind(params.time_spent_delta.max(0))
    .bind(params.now)
    .bind(completed_at)
    .fetch_one(pool)
    .await
}
