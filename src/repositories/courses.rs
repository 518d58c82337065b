use sqlx::PgPool;

use crate::db::models::{Course, Lesson};

const COLUMNS: &str = "\
    id, title, instructor_id, status, is_free, price, max_students, \
    total_lessons, created_at, updated_at";

const LESSON_COLUMNS: &str = "\
    id, course_id, title, kind, order_index, \
    tier_1_deadline, tier_2_deadline, tier_3_deadline, created_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COLUMNS} FROM courses WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_for_instructor(
    pool: &PgPool,
    instructor_id: &str,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COLUMNS} FROM courses WHERE instructor_id = $1 ORDER BY created_at DESC"
    ))
    .bind(instructor_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_lesson(
    pool: &PgPool,
    lesson_id: &str,
) -> Result<Option<Lesson>, sqlx::Error> {
    sqlx::query_as::<_, Lesson>(&format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = $1"))
        .bind(lesson_id)
        .fetch_optional(pool)
        .await
}
