use sqlx::PgPool;

use crate::db::models::Enrollment;
use crate::db::types::EnrollmentStatus;

const COLUMNS: &str = "id, student_id, course_id, status, amount_paid, enrolled_at";

pub(crate) async fn find_for_student_course(
    pool: &PgPool,
    student_id: &str,
    course_id: &str,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM enrollments WHERE student_id = $1 AND course_id = $2"
    ))
    .bind(student_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM enrollments WHERE student_id = $1 ORDER BY enrolled_at DESC"
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_active_for_course(
    pool: &PgPool,
    course_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM enrollments WHERE course_id = $1 AND status = $2",
    )
    .bind(course_id)
    .bind(EnrollmentStatus::Active)
    .fetch_one(pool)
    .await
}

pub(crate) async fn mark_completed(
    pool: &PgPool,
    student_id: &str,
    course_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE enrollments SET status = $1 WHERE student_id = $2 AND course_id = $3",
    )
    .bind(EnrollmentStatus::Completed)
    .bind(student_id)
    .bind(course_id)
    .execute(pool)
    .await?;
    Ok(())
}
