use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{Cohort, CohortMember};

const COLUMNS: &str = "\
    id, course_id, name, mentor_id, reviewers_per_submission, is_active, created_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Cohort>, sqlx::Error> {
    sqlx::query_as::<_, Cohort>(&format!("SELECT {COLUMNS} FROM cohorts WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_for_student_course(
    pool: &PgPool,
    student_id: &str,
    course_id: &str,
) -> Result<Option<Cohort>, sqlx::Error> {
    sqlx::query_as::<_, Cohort>(
        "SELECT c.id, c.course_id, c.name, c.mentor_id, c.reviewers_per_submission,
                c.is_active, c.created_at
         FROM cohorts c
         JOIN cohort_members m ON m.cohort_id = c.id
         WHERE m.student_id = $1 AND c.course_id = $2 AND c.is_active",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_for_mentor(
    pool: &PgPool,
    mentor_id: &str,
) -> Result<Vec<Cohort>, sqlx::Error> {
    sqlx::query_as::<_, Cohort>(&format!(
        "SELECT {COLUMNS} FROM cohorts WHERE mentor_id = $1 AND is_active ORDER BY created_at"
    ))
    .bind(mentor_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateCohort<'a> {
    pub id: &'a str,
    pub course_id: &'a str,
    pub name: &'a str,
    pub mentor_id: Option<&'a str>,
    pub reviewers_per_submission: i32,
    pub created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateCohort<'_>) -> Result<Cohort, sqlx::Error> {
    sqlx::query_as::<_, Cohort>(&format!(
        "INSERT INTO cohorts (
            id, course_id, name, mentor_id, reviewers_per_submission, is_active, created_at
        ) VALUES ($1,$2,$3,$4,$5,TRUE,$6)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.name)
    .bind(params.mentor_id)
    .bind(params.reviewers_per_submission)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn add_member(
    pool: &PgPool,
    cohort_id: &str,
    student_id: &str,
    joined_at: time::PrimitiveDateTime,
) -> Result<CohortMember, sqlx::Error> {
    sqlx::query_as::<_, CohortMember>(
        "INSERT INTO cohort_members (id, cohort_id, student_id, joined_at)
         VALUES ($1,$2,$3,$4)
         ON CONFLICT (cohort_id, student_id) DO UPDATE SET joined_at = cohort_members.joined_at
         RETURNING id, cohort_id, student_id, joined_at",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(cohort_id)
    .bind(student_id)
    .bind(joined_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn member_ids(pool: &PgPool, cohort_id: &str) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT student_id FROM cohort_members WHERE cohort_id = $1 ORDER BY student_id",
    )
    .bind(cohort_id)
    .fetch_all(pool)
    .await
}
