use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::PeerReviewAssignment;
use crate::db::types::ReviewStatus;

const COLUMNS: &str = "\
    id, submission_id, reviewer_id, status, rubric_scores, total_score, \
    feedback, assigned_at, completed_at";

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<PeerReviewAssignment>, sqlx::Error> {
    sqlx::query_as::<_, PeerReviewAssignment>(&format!(
        "SELECT {COLUMNS} FROM peer_review_assignments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_for_submission(
    pool: &PgPool,
    submission_id: &str,
) -> Result<Vec<PeerReviewAssignment>, sqlx::Error> {
    sqlx::query_as::<_, PeerReviewAssignment>(&format!(
        "SELECT {COLUMNS} FROM peer_review_assignments
         WHERE submission_id = $1
         ORDER BY assigned_at"
    ))
    .bind(submission_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_for_reviewer(
    pool: &PgPool,
    reviewer_id: &str,
) -> Result<Vec<PeerReviewAssignment>, sqlx::Error> {
    sqlx::query_as::<_, PeerReviewAssignment>(&format!(
        "SELECT {COLUMNS} FROM peer_review_assignments
         WHERE reviewer_id = $1 AND status <> $2
         ORDER BY assigned_at"
    ))
    .bind(reviewer_id)
    .bind(ReviewStatus::Completed)
    .fetch_all(pool)
    .await
}

/// Open review counts per reviewer, for load-balanced assignment.
pub(crate) async fn open_counts_for_reviewers(
    pool: &PgPool,
    reviewer_ids: &[String],
) -> Result<HashMap<String, i64>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT reviewer_id, COUNT(*)
         FROM peer_review_assignments
         WHERE reviewer_id = ANY($1) AND status <> $2
         GROUP BY reviewer_id",
    )
    .bind(reviewer_ids)
    .bind(ReviewStatus::Completed)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().collect())
}

pub(crate) async fn assign(
    pool: &PgPool,
    submission_id: &str,
    reviewer_id: &str,
    assigned_at: time::PrimitiveDateTime,
) -> Result<PeerReviewAssignment, sqlx::Error> {
    sqlx::query_as::<_, PeerReviewAssignment>(&format!(
        "INSERT INTO peer_review_assignments (
            id, submission_id, reviewer_id, status, rubric_scores, assigned_at
        ) VALUES ($1,$2,$3,$4,'{{}}',$5)
        RETURNING {COLUMNS}",
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(submission_id)
    .bind(reviewer_id)
    .bind(ReviewStatus::Pending)
    .bind(assigned_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct CompleteReview<'a> {
    pub id: &'a str,
    pub rubric_scores: &'a HashMap<String, f64>,
    pub total_score: f64,
    pub feedback: Option<&'a str>,
    pub completed_at: time::PrimitiveDateTime,
}

pub(crate) async fn complete(
    pool: &PgPool,
    params: CompleteReview<'_>,
) -> Result<PeerReviewAssignment, sqlx::Error> {
    sqlx::query_as::<_, PeerReviewAssignment>(&format!(
        "UPDATE peer_review_assignments
         SET status = $2, rubric_scores = $3, total_score = $4, feedback = $5,
             completed_at = $6
         WHERE id = $1
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(ReviewStatus::Completed)
    .bind(sqlx::types::Json(params.rubric_scores))
    .bind(params.total_score)
    .bind(params.feedback)
    .bind(params.completed_at)
    .fetch_one(pool)
    .await
}
