use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{self, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::{ReviewStatus, SubmissionStatus};
use crate::repositories;
use crate::schemas::cohort::{
    AssignReviewersRequest, CohortCreateRequest, CohortMemberRequest, CohortResponse,
    PeerReviewResponse, ReviewSubmitRequest,
};
use crate::services::peer_review;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_cohort))
        .route("/:id/members", post(add_member))
        .route("/:id/assign-reviewers", post(assign_reviewers))
        .route("/reviews/assigned", get(assigned_reviews))
        .route("/reviews/:id", post(submit_review))
}

async fn create_cohort(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CohortCreateRequest>,
) -> Result<(StatusCode, Json<CohortResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    guards::require_course_instructor(&state, &user, &payload.course_id).await?;

    let cohort = repositories::cohorts::create(
        state.db(),
        repositories::cohorts::CreateCohort {
            id: &Uuid::new_v4().to_string(),
            course_id: &payload.course_id,
            name: &payload.name,
            mentor_id: payload.mentor_id.as_deref(),
            reviewers_per_submission: payload.reviewers_per_submission,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::Conflict("Cohort with this name already exists".to_string())
        }
        other => ApiError::internal(other, "Failed to create cohort"),
    })?;

    Ok((StatusCode::CREATED, Json(CohortResponse::from_db(cohort))))
}

async fn add_member(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<CohortMemberRequest>,
) -> Result<StatusCode, ApiError> {
    let cohort = repositories::cohorts::find_by_id(state.db(), &id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch cohort"))?
        .ok_or_else(|| ApiError::NotFound("Cohort not found".to_string()))?;

    guards::require_course_instructor(&state, &user, &cohort.course_id).await?;

    let enrolled = repositories::enrollments::find_for_student_course(
        state.db(),
        &payload.student_id,
        &cohort.course_id,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to fetch enrollment"))?;
    if enrolled.is_none() {
        return Err(ApiError::BadRequest(
            "Student is not enrolled in the cohort's course".to_string(),
        ));
    }

    repositories::cohorts::add_member(state.db(), &id, &payload.student_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to add cohort member"))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Distributes a submitted assignment to cohort peers, preferring reviewers
/// with the fewest open reviews.
async fn assign_reviewers(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<AssignReviewersRequest>,
) -> Result<Json<Vec<PeerReviewResponse>>, ApiError> {
    let cohort = guards::require_cohort_mentor(&state, &user, &id).await?;

    let submission_id = payload.submission_id;
    let submission = repositories::submissions::find_by_id(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    if submission.status == SubmissionStatus::Draft {
        return Err(ApiError::Conflict("Cannot review a draft submission".to_string()));
    }

    let members = repositories::cohorts::member_ids(state.db(), &cohort.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch cohort members"))?;
    if !members.contains(&submission.student_id) {
        return Err(ApiError::BadRequest("Submission is not from this cohort".to_string()));
    }

    let existing = repositories::peer_reviews::list_for_submission(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch peer reviews"))?;
    let already_assigned: Vec<String> =
        existing.iter().map(|review| review.reviewer_id.clone()).collect();

    let open_counts =
        repositories::peer_reviews::open_counts_for_reviewers(state.db(), &members)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count open reviews"))?;
    let candidates: Vec<(String, i64)> = members
        .into_iter()
        .map(|member| {
            let open = open_counts.get(&member).copied().unwrap_or(0);
            (member, open)
        })
        .collect();

    let chosen = peer_review::select_reviewers(
        &candidates,
        &submission.student_id,
        &already_assigned,
        cohort.reviewers_per_submission - existing.len() as i32,
    );

    let now = primitive_now_utc();
    let mut assigned = Vec::with_capacity(chosen.len());
    for reviewer_id in &chosen {
        let review =
            repositories::peer_reviews::assign(state.db(), &submission_id, reviewer_id, now)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to assign reviewer"))?;
        assigned.push(PeerReviewResponse::from_db(review));
    }

    tracing::info!(
        submission_id = %submission_id,
        cohort_id = %cohort.id,
        assigned = assigned.len(),
        "Peer reviewers assigned"
    );

    Ok(Json(assigned))
}

async fn assigned_reviews(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<PeerReviewResponse>>, ApiError> {
    let reviews = repositories::peer_reviews::list_for_reviewer(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assigned reviews"))?;

    Ok(Json(reviews.into_iter().map(PeerReviewResponse::from_db).collect()))
}

async fn submit_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<ReviewSubmitRequest>,
) -> Result<Json<PeerReviewResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let review = repositories::peer_reviews::find_by_id(state.db(), &id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch review"))?
        .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))?;

    if review.reviewer_id != user.id {
        return Err(ApiError::Forbidden("Not your review assignment"));
    }
    if review.status == ReviewStatus::Completed {
        return Err(ApiError::Conflict("Review has already been completed".to_string()));
    }

    let total_score = peer_review::rubric_total(&payload.rubric_scores);
    let review = repositories::peer_reviews::complete(
        state.db(),
        repositories::peer_reviews::CompleteReview {
            id: &id,
            rubric_scores: &payload.rubric_scores,
            total_score,
            feedback: payload.feedback.as_deref(),
            completed_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to complete review"))?;

    Ok(Json(PeerReviewResponse::from_db(review)))
}
