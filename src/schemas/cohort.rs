use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Cohort, PeerReviewAssignment};
use crate::db::types::ReviewStatus;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CohortCreateRequest {
    pub(crate) course_id: String,
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) mentor_id: Option<String>,
    #[serde(default = "default_reviewers_per_submission")]
    #[validate(range(min = 1, message = "reviewers_per_submission must be positive"))]
    pub(crate) reviewers_per_submission: i32,
}

fn default_reviewers_per_submission() -> i32 {
    3
}

#[derive(Debug, Deserialize)]
pub(crate) struct CohortMemberRequest {
    pub(crate) student_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignReviewersRequest {
    pub(crate) submission_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ReviewSubmitRequest {
    #[validate(length(min = 1, message = "rubric_scores must not be empty"))]
    pub(crate) rubric_scores: HashMap<String, f64>,
    #[serde(default)]
    pub(crate) feedback: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CohortResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) name: String,
    pub(crate) mentor_id: Option<String>,
    pub(crate) reviewers_per_submission: i32,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

impl CohortResponse {
    pub(crate) fn from_db(cohort: Cohort) -> Self {
        Self {
            id: cohort.id,
            course_id: cohort.course_id,
            name: cohort.name,
            mentor_id: cohort.mentor_id,
            reviewers_per_submission: cohort.reviewers_per_submission,
            is_active: cohort.is_active,
            created_at: format_primitive(cohort.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PeerReviewResponse {
    pub(crate) id: String,
    pub(crate) submission_id: String,
    pub(crate) reviewer_id: String,
    pub(crate) status: ReviewStatus,
    pub(crate) rubric_scores: HashMap<String, f64>,
    pub(crate) total_score: Option<f64>,
    pub(crate) feedback: Option<String>,
    pub(crate) assigned_at: String,
    pub(crate) completed_at: Option<String>,
}

impl PeerReviewResponse {
    pub(crate) fn from_db(review: PeerReviewAssignment) -> Self {
        Self {
            id: review.id,
            submission_id: review.submission_id,
            reviewer_id: review.reviewer_id,
            status: review.status,
            rubric_scores: review.rubric_scores.0,
            total_score: review.total_score,
            feedback: review.feedback,
            assigned_at: format_primitive(review.assigned_at),
            completed_at: review.completed_at.map(format_primitive),
        }
    }
}
