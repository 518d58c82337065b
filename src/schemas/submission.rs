use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::AssignmentSubmission;
use crate::db::types::{GradeLetter, SubmissionStatus};

#[derive(Debug, Deserialize)]
pub(crate) struct SubmissionCreateRequest {
    pub(crate) lesson_id: String,
    #[serde(default)]
    pub(crate) submission_text: String,
    #[serde(default)]
    pub(crate) attachments: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmissionUpdateRequest {
    #[serde(default)]
    pub(crate) submission_text: String,
    #[serde(default)]
    pub(crate) attachments: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GradeRequest {
    #[validate(range(min = 0.0, message = "score must be non-negative"))]
    pub(crate) score: f64,
    #[validate(range(min = 0.0, message = "max_score must be non-negative"))]
    pub(crate) max_score: f64,
    #[serde(default)]
    pub(crate) feedback: Option<String>,
    /// Explicit letter override; omitted means the letter is derived from the
    /// capped percentage.
    #[serde(default)]
    pub(crate) grade: Option<GradeLetter>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct OverrideRequest {
    #[validate(range(min = 0.0, message = "score must be non-negative"))]
    pub(crate) score: f64,
    #[validate(range(exclusive_min = 0.0, message = "max_score must be positive"))]
    pub(crate) max_score: f64,
    #[serde(default)]
    pub(crate) feedback: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReturnRequest {
    #[serde(default)]
    pub(crate) feedback: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) lesson_id: String,
    pub(crate) submission_text: String,
    pub(crate) attachments: Vec<String>,
    pub(crate) status: SubmissionStatus,
    pub(crate) submitted_at: Option<String>,
    pub(crate) graded_at: Option<String>,
    pub(crate) score: Option<f64>,
    pub(crate) max_score: Option<f64>,
    pub(crate) percentage: Option<f64>,
    pub(crate) passed: Option<bool>,
    pub(crate) grade: Option<GradeLetter>,
    pub(crate) instructor_feedback: Option<String>,
    pub(crate) applied_tier: Option<i16>,
    pub(crate) tier_cap_percentage: Option<f64>,
    pub(crate) peer_review_average: Option<f64>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl SubmissionResponse {
    pub(crate) fn from_db(
        submission: AssignmentSubmission,
        peer_review_average: Option<f64>,
    ) -> Self {
        Self {
            id: submission.id,
            student_id: submission.student_id,
            lesson_id: submission.lesson_id,
            submission_text: submission.submission_text,
            attachments: submission.attachments.0,
            status: submission.status,
            submitted_at: submission.submitted_at.map(format_primitive),
            graded_at: submission.graded_at.map(format_primitive),
            score: submission.score,
            max_score: submission.max_score,
            percentage: submission.percentage,
            passed: submission.passed,
            grade: submission.grade,
            instructor_feedback: submission.instructor_feedback,
            applied_tier: submission.applied_tier,
            tier_cap_percentage: submission.tier_cap_percentage,
            peer_review_average,
            created_at: format_primitive(submission.created_at),
            updated_at: format_primitive(submission.updated_at),
        }
    }
}
