use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{
    CourseStatus, DiscountType, EnrollmentStatus, GradeLetter, LessonKind, ProgressStatus,
    ReviewStatus, RiskLevel, SubmissionStatus, UserRole,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) hashed_password: String,
    pub(crate) full_name: String,
    pub(crate) role: UserRole,
    pub(crate) is_active: bool,
    pub(crate) enrolled_courses_count: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Course {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) instructor_id: String,
    pub(crate) status: CourseStatus,
    pub(crate) is_free: bool,
    pub(crate) price: f64,
    pub(crate) max_students: Option<i32>,
    pub(crate) total_lessons: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Lesson {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) kind: LessonKind,
    pub(crate) order_index: i32,
    pub(crate) tier_1_deadline: Option<PrimitiveDateTime>,
    pub(crate) tier_2_deadline: Option<PrimitiveDateTime>,
    pub(crate) tier_3_deadline: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Enrollment {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) course_id: String,
    pub(crate) status: EnrollmentStatus,
    pub(crate) amount_paid: f64,
    pub(crate) enrolled_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Coupon {
    pub(crate) id: String,
    pub(crate) code: String,
    pub(crate) discount_type: DiscountType,
    pub(crate) discount_value: f64,
    pub(crate) max_uses: i32,
    pub(crate) used_count: i32,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct LessonProgress {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) lesson_id: String,
    pub(crate) status: ProgressStatus,
    pub(crate) progress_percentage: f64,
    pub(crate) score: Option<f64>,
    pub(crate) max_score: Option<f64>,
    pub(crate) time_spent_seconds: i64,
    pub(crate) first_accessed: PrimitiveDateTime,
    pub(crate) last_accessed: PrimitiveDateTime,
    pub(crate) completed_at: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AssignmentSubmission {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) lesson_id: String,
    pub(crate) submission_text: String,
    pub(crate) attachments: Json<Vec<String>>,
    pub(crate) status: SubmissionStatus,
    pub(crate) submitted_at: Option<PrimitiveDateTime>,
    pub(crate) graded_at: Option<PrimitiveDateTime>,
    pub(crate) score: Option<f64>,
    pub(crate) max_score: Option<f64>,
    pub(crate) percentage: Option<f64>,
    pub(crate) passed: Option<bool>,
    pub(crate) grade: Option<GradeLetter>,
    pub(crate) instructor_feedback: Option<String>,
    pub(crate) tier_1_deadline: Option<PrimitiveDateTime>,
    pub(crate) tier_2_deadline: Option<PrimitiveDateTime>,
    pub(crate) tier_3_deadline: Option<PrimitiveDateTime>,
    pub(crate) applied_tier: Option<i16>,
    pub(crate) tier_cap_percentage: Option<f64>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct StudentAnalytics {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) course_id: String,
    pub(crate) lessons_completed: i32,
    pub(crate) completion_percentage: f64,
    pub(crate) average_score: Option<f64>,
    pub(crate) total_time_spent: i64,
    pub(crate) current_streak: i32,
    pub(crate) longest_streak: i32,
    pub(crate) engagement_score: i32,
    pub(crate) risk_level: RiskLevel,
    pub(crate) last_activity: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Cohort {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) name: String,
    pub(crate) mentor_id: Option<String>,
    pub(crate) reviewers_per_submission: i32,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CohortMember {
    pub(crate) id: String,
    pub(crate) cohort_id: String,
    pub(crate) student_id: String,
    pub(crate) joined_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct PeerReviewAssignment {
    pub(crate) id: String,
    pub(crate) submission_id: String,
    pub(crate) reviewer_id: String,
    pub(crate) status: ReviewStatus,
    pub(crate) rubric_scores: Json<HashMap<String, f64>>,
    pub(crate) total_score: Option<f64>,
    pub(crate) feedback: Option<String>,
    pub(crate) assigned_at: PrimitiveDateTime,
    pub(crate) completed_at: Option<PrimitiveDateTime>,
}
