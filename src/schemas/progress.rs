use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{LessonProgress, StudentAnalytics};
use crate::db::types::{ProgressStatus, RiskLevel};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProgressUpdateRequest {
    #[serde(default)]
    pub(crate) status: Option<ProgressStatus>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0, message = "progress_percentage must be in [0, 100]"))]
    pub(crate) progress_percentage: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "score must be non-negative"))]
    pub(crate) score: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "max_score must be non-negative"))]
    pub(crate) max_score: Option<f64>,
    /// Seconds spent since the last update; accumulates server-side.
    #[serde(default)]
    #[validate(range(min = 0, message = "time_spent_seconds must be non-negative"))]
    pub(crate) time_spent_seconds: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProgressResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) lesson_id: String,
    pub(crate) status: ProgressStatus,
    pub(crate) progress_percentage: f64,
    pub(crate) score: Option<f64>,
    pub(crate) max_score: Option<f64>,
    pub(crate) time_spent_seconds: i64,
    pub(crate) first_accessed: String,
    pub(crate) last_accessed: String,
    pub(crate) completed_at: Option<String>,
}

impl ProgressResponse {
    pub(crate) fn from_db(progress: LessonProgress) -> Self {
        Self {
            id: progress.id,
            student_id: progress.student_id,
            lesson_id: progress.lesson_id,
            status: progress.status,
            progress_percentage: progress.progress_percentage,
            score: progress.score,
            max_score: progress.max_score,
            time_spent_seconds: progress.time_spent_seconds,
            first_accessed: format_primitive(progress.first_accessed),
            last_accessed: format_primitive(progress.last_accessed),
            completed_at: progress.completed_at.map(format_primitive),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AnalyticsResponse {
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
    pub(crate) last_activity: String,
}

impl AnalyticsResponse {
    pub(crate) fn from_db(analytics: StudentAnalytics) -> Self {
        Self {
            student_id: analytics.student_id,
            course_id: analytics.course_id,
            lessons_completed: analytics.lessons_completed,
            completion_percentage: analytics.completion_percentage,
            average_score: analytics.average_score,
            total_time_spent: analytics.total_time_spent,
            current_streak: analytics.current_streak,
            longest_streak: analytics.longest_streak,
            engagement_score: analytics.engagement_score,
            risk_level: analytics.risk_level,
            last_activity: format_primitive(analytics.last_activity),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentDashboardEntry {
    pub(crate) course_id: String,
    pub(crate) course_title: String,
    pub(crate) next_milestone: Option<&'static str>,
    pub(crate) analytics: Option<AnalyticsResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentDashboardResponse {
    pub(crate) courses: Vec<StudentDashboardEntry>,
}

#[derive(Debug, Serialize)]
pub(crate) struct InstructorCourseSummary {
    pub(crate) course_id: String,
    pub(crate) course_title: String,
    pub(crate) enrolled_students: i64,
    pub(crate) completion_rate: f64,
    pub(crate) average_score: Option<f64>,
    pub(crate) struggling_students_count: usize,
    pub(crate) pending_submissions: usize,
    pub(crate) at_risk_students: Vec<AnalyticsResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct InstructorDashboardResponse {
    pub(crate) courses: Vec<InstructorCourseSummary>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MentorCohortSummary {
    pub(crate) cohort_id: String,
    pub(crate) cohort_name: String,
    pub(crate) course_id: String,
    pub(crate) members: usize,
    pub(crate) at_risk_students: Vec<AnalyticsResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MentorDashboardResponse {
    pub(crate) cohorts: Vec<MentorCohortSummary>,
}
