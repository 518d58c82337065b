use sqlx::PgPool;

use crate::db::models::AssignmentSubmission;
use crate::db::types::{GradeLetter, SubmissionStatus};

const COLUMNS: &str = "\
    id, student_id, lesson_id, submission_text, attachments, status, \
    submitted_at, graded_at, score, max_score, percentage, passed, grade, \
    instructor_feedback, tier_1_deadline, tier_2_deadline, tier_3_deadline, \
    applied_tier, tier_cap_percentage, created_at, updated_at";

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<AssignmentSubmission>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "SELECT {COLUMNS} FROM assignment_submissions WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_for_student_lesson(
    pool: &PgPool,
    student_id: &str,
    lesson_id: &str,
) -> Result<Option<AssignmentSubmission>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "SELECT {COLUMNS} FROM assignment_submissions WHERE student_id = $1 AND lesson_id = $2"
    ))
    .bind(student_id)
    .bind(lesson_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_pending_for_course(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<AssignmentSubmission>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(
        "SELECT s.id, s.student_id, s.lesson_id, s.submission_text, s.attachments,
                s.status, s.submitted_at, s.graded_at, s.score, s.max_score,
                s.percentage, s.passed, s.grade, s.instructor_feedback,
                s.tier_1_deadline, s.tier_2_deadline, s.tier_3_deadline,
                s.applied_tier, s.tier_cap_percentage, s.created_at, s.updated_at
         FROM assignment_submissions s
         JOIN lessons l ON l.id = s.lesson_id
         WHERE l.course_id = $1 AND s.status = $2
         ORDER BY s.submitted_at",
    )
    .bind(course_id)
    .bind(SubmissionStatus::Submitted)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateDraft<'a> {
    pub id: &'a str,
    pub student_id: &'a str,
    pub lesson_id: &'a str,
    pub submission_text: &'a str,
    pub attachments: &'a [String],
    pub now: time::PrimitiveDateTime,
}

pub(crate) async fn create_draft(
    pool: &PgPool,
    params: CreateDraft<'_>,
) -> Result<AssignmentSubmission, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "INSERT INTO assignment_submissions (
            id, student_id, lesson_id, submission_text, attachments, status,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.lesson_id)
    .bind(params.submission_text)
    .bind(sqlx::types::Json(params.attachments.to_vec()))
    .bind(SubmissionStatus::Draft)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn update_draft_text(
    pool: &PgPool,
    id: &str,
    submission_text: &str,
    attachments: &[String],
    now: time::PrimitiveDateTime,
) -> Result<AssignmentSubmission, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "UPDATE assignment_submissions
         SET submission_text = $2, attachments = $3, updated_at = $4
         WHERE id = $1
         RETURNING {COLUMNS}",
    ))
    .bind(id)
    .bind(submission_text)
    .bind(sqlx::types::Json(attachments.to_vec()))
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) struct MarkSubmitted<'a> {
    pub id: &'a str,
    pub tier_1_deadline: Option<time::PrimitiveDateTime>,
    pub tier_2_deadline: Option<time::PrimitiveDateTime>,
    pub tier_3_deadline: Option<time::PrimitiveDateTime>,
    pub applied_tier: i16,
    pub tier_cap_percentage: f64,
    pub now: time::PrimitiveDateTime,
}

/// The tier is resolved once at submission time and frozen on the row;
/// grading later reads the stored cap instead of re-resolving.
pub(crate) async fn mark_submitted(
    pool: &PgPool,
    params: MarkSubmitted<'_>,
) -> Result<AssignmentSubmission, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "UPDATE assignment_submissions
         SET status = $2, submitted_at = $3,
             tier_1_deadline = $4, tier_2_deadline = $5, tier_3_deadline = $6,
             applied_tier = $7, tier_cap_percentage = $8, updated_at = $3
         WHERE id = $1
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(SubmissionStatus::Submitted)
    .bind(params.now)
    .bind(params.tier_1_deadline)
    .bind(params.tier_2_deadline)
    .bind(params.tier_3_deadline)
    .bind(params.applied_tier)
    .bind(params.tier_cap_percentage)
    .fetch_one(pool)
    .await
}

pub(crate) struct ApplyGrade<'a> {
    pub id: &'a str,
    pub score: f64,
    pub max_score: f64,
    pub percentage: Option<f64>,
    pub passed: Option<bool>,
    pub grade: Option<GradeLetter>,
    pub instructor_feedback: Option<&'a str>,
    pub mark_graded: bool,
    pub now: time::PrimitiveDateTime,
}

/// Writes a grading outcome. With `mark_graded` false the score fields are
/// recorded but the row stays in its current status (the ungraded path for a
/// zero max score).
pub(crate) async fn apply_grade(
    pool: &PgPool,
    params: ApplyGrade<'_>,
) -> Result<AssignmentSubmission, sqlx::Error> {
    if params.mark_graded {
        sqlx::query_as::<_, AssignmentSubmission>(&format!(
            "UPDATE assignment_submissions
             SET score = $2, max_score = $3, percentage = $4, passed = $5, grade = $6,
                 instructor_feedback = COALESCE($7, instructor_feedback),
                 status = $8, graded_at = $9, updated_at = $9
             WHERE id = $1
             RETURNING {COLUMNS}",
        ))
        .bind(params.id)
        .bind(params.score)
        .bind(params.max_score)
        .bind(params.percentage)
        .bind(params.passed)
        .bind(params.grade)
        .bind(params.instructor_feedback)
        .bind(SubmissionStatus::Graded)
        .bind(params.now)
        .fetch_one(pool)
        .await
    } else {
        sqlx::query_as::<_, AssignmentSubmission>(&format!(
            "UPDATE assignment_submissions
             SET score = $2, max_score = $3, percentage = $4, passed = $5, grade = $6,
                 instructor_feedback = COALESCE($7, instructor_feedback),
                 updated_at = $8
             WHERE id = $1
             RETURNING {COLUMNS}",
        ))
        .bind(params.id)
        .bind(params.score)
        .bind(params.max_score)
        .bind(params.percentage)
        .bind(params.passed)
        .bind(params.grade)
        .bind(params.instructor_feedback)
        .bind(params.now)
        .fetch_one(pool)
        .await
    }
}

pub(crate) async fn mark_returned(
    pool: &PgPool,
    id: &str,
    instructor_feedback: Option<&str>,
    now: time::PrimitiveDateTime,
) -> Result<AssignmentSubmission, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "UPDATE assignment_submissions
         SET status = $2, instructor_feedback = COALESCE($3, instructor_feedback),
             updated_at = $4
         WHERE id = $1
         RETURNING {COLUMNS}",
    ))
    .bind(id)
    .bind(SubmissionStatus::Returned)
    .bind(instructor_feedback)
    .bind(now)
    .fetch_one(pool)
    .await
}
