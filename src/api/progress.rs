use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{self, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{AssignmentSubmission, Lesson, User};
use crate::db::types::{ProgressStatus, RiskLevel, SubmissionStatus, UserRole};
use crate::repositories;
use crate::schemas::progress::{
    AnalyticsResponse, InstructorCourseSummary, InstructorDashboardResponse, MentorCohortSummary,
    MentorDashboardResponse, ProgressResponse, ProgressUpdateRequest, StudentDashboardEntry,
    StudentDashboardResponse,
};
use crate::schemas::submission::{
    GradeRequest, OverrideRequest, ReturnRequest, SubmissionCreateRequest, SubmissionResponse,
    SubmissionUpdateRequest,
};
use crate::services::{analytics, grading, peer_review};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/lessons/:lesson_id", post(update_lesson_progress))
        .route("/assignment-submissions", post(create_submission))
        .route("/assignment-submissions/:id", put(update_submission).get(get_submission))
        .route("/assignment-submissions/:id/submit", post(submit_submission))
        .route("/assignment-submissions/:id/grade", post(grade_submission))
        .route("/assignment-submissions/:id/return", post(return_submission))
        .route("/mentor/submissions/:id/override", post(override_grade))
        .route("/dashboard/student", get(student_dashboard))
        .route("/dashboard/instructor", get(instructor_dashboard))
        .route("/dashboard/mentor", get(mentor_dashboard))
}

async fn fetch_lesson(state: &AppState, lesson_id: &str) -> Result<Lesson, ApiError> {
    repositories::courses::find_lesson(state.db(), lesson_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch lesson"))?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))
}

async fn require_enrollment(
    state: &AppState,
    student_id: &str,
    course_id: &str,
) -> Result<(), ApiError> {
    let enrollment =
        repositories::enrollments::find_for_student_course(state.db(), student_id, course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch enrollment"))?;
    if enrollment.is_none() {
        return Err(ApiError::Forbidden("Enrollment required for this course"));
    }
    Ok(())
}

async fn update_lesson_progress(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(lesson_id): Path<String>,
    Json(payload): Json<ProgressUpdateRequest>,
) -> Result<Json<ProgressResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let lesson = fetch_lesson(&state, &lesson_id).await?;
    require_enrollment(&state, &user.id, &lesson.course_id).await?;

    // Omitted fields keep their stored values; a first touch starts in progress.
    let existing =
        repositories::lesson_progress::find_for_student_lesson(state.db(), &user.id, &lesson_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load lesson progress"))?;
    let status = payload
        .status
        .or_else(|| existing.as_ref().map(|p| p.status))
        .unwrap_or(ProgressStatus::InProgress);
    let progress_percentage = payload
        .progress_percentage
        .or_else(|| existing.as_ref().map(|p| p.progress_percentage))
        .unwrap_or(0.0);

    let now = primitive_now_utc();
    let progress = repositories::lesson_progress::upsert(
        state.db(),
        repositories::lesson_progress::ProgressUpsert {
            student_id: &user.id,
            lesson_id: &lesson_id,
            status,
            progress_percentage,
            score: payload.score,
            max_score: payload.max_score,
            time_spent_delta: payload.time_spent_seconds,
            now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update lesson progress"))?;

    let snapshot =
        analytics::refresh_student_analytics(state.db(), &user.id, &lesson.course_id, now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to refresh analytics"))?;

    if snapshot.completion_percentage >= 100.0 {
        repositories::enrollments::mark_completed(state.db(), &user.id, &lesson.course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to complete enrollment"))?;
    }

    Ok(Json(ProgressResponse::from_db(progress)))
}

async fn create_submission(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<SubmissionCreateRequest>,
) -> Result<(StatusCode, Json<SubmissionResponse>), ApiError> {
    let lesson = fetch_lesson(&state, &payload.lesson_id).await?;
    require_enrollment(&state, &user.id, &lesson.course_id).await?;

    let existing = repositories::submissions::find_for_student_lesson(
        state.db(),
        &user.id,
        &payload.lesson_id,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to check existing submission"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Submission already exists for this lesson".to_string()));
    }

    let submission = repositories::submissions::create_draft(
        state.db(),
        repositories::submissions::CreateDraft {
            id: &Uuid::new_v4().to_string(),
            student_id: &user.id,
            lesson_id: &payload.lesson_id,
            submission_text: &payload.submission_text,
            attachments: &payload.attachments,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create submission"))?;

    Ok((StatusCode::CREATED, Json(SubmissionResponse::from_db(submission, None))))
}

async fn update_submission(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<SubmissionUpdateRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission = fetch_submission(&state, &id).await?;
    if submission.student_id != user.id {
        return Err(ApiError::Forbidden("Not your submission"));
    }
    if submission.status != SubmissionStatus::Draft {
        return Err(ApiError::Conflict("Only draft submissions can be edited".to_string()));
    }

    let submission = repositories::submissions::update_draft_text(
        state.db(),
        &id,
        &payload.submission_text,
        &payload.attachments,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update submission"))?;

    Ok(Json(SubmissionResponse::from_db(submission, None)))
}

async fn submit_submission(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission = fetch_submission(&state, &id).await?;
    if submission.student_id != user.id {
        return Err(ApiError::Forbidden("Not your submission"));
    }
    if submission.status != SubmissionStatus::Draft {
        return Err(ApiError::Conflict("Submission has already been submitted".to_string()));
    }

    let lesson = fetch_lesson(&state, &submission.lesson_id).await?;
    let now = primitive_now_utc();
    let resolution = grading::resolve_tier(
        now,
        lesson.tier_1_deadline,
        lesson.tier_2_deadline,
        lesson.tier_3_deadline,
    );

    let submission = repositories::submissions::mark_submitted(
        state.db(),
        repositories::submissions::MarkSubmitted {
            id: &id,
            tier_1_deadline: lesson.tier_1_deadline,
            tier_2_deadline: lesson.tier_2_deadline,
            tier_3_deadline: lesson.tier_3_deadline,
            applied_tier: resolution.tier,
            tier_cap_percentage: resolution.cap_percentage,
            now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to submit assignment"))?;

    tracing::info!(
        submission_id = %id,
        tier = resolution.tier,
        cap = resolution.cap_percentage,
        "Assignment submitted"
    );

    Ok(Json(SubmissionResponse::from_db(submission, None)))
}

async fn get_submission(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission = fetch_submission(&state, &id).await?;
    authorize_submission_read(&state, &user, &submission).await?;

    let reviews = repositories::peer_reviews::list_for_submission(state.db(), &id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch peer reviews"))?;
    let average = peer_review::average_peer_grade(&reviews);

    Ok(Json(SubmissionResponse::from_db(submission, average)))
}

/// Instructor grading. The percentage is capped by the tier frozen at
/// submission time; a zero max score records the raw score but leaves the
/// submission ungraded.
async fn grade_submission(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<GradeRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let submission = fetch_submission(&state, &id).await?;
    let lesson = fetch_lesson(&state, &submission.lesson_id).await?;
    guards::require_course_instructor(&state, &user, &lesson.course_id).await?;

    if !matches!(submission.status, SubmissionStatus::Submitted | SubmissionStatus::Graded) {
        return Err(ApiError::Conflict(format!(
            "Cannot grade a submission in status {:?}",
            submission.status
        )));
    }

    let now = primitive_now_utc();
    let submission = match grading::grade(
        payload.score,
        payload.max_score,
        submission.tier_cap_percentage,
    ) {
        Some(graded) => repositories::submissions::apply_grade(
            state.db(),
            repositories::submissions::ApplyGrade {
                id: &id,
                score: payload.score,
                max_score: payload.max_score,
                percentage: Some(graded.percentage),
                passed: Some(graded.passed),
                grade: Some(payload.grade.unwrap_or(graded.letter)),
                instructor_feedback: payload.feedback.as_deref(),
                mark_graded: true,
                now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to grade submission"))?,
        None => repositories::submissions::apply_grade(
            state.db(),
            repositories::submissions::ApplyGrade {
                id: &id,
                score: payload.score,
                max_score: payload.max_score,
                percentage: Some(0.0),
                passed: None,
                grade: None,
                instructor_feedback: payload.feedback.as_deref(),
                mark_graded: false,
                now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to record submission score"))?,
    };

    refresh_for_submission(&state, &submission, &lesson).await?;

    Ok(Json(SubmissionResponse::from_db(submission, None)))
}

async fn return_submission(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<ReturnRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission = fetch_submission(&state, &id).await?;
    let lesson = fetch_lesson(&state, &submission.lesson_id).await?;
    guards::require_course_instructor(&state, &user, &lesson.course_id).await?;

    if submission.status != SubmissionStatus::Graded {
        return Err(ApiError::Conflict("Only graded submissions can be returned".to_string()));
    }

    let submission = repositories::submissions::mark_returned(
        state.db(),
        &id,
        payload.feedback.as_deref(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to return submission"))?;

    Ok(Json(SubmissionResponse::from_db(submission, None)))
}

/// Mentor override bypasses the tier cap on purpose: the score is graded with
/// no cap so a mentor can restore credit lost to deadlines.
async fn override_grade(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<OverrideRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let submission = fetch_submission(&state, &id).await?;
    let lesson = fetch_lesson(&state, &submission.lesson_id).await?;
    guards::require_mentor_of_student(&state, &user, &submission.student_id, &lesson.course_id)
        .await?;

    if submission.status == SubmissionStatus::Draft {
        return Err(ApiError::Conflict("Cannot override a draft submission".to_string()));
    }

    let graded = grading::grade(payload.score, payload.max_score, None)
        .ok_or_else(|| ApiError::BadRequest("max_score must be positive".to_string()))?;

    let now = primitive_now_utc();
    let submission = repositories::submissions::apply_grade(
        state.db(),
        repositories::submissions::ApplyGrade {
            id: &id,
            score: payload.score,
            max_score: payload.max_score,
            percentage: Some(graded.percentage),
            passed: Some(graded.passed),
            grade: Some(graded.letter),
            instructor_feedback: payload.feedback.as_deref(),
            mark_graded: true,
            now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to override grade"))?;

    tracing::info!(
        submission_id = %id,
        mentor_id = %user.id,
        percentage = graded.percentage,
        "Grade overridden without tier cap"
    );

    refresh_for_submission(&state, &submission, &lesson).await?;

    Ok(Json(SubmissionResponse::from_db(submission, None)))
}

async fn student_dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<StudentDashboardResponse>, ApiError> {
    let enrollments = repositories::enrollments::list_for_student(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch enrollments"))?;

    let mut courses = Vec::with_capacity(enrollments.len());
    for enrollment in enrollments {
        let course = repositories::courses::find_by_id(state.db(), &enrollment.course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?;
        let Some(course) = course else {
            continue;
        };

        let stats = repositories::analytics::find_for_student_course(
            state.db(),
            &user.id,
            &course.id,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch analytics"))?;

        let completion =
            stats.as_ref().map(|stats| stats.completion_percentage).unwrap_or(0.0);
        let next_milestone = analytics::milestone_for(completion);

        courses.push(StudentDashboardEntry {
            course_id: course.id,
            course_title: course.title,
            next_milestone,
            analytics: stats.map(AnalyticsResponse::from_db),
        });
    }

    Ok(Json(StudentDashboardResponse { courses }))
}

async fn instructor_dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<InstructorDashboardResponse>, ApiError> {
    if !matches!(user.role, UserRole::Instructor | UserRole::Admin) {
        return Err(ApiError::Forbidden("Instructor access required"));
    }

    let owned = repositories::courses::list_for_instructor(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch courses"))?;

    let mut courses = Vec::with_capacity(owned.len());
    for course in owned {
        let enrolled_students =
            repositories::enrollments::count_active_for_course(state.db(), &course.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to count enrollments"))?;

        let pending = repositories::submissions::list_pending_for_course(state.db(), &course.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch pending submissions"))?;

        let stats = repositories::analytics::list_for_course(state.db(), &course.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch course analytics"))?;
        let rollup = analytics::course_rollup(&stats);
        let at_risk_students = stats
            .into_iter()
            .filter(|stats| matches!(stats.risk_level, RiskLevel::High | RiskLevel::Critical))
            .map(AnalyticsResponse::from_db)
            .collect();

        courses.push(InstructorCourseSummary {
            course_id: course.id,
            course_title: course.title,
            enrolled_students,
            completion_rate: rollup.completion_rate,
            average_score: rollup.average_score,
            struggling_students_count: rollup.struggling_students,
            pending_submissions: pending.len(),
            at_risk_students,
        });
    }

    Ok(Json(InstructorDashboardResponse { courses }))
}

async fn mentor_dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MentorDashboardResponse>, ApiError> {
    if !matches!(user.role, UserRole::Mentor | UserRole::Admin) {
        return Err(ApiError::Forbidden("Mentor access required"));
    }

    let assigned = repositories::cohorts::list_for_mentor(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch cohorts"))?;

    let mut cohorts = Vec::with_capacity(assigned.len());
    for cohort in assigned {
        let members = repositories::cohorts::member_ids(state.db(), &cohort.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch cohort members"))?;

        let stats = repositories::analytics::list_for_students_course(
            state.db(),
            &members,
            &cohort.course_id,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch cohort analytics"))?;
        let at_risk_students = stats
            .into_iter()
            .filter(|stats| matches!(stats.risk_level, RiskLevel::High | RiskLevel::Critical))
            .map(AnalyticsResponse::from_db)
            .collect();

        cohorts.push(MentorCohortSummary {
            cohort_id: cohort.id,
            cohort_name: cohort.name,
            course_id: cohort.course_id,
            members: members.len(),
            at_risk_students,
        });
    }

    Ok(Json(MentorDashboardResponse { cohorts }))
}

async fn fetch_submission(
    state: &AppState,
    id: &str,
) -> Result<AssignmentSubmission, ApiError> {
    repositories::submissions::find_by_id(state.db(), id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))
}

async fn authorize_submission_read(
    state: &AppState,
    user: &User,
    submission: &AssignmentSubmission,
) -> Result<(), ApiError> {
    if submission.student_id == user.id || user.role == UserRole::Admin {
        return Ok(());
    }

    let lesson = fetch_lesson(state, &submission.lesson_id).await?;
    match user.role {
        UserRole::Instructor => {
            guards::require_course_instructor(state, user, &lesson.course_id).await?;
            Ok(())
        }
        UserRole::Mentor => {
            guards::require_mentor_of_student(
                state,
                user,
                &submission.student_id,
                &lesson.course_id,
            )
            .await
        }
        _ => Err(ApiError::Forbidden("Not allowed to view this submission")),
    }
}

/// Graded work counts toward lesson progress and the engagement snapshot.
async fn refresh_for_submission(
    state: &AppState,
    submission: &AssignmentSubmission,
    lesson: &Lesson,
) -> Result<(), ApiError> {
    let now = primitive_now_utc();

    if let (Some(percentage), Some(passed)) = (submission.percentage, submission.passed) {
        let status = if passed { ProgressStatus::Completed } else { ProgressStatus::Failed };
        repositories::lesson_progress::upsert(
            state.db(),
            repositories::lesson_progress::ProgressUpsert {
                student_id: &submission.student_id,
                lesson_id: &submission.lesson_id,
                status,
                progress_percentage: percentage,
                score: submission.percentage,
                max_score: Some(100.0),
                time_spent_delta: 0,
                now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update lesson progress"))?;
    }

    analytics::refresh_student_analytics(
        state.db(),
        &submission.student_id,
        &lesson.course_id,
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to refresh analytics"))?;

    Ok(())
}
