use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::models::{Cohort, Course, User};
use crate::db::types::UserRole;
use crate::repositories;

pub(crate) struct CurrentUser(pub(crate) User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        let user = repositories::users::find_by_id(app_state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

        let Some(user) = user else {
            return Err(ApiError::Unauthorized("User not found"));
        };

        if !user.is_active {
            return Err(ApiError::Unauthorized("Invalid authentication credentials"));
        }

        Ok(CurrentUser(user))
    }
}

/// Instructors act only on their own courses; admins act on any.
pub(crate) async fn require_course_instructor(
    state: &AppState,
    user: &User,
    course_id: &str,
) -> Result<Course, ApiError> {
    let course = repositories::courses::find_by_id(state.db(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    if user.role == UserRole::Admin {
        return Ok(course);
    }
    if user.role == UserRole::Instructor && course.instructor_id == user.id {
        return Ok(course);
    }
    Err(ApiError::Forbidden("Instructor access required for this course"))
}

/// Mentors act only on cohorts assigned to them; admins act on any.
pub(crate) async fn require_cohort_mentor(
    state: &AppState,
    user: &User,
    cohort_id: &str,
) -> Result<Cohort, ApiError> {
    let cohort = repositories::cohorts::find_by_id(state.db(), cohort_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch cohort"))?
        .ok_or_else(|| ApiError::NotFound("Cohort not found".to_string()))?;

    if user.role == UserRole::Admin {
        return Ok(cohort);
    }
    if user.role == UserRole::Mentor && cohort.mentor_id.as_deref() == Some(user.id.as_str()) {
        return Ok(cohort);
    }
    Err(ApiError::Forbidden("Mentor access required for this cohort"))
}

/// Mentor override of a submission grade requires the student to be in a
/// cohort mentored by this user within the lesson's course.
pub(crate) async fn require_mentor_of_student(
    state: &AppState,
    user: &User,
    student_id: &str,
    course_id: &str,
) -> Result<(), ApiError> {
    if user.role == UserRole::Admin {
        return Ok(());
    }
    if user.role != UserRole::Mentor {
        return Err(ApiError::Forbidden("Mentor access required"));
    }

    let cohort =
        repositories::cohorts::find_for_student_course(state.db(), student_id, course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch cohort"))?;

    match cohort {
        Some(cohort) if cohort.mentor_id.as_deref() == Some(user.id.as_str()) => Ok(()),
        _ => Err(ApiError::Forbidden("Mentor access required for this student")),
    }
}
