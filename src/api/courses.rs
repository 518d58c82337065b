use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::schemas::course::{EnrollRequest, EnrollmentResponse};
use crate::services::enrollment;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/:course_id/enroll", post(enroll))
}

async fn enroll(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<String>,
    Json(payload): Json<EnrollRequest>,
) -> Result<(StatusCode, Json<EnrollmentResponse>), ApiError> {
    let result = enrollment::enroll(
        state.db(),
        &user.id,
        &course_id,
        payload.coupon_code.as_deref(),
        primitive_now_utc(),
    )
    .await?;

    tracing::info!(
        student_id = %user.id,
        course_id = %course_id,
        amount_paid = result.amount_paid,
        "Student enrolled"
    );

    Ok((StatusCode::CREATED, Json(EnrollmentResponse::from_db(result))))
}
