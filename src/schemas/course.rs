use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::Enrollment;
use crate::db::types::EnrollmentStatus;

#[derive(Debug, Deserialize)]
pub(crate) struct EnrollRequest {
    #[serde(default)]
    pub(crate) coupon_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollmentResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) course_id: String,
    pub(crate) status: EnrollmentStatus,
    pub(crate) amount_paid: f64,
    pub(crate) enrolled_at: String,
}

impl EnrollmentResponse {
    pub(crate) fn from_db(enrollment: Enrollment) -> Self {
        Self {
            id: enrollment.id,
            student_id: enrollment.student_id,
            course_id: enrollment.course_id,
            status: enrollment.status,
            amount_paid: enrollment.amount_paid,
            enrolled_at: format_primitive(enrollment.enrolled_at),
        }
    }
}
