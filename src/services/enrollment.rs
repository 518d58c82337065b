use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{Course, Coupon, Enrollment};
use crate::db::types::{CourseStatus, DiscountType, EnrollmentStatus};

#[derive(Debug, thiserror::Error)]
pub(crate) enum EnrollmentError {
    #[error("Course not found")]
    CourseNotFound,
    #[error("Course is not open for enrollment")]
    CourseNotPublished,
    #[error("Course is full")]
    CourseFull,
    #[error("Student is already enrolled in this course")]
    AlreadyEnrolled,
    #[error("Coupon is invalid or exhausted")]
    InvalidCoupon,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Final price after an optional coupon. Never below zero.
pub(crate) fn apply_discount(price: f64, coupon: Option<&Coupon>) -> f64 {
    let Some(coupon) = coupon else {
        return price.max(0.0);
    };
    let discounted = match coupon.discount_type {
        DiscountType::Percentage => price - price * coupon.discount_value / 100.0,
        DiscountType::Fixed => price - coupon.discount_value,
    };
    discounted.max(0.0)
}

/// Enrolls a student in a course inside a single transaction.
///
/// The course row is locked with FOR UPDATE so the capacity check and the
/// active-enrollment count read a consistent view; two concurrent enrollments
/// into the last seat serialize on that lock and the loser sees a full course.
/// Coupon consumption is a guarded single-statement increment so an exhausted
/// coupon can never be over-redeemed.
pub(crate) async fn enroll(
    pool: &PgPool,
    student_id: &str,
    course_id: &str,
    coupon_code: Option<&str>,
    now: time::PrimitiveDateTime,
) -> Result<Enrollment, EnrollmentError> {
    let mut tx = pool.begin().await?;

    let course = sqlx::query_as::<_, Course>(
        "SELECT id, title, instructor_id, status, is_free, price, max_students,
                total_lessons, created_at, updated_at
         FROM courses
         WHERE id = $1
         FOR UPDATE",
    )
    .bind(course_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(EnrollmentError::CourseNotFound)?;

    if course.status != CourseStatus::Published {
        return Err(EnrollmentError::CourseNotPublished);
    }

    let already_enrolled = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (
            SELECT 1 FROM enrollments WHERE student_id = $1 AND course_id = $2
         )",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_one(&mut *tx)
    .await?;
    if already_enrolled {
        return Err(EnrollmentError::AlreadyEnrolled);
    }

    if let Some(max_students) = course.max_students {
        let active = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM enrollments WHERE course_id = $1 AND status = $2",
        )
        .bind(course_id)
        .bind(EnrollmentStatus::Active)
        .fetch_one(&mut *tx)
        .await?;
        if active >= max_students as i64 {
            return Err(EnrollmentError::CourseFull);
        }
    }

    let coupon = match coupon_code {
        Some(code) if !course.is_free => {
            // Guarded increment: the row only updates while uses remain, so
            // concurrent redemptions cannot push used_count past max_uses.
            let consumed = sqlx::query_as::<_, Coupon>(
                "UPDATE coupons
                 SET used_count = used_count + 1
                 WHERE code = $1 AND is_active AND used_count < max_uses
                 RETURNING id, code, discount_type, discount_value, max_uses,
                           used_count, is_active, created_at",
            )
            .bind(code)
            .fetch_optional(&mut *tx)
            .await?;
            Some(consumed.ok_or(EnrollmentError::InvalidCoupon)?)
        }
        _ => None,
    };

    let amount_paid =
        if course.is_free { 0.0 } else { apply_discount(course.price, coupon.as_ref()) };

    let enrollment = sqlx::query_as::<_, Enrollment>(
        "INSERT INTO enrollments (id, student_id, course_id, status, amount_paid, enrolled_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id, student_id, course_id, status, amount_paid, enrolled_at",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(student_id)
    .bind(course_id)
    .bind(EnrollmentStatus::Active)
    .bind(amount_paid)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE users SET enrolled_courses_count = enrolled_courses_count + 1, updated_at = $2
         WHERE id = $1",
    )
    .bind(student_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(enrollment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn coupon(discount_type: DiscountType, discount_value: f64) -> Coupon {
        Coupon {
            id: "coupon-1".to_string(),
            code: "SPRING".to_string(),
            discount_type,
            discount_value,
            max_uses: 10,
            used_count: 0,
            is_active: true,
            created_at: datetime!(2026-03-01 00:00:00),
        }
    }

    #[test]
    fn no_coupon_keeps_price() {
        assert_eq!(apply_discount(50.0, None), 50.0);
    }

    #[test]
    fn percentage_coupon_scales_price() {
        let coupon = coupon(DiscountType::Percentage, 20.0);
        assert_eq!(apply_discount(50.0, Some(&coupon)), 40.0);
    }

    #[test]
    fn fixed_coupon_subtracts() {
        let coupon = coupon(DiscountType::Fixed, 15.0);
        assert_eq!(apply_discount(50.0, Some(&coupon)), 35.0);
    }

    #[test]
    fn discount_never_goes_negative() {
        let fixed = coupon(DiscountType::Fixed, 80.0);
        assert_eq!(apply_discount(50.0, Some(&fixed)), 0.0);
        let percentage = coupon(DiscountType::Percentage, 150.0);
        assert_eq!(apply_discount(50.0, Some(&percentage)), 0.0);
    }
}
