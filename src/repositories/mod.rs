pub(crate) mod analytics;
pub(crate) mod cohorts;
pub(crate) mod courses;
pub(crate) mod enrollments;
pub(crate) mod lesson_progress;
pub(crate) mod peer_reviews;
pub(crate) mod submissions;
pub(crate) mod users;
