pub(crate) mod analytics;
pub(crate) mod engagement;
pub(crate) mod enrollment;
pub(crate) mod grading;
pub(crate) mod peer_review;
