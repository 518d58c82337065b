pub(crate) mod auth;
pub(crate) mod cohorts;
pub(crate) mod courses;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod progress;
pub(crate) mod router;
