use axum::{
    routing::{get, post, put},
    Router,
};

pub mod jobs;
pub mod ranges;
pub mod stats;
pub mod system;

/// Router for every job endpoint.
pub fn router() -> Router {
    Router::new()
        .route("/stats", get(stats::stats))
        .route("/job/types", get(stats::types))
        .route("/job/search", get(jobs::search))
        .route("/job", post(jobs::create))
        .route("/job/:id", get(jobs::get_job).delete(jobs::remove))
        .route("/job/:id/log", get(jobs::log))
        .route("/job/:id/state/:state", put(jobs::update_state))
        .route("/job/:id/priority/:priority", put(jobs::update_priority))
        .route("/inactive/:id", get(jobs::inactive))
        .route("/jobs/*query", get(ranges::jobs))
}
