use axum::{routing::get, Router};

use crate::handlers::job_handlers::{get_job, get_latest_job};

pub fn job_routes() -> Router {
    Router::new()
        .route("/jobs/latest/{specificationId}", get(get_latest_job))
        .route("/jobs/{jobId}", get(get_job))
}
