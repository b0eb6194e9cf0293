pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::jobs::handlers;
use crate::resume;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs API
        .route("/api/v1/jobs/recommend", get(handlers::handle_recommend))
        .route("/api/v1/jobs/search", get(handlers::handle_search))
        // Resume ingestion (extraction happens upstream; storing a resume
        // invalidates the user's cached recommendations)
        .route("/api/v1/resumes", post(resume::handle_create_resume))
        .with_state(state)
}
