use std::sync::Arc;

use sqlx::PgPool;

use crate::jobs::pipeline::JobPipeline;

/// Shared application state injected into all route handlers via Axum
/// extractors. The pipeline carries its collaborators (store, cache, résumé
/// provider, text generator, job source) as injected trait objects — no
/// process-wide singletons.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub pipeline: Arc<JobPipeline>,
}
