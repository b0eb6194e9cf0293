mod config;
mod db;
mod errors;
mod jobs;
mod llm_client;
mod models;
mod resume;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::jobs::cache::RedisResponseCache;
use crate::jobs::pipeline::JobPipeline;
use crate::jobs::source::JSearchClient;
use crate::jobs::store::PgJobStore;
use crate::llm_client::OpenRouterClient;
use crate::resume::PgResumeProvider;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (panics on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Joblytic API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize LLM client
    let llm = OpenRouterClient::new(config.openrouter_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Initialize job source client
    let job_source = JSearchClient::new(config.jsearch_host.clone(), config.jsearch_api_key.clone());
    info!("Job source client initialized (host: {})", config.jsearch_host);

    // Wire the pipeline with explicitly constructed, injected collaborators
    let pipeline = Arc::new(JobPipeline::new(
        Arc::new(PgJobStore::new(db.clone())),
        Arc::new(RedisResponseCache::new(redis)),
        Arc::new(PgResumeProvider::new(db.clone())),
        Arc::new(llm),
        Arc::new(job_source),
        config.default_country.clone(),
    ));

    // Build app state
    let state = AppState { db, pipeline };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
