use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Panics at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub openrouter_api_key: String,
    pub jsearch_api_key: String,
    pub jsearch_host: String,
    /// Fallback locale code when a request carries no country preference.
    pub default_country: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            openrouter_api_key: require_env("OPENROUTER_API_KEY")?,
            jsearch_api_key: require_env("JSEARCH_API_KEY")?,
            jsearch_host: std::env::var("JSEARCH_HOST")
                .unwrap_or_else(|_| "jsearch.p.rapidapi.com".to_string()),
            default_country: std::env::var("DEFAULT_COUNTRY").unwrap_or_else(|_| "in".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
