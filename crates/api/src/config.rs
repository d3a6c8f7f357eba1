use std::path::PathBuf;

use crate::auth::jwt::JwtConfig;

/// Default per-call timeout for the A/B testing service in milliseconds.
const DEFAULT_AB_TESTING_TIMEOUT_MS: u64 = 500;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Editor token configuration.
    pub jwt: JwtConfig,
    /// Base URL of the A/B testing service. `None` disables experiments.
    pub ab_testing_url: Option<String>,
    /// Per-call timeout for the A/B testing service (default: `500`).
    pub ab_testing_timeout_ms: u64,
    /// Directory holding `<page_type>.json` default templates.
    pub template_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `AB_TESTING_URL`        | unset                   |
    /// | `AB_TESTING_TIMEOUT_MS` | `500`                   |
    /// | `TEMPLATE_DIR`          | unset                   |
    ///
    /// JWT variables are read by [`JwtConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let ab_testing_url = non_empty_var("AB_TESTING_URL");

        let ab_testing_timeout_ms: u64 = std::env::var("AB_TESTING_TIMEOUT_MS")
            .unwrap_or_else(|_| DEFAULT_AB_TESTING_TIMEOUT_MS.to_string())
            .parse()
            .expect("AB_TESTING_TIMEOUT_MS must be a valid u64");

        let template_dir = non_empty_var("TEMPLATE_DIR").map(PathBuf::from);

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt,
            ab_testing_url,
            ab_testing_timeout_ms,
            template_dir,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
