use crate::auth::jwt::JwtConfig;

/// Default lifetime of exit-survey tokens when `SURVEY_TOKEN_TTL_DAYS` is unset.
const DEFAULT_SURVEY_TOKEN_TTL_DAYS: i64 = offboardpro_core::survey::DEFAULT_TOKEN_TTL_DAYS;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for the job worker to drain (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// Public base URL of the web app, used to build survey links.
    pub app_base_url: String,
    /// Lifetime of issued exit-survey tokens, in days.
    pub survey_token_ttl_days: i64,
    /// Paddle webhook signing secret. `None` skips signature verification.
    pub paddle_webhook_secret: Option<String>,
    /// Bearer secret for the cron endpoints. `None` rejects every cron call.
    pub cron_secret: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `0.0.0.0`                  |
    /// | `PORT`                  | `3000`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                       |
    /// | `APP_BASE_URL`          | `http://localhost:5173`    |
    /// | `SURVEY_TOKEN_TTL_DAYS` | `30`                       |
    /// | `PADDLE_WEBHOOK_SECRET` | unset                      |
    /// | `CRON_SECRET`           | unset                      |
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

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let app_base_url =
            std::env::var("APP_BASE_URL").unwrap_or_else(|_| "http://localhost:5173".into());

        let survey_token_ttl_days: i64 = std::env::var("SURVEY_TOKEN_TTL_DAYS")
            .unwrap_or_else(|_| DEFAULT_SURVEY_TOKEN_TTL_DAYS.to_string())
            .parse()
            .expect("SURVEY_TOKEN_TTL_DAYS must be a valid i64");
        if let Err(e) = offboardpro_core::survey::validate_ttl_days(survey_token_ttl_days) {
            panic!("SURVEY_TOKEN_TTL_DAYS is invalid: {e}");
        }

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt,
            app_base_url,
            survey_token_ttl_days,
            paddle_webhook_secret: optional_env("PADDLE_WEBHOOK_SECRET"),
            cron_secret: optional_env("CRON_SECRET"),
        }
    }
}

/// Read an env var, treating unset and empty the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
