use std::env;

/// Fallback signing secret for local development only.
pub const LOCAL_JWT_SECRET: &str = "workshop-hub-local-development-secret";

/// AppConfig
///
/// Holds the application's configuration. Loaded once at startup and shared
/// read-only with every handler through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` runs the service on the in-memory repository (local only).
    pub db_url: Option<String>,
    // Runtime environment marker. Controls log format, cookie flags and secret handling.
    pub env: Env,
    // HMAC secret used to sign and verify session tokens.
    pub jwt_secret: String,
    // Session token lifetime.
    pub token_ttl_hours: i64,
    // TCP port the HTTP server listens on.
    pub port: u16,
}

/// Env
///
/// Runtime context: local development or hardened production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Non-panicking configuration for tests and in-process servers.
    fn default() -> Self {
        Self {
            db_url: None,
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            token_ttl_hours: 24,
            port: 8000,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in production when `DATABASE_URL` or `JWT_SECRET` is missing, so the
    /// service never starts with an in-memory store or a guessable signing key.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let token_ttl_hours = env::var("TOKEN_TTL_HOURS")
            .ok()
            .and_then(|value| value.parse::<i64>().ok())
            .filter(|hours| *hours > 0)
            .unwrap_or(24);

        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8000);

        match env {
            Env::Local => Self {
                env: Env::Local,
                db_url: env::var("DATABASE_URL").ok(),
                jwt_secret: env::var("JWT_SECRET")
                    .unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
                token_ttl_hours,
                port,
            },
            Env::Production => Self {
                env: Env::Production,
                db_url: Some(
                    env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in production"),
                ),
                jwt_secret: env::var("JWT_SECRET")
                    .expect("FATAL: JWT_SECRET must be set in production."),
                token_ttl_hours,
                port,
            },
        }
    }

    /// Session cookies are only marked `Secure` in production, where TLS is terminated upstream.
    pub fn secure_cookies(&self) -> bool {
        self.env == Env::Production
    }
}
