use std::env;

/// Fallback signing secret for local runs and tests.
pub const LOCAL_JWT_SECRET: &str = "portal-gate-local-secret-value";

/// AppConfig
///
/// Holds the service's configuration. Immutable once loaded and shared with the
/// session extractor and the router via FromRef.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string for the staff directory. None means the
    // in-memory directory is used (local only).
    pub db_url: Option<String>,
    // Runtime environment marker. Controls the local `x-staff-id` bypass.
    pub env: Env,
    // HS256 secret used to validate session tokens.
    pub jwt_secret: String,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
}

/// Env
///
/// Runtime context: Local enables development conveniences (staff bypass header,
/// seeded in-memory directory), Production demands every secret explicitly.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Non-panicking configuration for test scaffolding.
    fn default() -> Self {
        Self {
            db_url: None,
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables at startup.
    ///
    /// # Panics
    /// Panics in Production if `PORTAL_JWT_SECRET` or `DATABASE_URL` is missing,
    /// so the service never starts with an incomplete session setup.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        match env {
            Env::Local => Self {
                env: Env::Local,
                db_url: env::var("DATABASE_URL").ok(),
                jwt_secret: env::var("PORTAL_JWT_SECRET")
                    .unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
                bind_addr,
            },
            Env::Production => Self {
                env: Env::Production,
                db_url: Some(
                    env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
                ),
                jwt_secret: env::var("PORTAL_JWT_SECRET")
                    .expect("FATAL: PORTAL_JWT_SECRET must be set in production."),
                bind_addr,
            },
        }
    }
}
