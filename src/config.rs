use std::env;

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// immutable afterwards; handlers and extractors pull it out of `AppState` via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` only in local mode, where the in-memory store is used.
    pub db_url: Option<String>,
    // Maximum size of the Postgres connection pool.
    pub db_max_connections: u32,
    // Runtime environment marker. Controls log format and the fail-fast checks below.
    pub env: Env,
    // HMAC secret used to sign and verify access tokens.
    pub jwt_secret: String,
    // Lifetime of an issued access token, in minutes.
    pub token_ttl_minutes: i64,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Lowercased. Existing accounts with these emails are made admins at startup.
    pub admin_emails: Vec<String>,
    // Insert the sample guides and FAQs when the catalog is empty at startup.
    pub seed_sample_data: bool,
}

/// Env
///
/// Defines the runtime context: local development (pretty logs, lenient defaults)
/// or production (JSON logs, every secret mandatory).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_JWT_SECRET: &str = "local-development-secret-change-me";

impl Default for AppConfig {
    /// Safe, non-panicking configuration used for test state scaffolding.
    fn default() -> Self {
        Self {
            db_url: None,
            db_max_connections: 5,
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            token_ttl_minutes: 30,
            bind_addr: "0.0.0.0:3000".to_string(),
            admin_emails: Vec::new(),
            seed_sample_data: false,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables and implements the **fail-fast**
    /// principle for production.
    ///
    /// # Panics
    /// Panics in production when `JWT_SECRET` or `DATABASE_URL` is missing, and in any
    /// environment when a numeric variable cannot be parsed.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let (jwt_secret, db_url) = match env {
            Env::Production => (
                env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production."),
                Some(
                    env::var("DATABASE_URL")
                        .expect("FATAL: DATABASE_URL must be set in production."),
                ),
            ),
            Env::Local => (
                env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
                env::var("DATABASE_URL").ok(),
            ),
        };

        let seed_default = env == Env::Local;

        Self {
            db_url,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 5),
            jwt_secret,
            token_ttl_minutes: parse_var("ACCESS_TOKEN_EXPIRE_MINUTES", 30),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            admin_emails: env::var("ADMIN_EMAILS")
                .map(|raw| parse_email_list(&raw))
                .unwrap_or_default(),
            seed_sample_data: parse_var("SEED_SAMPLE_DATA", seed_default),
            env,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("FATAL: {key} has an invalid value: {raw}")),
        Err(_) => default,
    }
}

fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|email| email.trim().to_lowercase())
        .filter(|email| !email.is_empty())
        .collect()
}
