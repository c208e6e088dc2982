//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `KRAMBAM_DATABASE_URL` - `PostgreSQL` connection string
//!   (falls back to the generic `DATABASE_URL`)
//! - `KRAMBAM_AUTH_SECRET` - Staff token signing secret (min 32 chars)
//!
//! ## Optional
//! - `KRAMBAM_HOST` - Bind address (default: 127.0.0.1)
//! - `KRAMBAM_PORT` - Listen port (default: 3000)
//! - `KRAMBAM_DB_MAX_CONNECTIONS` - Connection pool size (default: 10)
//! - `KRAMBAM_DB_RETRY_ATTEMPTS` - Bounded retry count for transient
//!   database failures (default: 5)

use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_AUTH_SECRET_LENGTH: usize = 32;

/// Substrings that mark a secret as a placeholder someone forgot to
/// replace. Checked case-insensitively.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "your-",
    "todo",
    "fixme",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Staff token signing secret
    pub auth_secret: SecretString,
    /// Maximum connections in the database pool
    pub db_max_connections: u32,
    /// Bounded retry count for transient database failures
    pub db_retry_attempts: u32,
}

impl ServerConfig {
    /// Load configuration from the environment, reading a `.env` file
    /// first if one is present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing, a value
    /// fails to parse, or the auth secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let database_url = database_url()?;

        let host = parsed("KRAMBAM_HOST", "127.0.0.1".parse().ok())?;
        let port = parsed("KRAMBAM_PORT", Some(3000))?;

        let auth_secret = SecretString::from(required("KRAMBAM_AUTH_SECRET")?);
        validate_auth_secret(&auth_secret, "KRAMBAM_AUTH_SECRET")?;

        Ok(Self {
            database_url,
            host,
            port,
            auth_secret,
            db_max_connections: parsed("KRAMBAM_DB_MAX_CONNECTIONS", Some(10))?,
            db_retry_attempts: parsed("KRAMBAM_DB_RETRY_ATTEMPTS", Some(5))?,
        })
    }

    /// The address the server binds to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn required(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Project-specific URL first, generic `DATABASE_URL` as the fallback so
/// hosted environments that inject the generic name keep working.
fn database_url() -> Result<SecretString, ConfigError> {
    std::env::var("KRAMBAM_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar("KRAMBAM_DATABASE_URL".to_owned()))
}

/// Parse an optional variable, falling back to `default`. A `None` default
/// means the fallback itself failed to parse, which is a programmer error
/// surfaced as `InvalidEnvVar`.
fn parsed<T>(key: &str, default: Option<T>) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string())),
        Err(_) => {
            default.ok_or_else(|| ConfigError::InvalidEnvVar(key.to_owned(), "bad default".into()))
        }
    }
}

/// Reject short secrets and obvious placeholders before the server comes
/// up, so a misconfigured box fails at boot instead of signing weak tokens.
fn validate_auth_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_AUTH_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!("must be at least {MIN_AUTH_SECRET_LENGTH} characters"),
        ));
    }

    let lower = value.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    Ok(())
}
