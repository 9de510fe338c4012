//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Web server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Directory evidence photos are written to and served from.
    pub upload_dir: PathBuf,
    /// Admin allow-list, comma-separated as configured.
    pub admin_emails: String,
    /// Token-info endpoint of the external identity verifier.
    pub token_verifier_url: Option<String>,
    /// Required `aud` claim on verified tokens.
    pub token_audience: Option<String>,
    /// Mark session cookies `Secure`.
    pub session_secure: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `CLEANSTREET_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:cleanstreet.db?mode=rwc` |
    /// | `UPLOAD_DIR` | Evidence directory | `uploads` |
    /// | `ADMIN_EMAILS` | Comma-separated admin emails | (empty) |
    /// | `TOKEN_VERIFIER_URL` | Token-info endpoint | (unset, tokens unverified) |
    /// | `TOKEN_AUDIENCE` | Expected `aud` claim | (unset) |
    /// | `SESSION_SECURE` | `true` to mark cookies Secure | `false` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("CLEANSTREET_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("SQLITE_PATH")
            .unwrap_or_else(|_| "sqlite:cleanstreet.db?mode=rwc".to_string());

        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));

        let admin_emails = env::var("ADMIN_EMAILS").unwrap_or_default();

        let token_verifier_url = non_empty_var("TOKEN_VERIFIER_URL");
        let token_audience = non_empty_var("TOKEN_AUDIENCE");

        let session_secure = match env::var("SESSION_SECURE") {
            Ok(value) => parse_flag(&value).ok_or(ConfigError::InvalidFlag("SESSION_SECURE"))?,
            Err(_) => false,
        };

        Ok(Self {
            addr,
            database_url,
            upload_dir,
            admin_emails,
            token_verifier_url,
            token_audience,
            session_secure,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid CLEANSTREET_ADDR format")]
    InvalidAddr,

    #[error("{0} must be true or false")]
    InvalidFlag(&'static str),
}
