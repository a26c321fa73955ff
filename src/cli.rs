//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::db::Database;
use clap::Parser;
use std::time::Duration;
use tracing::{error, info};

const MIN_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "bookshelf",
    about = "Book catalog with token-authenticated accounts"
)]
pub struct Args {
    /// Address to listen on
    #[arg(short, long, env = "LISTEN_ADDR", default_value = "127.0.0.1:8080")]
    pub listen_addr: String,

    /// Path to SQLite database file, or ":memory:"
    #[arg(short, long, env = "DB_DSN", default_value = "bookshelf.db")]
    pub database: String,

    /// Path to file containing the signing secret. Prefer using SECRET_KEY env var instead
    #[arg(long)]
    pub secret_file: Option<String>,

    /// Seconds before a storage call is abandoned
    #[arg(long, env = "STORE_TIMEOUT_SECS", default_value = "5", value_parser = validate_timeout)]
    pub store_timeout: u64,

    /// Reject tokens that were logged out before they expired
    #[arg(long, env = "ENABLE_REVOCATION")]
    pub enable_revocation: bool,

    /// Log output format
    #[arg(long, default_value = "pretty")]
    pub log_format: LogFormat,
}

fn validate_timeout(s: &str) -> Result<u64, String> {
    let secs: u64 = s
        .parse()
        .map_err(|_| format!("Store timeout must be a whole number of seconds: {}", s))?;
    if secs == 0 {
        return Err("Store timeout must be at least one second".to_string());
    }
    Ok(secs)
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load the token signing secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_signing_secret(secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("SECRET_KEY") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("SECRET_KEY") };
        secret
    } else if let Some(path) = secret_file {
        read_secret_file(path)?
    } else {
        error!(
            "Signing secret is required. Set SECRET_KEY environment variable (recommended) or use --secret-file"
        );
        return None;
    };

    check_secret_length(secret)
}

/// Read a secret file, trimming surrounding whitespace.
fn read_secret_file(path: &str) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content.trim().to_string()),
        Err(e) => {
            error!(path = %path, error = %e, "Failed to read secret file");
            None
        }
    }
}

fn check_secret_length(secret: String) -> Option<String> {
    if secret.len() < MIN_SECRET_LENGTH {
        error!(
            "Signing secret is shorter than {} bytes. Use a longer secret",
            MIN_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Build ServerConfig from validated arguments.
pub fn build_config(db: Database, secret: String, revocation: bool) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: secret.into_bytes(),
        revocation,
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str, store_timeout: Duration) -> Option<Database> {
    match Database::open_with_timeout(path, store_timeout).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
