use std::path::PathBuf;

use segflow_core::archive::MAX_ARCHIVE_BYTES;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
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
    /// Root directory for staged archives, images, and annotation
    /// artifacts (default: `./media`).
    pub media_root: PathBuf,
    /// Maximum accepted archive size in bytes (default: 500 MiB).
    pub max_archive_bytes: u64,
    /// Mask-proposal service endpoint. When unset the proposal route
    /// reports the feature as unavailable.
    pub mask_proposal_url: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `MEDIA_ROOT`           | `./media`                  |
    /// | `MAX_ARCHIVE_BYTES`    | `524288000`                |
    /// | `MASK_PROPOSAL_URL`    | unset                      |
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

        let media_root = PathBuf::from(std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "./media".into()));

        let max_archive_bytes: u64 = std::env::var("MAX_ARCHIVE_BYTES")
            .unwrap_or_else(|_| MAX_ARCHIVE_BYTES.to_string())
            .parse()
            .expect("MAX_ARCHIVE_BYTES must be a valid u64");

        let mask_proposal_url = std::env::var("MASK_PROPOSAL_URL").ok().filter(|s| !s.is_empty());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            media_root,
            max_archive_bytes,
            mask_proposal_url,
        }
    }
}
