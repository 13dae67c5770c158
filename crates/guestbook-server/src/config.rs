use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

use guestbook_api::users::DEFAULT_ADMIN_PASSWORD;

/// Runtime settings, read from `GUESTBOOK_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub static_dir: PathBuf,
    pub admin_password: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port = var("GUESTBOOK_PORT", "3000")
            .parse()
            .context("GUESTBOOK_PORT must be a port number")?;
        let max_upload_mb: usize = var("GUESTBOOK_MAX_UPLOAD_MB", "50")
            .parse()
            .context("GUESTBOOK_MAX_UPLOAD_MB must be a whole number")?;
        let max_upload_bytes = max_upload_mb
            .checked_mul(1024 * 1024)
            .context("GUESTBOOK_MAX_UPLOAD_MB is too large")?;

        Ok(Self {
            host: var("GUESTBOOK_HOST", "0.0.0.0"),
            port,
            db_path: var("GUESTBOOK_DB_PATH", "guestbook.db").into(),
            upload_dir: var("GUESTBOOK_UPLOAD_DIR", "./uploads").into(),
            static_dir: var("GUESTBOOK_STATIC_DIR", "./public").into(),
            admin_password: var("GUESTBOOK_ADMIN_PASSWORD", DEFAULT_ADMIN_PASSWORD),
            max_upload_bytes,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
