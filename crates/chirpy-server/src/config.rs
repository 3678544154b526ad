use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use tracing::warn;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub polka_key: String,
    pub db_path: PathBuf,
    pub root: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = lookup("JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("JWT_SECRET is unset or still a placeholder; set it in your .env file");
        }
        if jwt_secret.len() < MIN_SECRET_LEN {
            warn!("JWT_SECRET is shorter than {} bytes", MIN_SECRET_LEN);
        }

        let polka_key = lookup("POLKA_KEY")
            .filter(|key| !key.is_empty())
            .ok_or_else(|| anyhow!("POLKA_KEY is unset"))?;

        let db_path = lookup("CHIRPY_DB_PATH").unwrap_or_else(|| "database.json".into());
        let root = lookup("CHIRPY_ROOT").unwrap_or_else(|| ".".into());
        let host = lookup("CHIRPY_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("CHIRPY_PORT")
            .unwrap_or_else(|| "8080".into())
            .parse()
            .context("CHIRPY_PORT must be a port number")?;

        Ok(Self {
            jwt_secret,
            polka_key,
            db_path: db_path.into(),
            root: root.into(),
            host,
            port,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
