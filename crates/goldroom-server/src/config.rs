use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Server settings, read from `GOLDROOM_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("GOLDROOM_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match lookup("GOLDROOM_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("GOLDROOM_PORT is not a port number: '{}'", raw))?,
            None => 3000,
        };
        let db_path = lookup("GOLDROOM_DB_PATH")
            .unwrap_or_else(|| "goldroom.db".into())
            .into();

        Ok(Self { host, port, db_path })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}
