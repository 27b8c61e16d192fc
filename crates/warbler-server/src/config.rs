use std::net::SocketAddr;
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use tracing::warn;

/// Runtime settings, read from the environment (and `.env` when present).
pub struct Config {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub secret_key: String,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let db_path = std::env::var("WARBLER_DB_PATH").unwrap_or_else(|_| "warbler.db".into());
        let host = std::env::var("WARBLER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("WARBLER_PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()?;
        let static_dir = std::env::var("WARBLER_STATIC_DIR").unwrap_or_else(|_| "static".into());

        let secret_key = match std::env::var("WARBLER_SECRET_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => {
                warn!("WARBLER_SECRET_KEY unset; sessions will not survive a restart");
                B64.encode(rand::random::<[u8; 32]>())
            }
        };

        Ok(Self {
            db_path: db_path.into(),
            host,
            port,
            secret_key,
            static_dir: static_dir.into(),
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}
