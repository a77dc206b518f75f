use std::net::SocketAddr;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::services::excel::PricePerSessionRounding;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_DATABASE_PATH: &str = "plans.db";
const DEFAULT_BUCKET: &str = "excel-files";

fn default_max_file_size() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub base_url: String,
    pub bucket: String,
    pub service_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_path: String,
    pub max_file_size: usize,
    pub storage: StorageConfig,
    pub price_per_session: PricePerSessionRounding,
}

impl Config {
    /// Builds the config from any key lookup; `load_config` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR is not a valid socket address")?;

        let max_file_size = match lookup("MAX_FILE_SIZE") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("MAX_FILE_SIZE is not a byte count: {}", raw))?,
            None => default_max_file_size(),
        };

        let price_per_session = match lookup("PRICE_PER_SESSION_ROUNDING") {
            Some(raw) => PricePerSessionRounding::parse(&raw).ok_or_else(|| {
                anyhow::anyhow!(
                    "PRICE_PER_SESSION_ROUNDING must be 'integer' or 'one-decimal', got '{}'",
                    raw
                )
            })?,
            None => PricePerSessionRounding::default(),
        };

        let base_url = lookup("STORAGE_URL")
            .ok_or_else(|| anyhow::anyhow!("Failed to load STORAGE_URL"))?;
        let service_key = lookup("STORAGE_SERVICE_KEY")
            .ok_or_else(|| anyhow::anyhow!("Failed to load STORAGE_SERVICE_KEY"))?;

        Ok(Config {
            bind_addr,
            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            max_file_size,
            storage: StorageConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                bucket: lookup("STORAGE_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
                service_key,
            },
            price_per_session,
        })
    }
}

pub fn load_config() -> Result<Config> {
    // Load .env file first
    dotenv().ok();

    let config = Config::from_lookup(|key| std::env::var(key).ok())?;
    tracing::info!(
        "Configuration loaded: bind={}, database={}, bucket={}, max_file_size={}",
        config.bind_addr,
        config.database_path,
        config.storage.bucket,
        config.max_file_size
    );
    Ok(config)
}
