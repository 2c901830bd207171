//! Configuration module for garage-service.

use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct GarageConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub storage: StorageBackend,
    /// Page size for document listings and client autocomplete.
    pub default_page_size: i64,
}

/// Where documents and parties are kept.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    Postgres(DatabaseConfig),
    /// Process memory; nothing survives a restart.
    Memory,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl GarageConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let storage = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StorageBackend::Postgres(DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required"))
                })?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            }),
            "memory" => StorageBackend::Memory,
            other => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Unknown STORAGE_BACKEND '{}', expected postgres or memory",
                    other
                )))
            }
        };

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "garage-service".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            storage,
            default_page_size: env::var("DEFAULT_PAGE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|size: &i64| *size > 0)
                .unwrap_or(10),
        })
    }

    /// In-memory configuration listening on `port`.
    pub fn in_memory(port: u16) -> Self {
        Self {
            common: core_config::Config {
                host: "127.0.0.1".to_string(),
                port,
            },
            service_name: "garage-service".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            storage: StorageBackend::Memory,
            default_page_size: 10,
        }
    }
}
