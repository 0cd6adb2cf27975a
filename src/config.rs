use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Product catalog CSV
    pub catalog_path: PathBuf,
    /// Optional JSON category rules; built-in table when unset
    pub rules_path: Option<PathBuf>,
    /// Directory holding the four model artifacts
    pub models_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            data: DataConfig {
                catalog_path: PathBuf::from("data/catalog.csv"),
                rules_path: None,
                models_dir: PathBuf::from("product_recommender_models"),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server: ServerConfig {
                host: std::env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: std::env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.server.port),
            },
            data: DataConfig {
                catalog_path: std::env::var("RECEIPT_LENS_CATALOG")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.data.catalog_path),
                rules_path: std::env::var("RECEIPT_LENS_RULES").ok().map(PathBuf::from),
                models_dir: std::env::var("RECEIPT_LENS_MODELS")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.data.models_dir),
            },
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Install the fmt subscriber; `RUST_LOG` overrides the `info` default
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .init();
}
