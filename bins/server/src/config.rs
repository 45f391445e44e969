use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use asset_engine::DEFAULT_MAX_UPLOAD_BYTES;
use storage_file::FileStoreConfig;

use crate::error::ServerError;

#[derive(Parser)]
#[command(name = "model-server", about = "3D model asset storage and retrieval service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    Serve(ServeArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Path to a TOML config file. Built-in defaults apply when omitted.
    #[arg(long, env = "CONFIG_PATH")]
    pub config: Option<String>,

    /// Listen port, overrides `api_port` from the config file.
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,
}

// ---- TOML Config ----

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Upload ceiling in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    #[serde(default)]
    pub storage: StorageConfig,
    /// How long in-flight requests may run after Ctrl+C.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

/// Which `AssetStore` backs the service.
#[derive(Debug, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Process-local, lost on restart.
    Memory,
    /// Directory on local disk.
    File(FileStoreConfig),
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::File(FileStoreConfig::default())
    }
}

impl StorageConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            StorageConfig::Memory => "memory",
            StorageConfig::File(_) => "file",
        }
    }
}

fn default_api_port() -> u16 {
    5000
}
fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}
fn default_shutdown_grace_secs() -> u64 {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            max_upload_bytes: default_max_upload_bytes(),
            storage: StorageConfig::default(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &str) -> Result<Self, ServerError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config { context: "read", detail: format!("'{path}': {e}") })?;
        Self::parse(&content)
            .map_err(|e| ServerError::Config { context: "parse", detail: format!("'{path}': {e}") })
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn validate(&self) -> Result<(), ServerError> {
        if self.max_upload_bytes == 0 {
            return Err(ServerError::Config {
                context: "validate",
                detail: "max_upload_bytes must be greater than zero".into(),
            });
        }
        if let StorageConfig::File(file) = &self.storage {
            if file.data_dir.as_os_str().is_empty() {
                return Err(ServerError::Config {
                    context: "validate",
                    detail: "storage.data_dir must not be empty".into(),
                });
            }
        }
        Ok(())
    }
}
