use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use asset_api::AssetStore;
use asset_engine::{AssetService, IngestValidator};
use storage_file::FileAssetStore;
use storage_memory::MemoryAssetStore;

use crate::config::{ServeArgs, ServerConfig, StorageConfig};
use crate::error::ServerError;

pub async fn run(args: ServeArgs) -> Result<(), ServerError> {
    tracing::info!("model-server starting");

    // --- Load config ---
    let mut config = match &args.config {
        Some(path) => {
            let config = ServerConfig::load(path)?;
            tracing::info!(config = %path, "loaded config");
            config
        }
        None => {
            tracing::info!("no config file given, using defaults");
            ServerConfig::default()
        }
    };
    if let Some(port) = args.port {
        config.api_port = port;
    }
    config.validate()?;

    // --- Storage ---
    let store: Arc<dyn AssetStore> = match &config.storage {
        StorageConfig::Memory => Arc::new(MemoryAssetStore::new()),
        StorageConfig::File(file_cfg) => Arc::new(FileAssetStore::new(file_cfg)),
    };
    store.init().await?;
    tracing::info!(backend = config.storage.backend_name(), "storage ready");

    let service = AssetService::new(store, IngestValidator::new(config.max_upload_bytes));

    // --- CancellationToken for graceful shutdown ---
    let token = CancellationToken::new();

    // --- API server ---
    let api_port = config.api_port;
    let api_token = token.clone();
    let mut api_handle = tokio::spawn(async move {
        asset_api_server::run(api_port, service, api_token).await
    });

    tracing::info!(
        port = config.api_port,
        max_upload_bytes = config.max_upload_bytes,
        "server ready"
    );

    // --- Wait for Ctrl+C, or for the server to die on its own ---
    tokio::select! {
        res = &mut api_handle => {
            return match res {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(ServerError::Api(e)),
                Err(e) => Err(ServerError::Api(format!("api task: {e}"))),
            };
        }
        res = tokio::signal::ctrl_c() => res?,
    }
    tracing::info!("shutting down...");

    // Stop accepting connections, let in-flight requests finish
    token.cancel();

    let grace = Duration::from_secs(config.shutdown_grace_secs);
    match tokio::time::timeout(grace, &mut api_handle).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "api server error"),
        Ok(Err(e)) => tracing::error!(error = %e, "api task failed"),
        Err(_) => {
            tracing::warn!(grace_secs = config.shutdown_grace_secs, "requests still running, aborting");
            api_handle.abort();
        }
    }

    tracing::info!("shutdown complete");
    Ok(())
}
