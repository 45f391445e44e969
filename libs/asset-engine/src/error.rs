use asset_api::{AssetId, StorageError};

use crate::validator::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("asset '{0}' not found")]
    NotFound(AssetId),

    #[error("storage: {0}")]
    Storage(#[from] StorageError),
}

impl ServiceError {
    /// Stable machine-readable code.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(e) => e.kind(),
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Storage(_) => "storage",
        }
    }
}
