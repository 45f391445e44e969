use std::sync::Arc;

use bytes::Bytes;

use asset_api::{AssetId, AssetMeta, AssetStore, NewAsset, FALLBACK_CONTENT_TYPE};

use crate::content_type::resolve_content_type;
use crate::error::ServiceError;
use crate::validator::IngestValidator;

// ═══════════════════════════════════════════════════════════════
//  FetchedAsset
// ═══════════════════════════════════════════════════════════════

/// Stored content never changes, so clients may cache it for a year.
pub const CACHE_CONTROL: &str = "public, max-age=31536000";
/// Asset bytes are not sensitive; any origin may load them into a viewer.
pub const ALLOW_ORIGIN: &str = "*";

/// Payload plus the framing a renderer needs to consume it.
#[derive(Debug, Clone)]
pub struct FetchedAsset {
    pub id: AssetId,
    pub name: String,
    pub data: Bytes,
    pub content_type: String,
}

impl FetchedAsset {
    /// Response headers as `(name, value)` pairs, lowercase names.
    pub fn headers(&self) -> [(&'static str, &str); 3] {
        [
            ("content-type", self.content_type.as_str()),
            ("cache-control", CACHE_CONTROL),
            ("access-control-allow-origin", ALLOW_ORIGIN),
        ]
    }
}

// ═══════════════════════════════════════════════════════════════
//  AssetService
// ═══════════════════════════════════════════════════════════════

/// Validate → store → resolve. The only entry point transports use.
#[derive(Clone)]
pub struct AssetService {
    store: Arc<dyn AssetStore>,
    validator: IngestValidator,
}

impl AssetService {
    pub fn new(store: Arc<dyn AssetStore>, validator: IngestValidator) -> Self {
        Self { store, validator }
    }

    pub fn validator(&self) -> &IngestValidator {
        &self.validator
    }

    /// Validate and persist an upload. Nothing reaches the store unless
    /// validation passes. A missing or blank declared type is recorded as
    /// `application/octet-stream`.
    pub async fn ingest(
        &self,
        filename: &str,
        data: Bytes,
        declared_content_type: Option<&str>,
    ) -> Result<AssetId, ServiceError> {
        let format = match self.validator.validate(filename, data.len() as u64) {
            Ok(format) => format,
            Err(e) => {
                tracing::warn!(filename, bytes = data.len(), reason = e.kind(), "upload rejected");
                return Err(e.into());
            }
        };

        let declared = declared_content_type
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(FALLBACK_CONTENT_TYPE);
        let size = data.len();

        let id = self
            .store
            .create(NewAsset {
                name: filename.to_string(),
                data,
                declared_content_type: declared.to_string(),
            })
            .await?;

        tracing::info!(id = %id, filename, %format, bytes = size, declared, "model stored");
        Ok(id)
    }

    /// Look up an asset and resolve the content type it is served with.
    pub async fn fetch(&self, id: &AssetId) -> Result<FetchedAsset, ServiceError> {
        let record = self
            .store
            .read(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.clone()))?;

        let content_type = resolve_content_type(&record.name, &record.declared_content_type);
        tracing::debug!(
            id = %id,
            name = %record.name,
            declared = %record.declared_content_type,
            content_type = %content_type,
            bytes = record.data.len(),
            "model fetched"
        );

        Ok(FetchedAsset {
            id: record.id,
            name: record.name,
            data: record.data,
            content_type,
        })
    }

    /// Metadata of every stored asset, newest first.
    pub async fn list_metadata(&self) -> Result<Vec<AssetMeta>, ServiceError> {
        let mut metas = self.store.list_metadata().await?;
        metas.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then_with(|| a.id.as_str().cmp(b.id.as_str())));
        Ok(metas)
    }
}
