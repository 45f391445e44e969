pub mod error;

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub use error::StorageError;

// ════════════════════════════════════════════════════════════════
//  Asset identity
// ════════════════════════════════════════════════════════════════

/// Opaque asset identifier. Assigned by the store at creation time
/// and never reused; a UUID v4 in canonical hyphenated form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Fresh random id. Only stores call this.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the id has the shape stores hand out. Lookups of anything
    /// else can short-circuit to "not found".
    pub fn is_well_formed(&self) -> bool {
        uuid::Uuid::try_parse(&self.0).is_ok()
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AssetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ════════════════════════════════════════════════════════════════
//  Records
// ════════════════════════════════════════════════════════════════

/// Content type recorded when the upload transport declares none.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Input of `AssetStore::create`: everything except the fields the
/// store itself assigns (`id`, `uploaded_at`).
#[derive(Clone, Debug)]
pub struct NewAsset {
    pub name: String,
    pub data: Bytes,
    pub declared_content_type: String,
}

/// A persisted asset. Immutable once created.
#[derive(Clone, Debug)]
pub struct AssetRecord {
    pub id: AssetId,
    /// Original filename as uploaded. Not unique.
    pub name: String,
    pub data: Bytes,
    /// MIME type reported by the uploader. Informational only.
    pub declared_content_type: String,
    /// Unix epoch milliseconds.
    pub uploaded_at: i64,
}

impl AssetRecord {
    /// Build the record for a create. `uploaded_at` is stamped here.
    pub fn from_new(id: AssetId, asset: NewAsset) -> Self {
        Self {
            id,
            name: asset.name,
            data: asset.data,
            declared_content_type: asset.declared_content_type,
            uploaded_at: now_ms(),
        }
    }

    /// Metadata view (everything except the payload).
    pub fn meta(&self) -> AssetMeta {
        AssetMeta {
            id: self.id.clone(),
            name: self.name.clone(),
            declared_content_type: self.declared_content_type.clone(),
            uploaded_at: self.uploaded_at,
            size: self.data.len() as u64,
        }
    }
}

/// Record metadata as returned by listings. Never carries the payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMeta {
    pub id: AssetId,
    pub name: String,
    pub declared_content_type: String,
    pub uploaded_at: i64,
    /// Payload length in bytes.
    pub size: u64,
}

// ════════════════════════════════════════════════════════════════
//  Storage trait
// ════════════════════════════════════════════════════════════════

/// Durable keyed storage for asset records.
///
/// Implementations must hand out distinct ids to concurrent `create`
/// calls, must never expose a half-written record, and must make a
/// finished `create` visible to every later `read`.
///
/// Plugins: memory storage, file storage.
pub trait AssetStore: Send + Sync {
    /// Prepare the backend (create directories, sweep leftovers).
    fn init(&self) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>>;

    /// Persist a new record and return its id once the write is visible.
    fn create(&self, asset: NewAsset) -> Pin<Box<dyn Future<Output = Result<AssetId, StorageError>> + Send + '_>>;

    /// Exact-match lookup. `Ok(None)` when the id was never issued.
    fn read(&self, id: &AssetId) -> Pin<Box<dyn Future<Output = Result<Option<AssetRecord>, StorageError>> + Send + '_>>;

    /// Metadata of every record, unordered.
    fn list_metadata(&self) -> Pin<Box<dyn Future<Output = Result<Vec<AssetMeta>, StorageError>> + Send + '_>>;
}

// ════════════════════════════════════════════════════════════════
//  Utilities
// ════════════════════════════════════════════════════════════════

/// Current time as Unix epoch milliseconds.
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
