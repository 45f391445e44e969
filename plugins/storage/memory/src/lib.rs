use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::RwLock;

use asset_api::{AssetId, AssetMeta, AssetRecord, AssetStore, NewAsset, StorageError};

// ═══════════════════════════════════════════════════════════════
//  MemoryAssetStore
// ═══════════════════════════════════════════════════════════════

/// In-process asset storage. Contents live as long as the process;
/// for deployments that do not need durability and for tests.
///
/// A record enters the map in a single write-locked insert, so readers
/// either see all of it or none of it.
#[derive(Default)]
pub struct MemoryAssetStore {
    records: RwLock<HashMap<AssetId, AssetRecord>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssetStore for MemoryAssetStore {
    fn init(&self) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }

    fn create(&self, asset: NewAsset) -> Pin<Box<dyn Future<Output = Result<AssetId, StorageError>> + Send + '_>> {
        Box::pin(async move {
            let mut records = self.records.write().await;
            loop {
                let id = AssetId::generate();
                if let Entry::Vacant(slot) = records.entry(id.clone()) {
                    slot.insert(AssetRecord::from_new(id.clone(), asset));
                    tracing::debug!(id = %id, total = records.len(), "stored asset in memory");
                    return Ok(id);
                }
            }
        })
    }

    fn read(&self, id: &AssetId) -> Pin<Box<dyn Future<Output = Result<Option<AssetRecord>, StorageError>> + Send + '_>> {
        let id = id.clone();
        Box::pin(async move {
            let records = self.records.read().await;
            Ok(records.get(&id).cloned())
        })
    }

    fn list_metadata(&self) -> Pin<Box<dyn Future<Output = Result<Vec<AssetMeta>, StorageError>> + Send + '_>> {
        Box::pin(async move {
            let records = self.records.read().await;
            Ok(records.values().map(AssetRecord::meta).collect())
        })
    }
}
