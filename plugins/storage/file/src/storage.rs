use std::future::Future;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use bytes::Bytes;
use tokio::io::AsyncWriteExt;

use asset_api::{AssetId, AssetMeta, AssetRecord, AssetStore, NewAsset, StorageError};

use super::config::{FileStoreConfig, META_EXT, PAYLOAD_EXT, TMP_SUFFIX};

// ════════════════════════════════════════════════════════════════
//  FileAssetStore
// ════════════════════════════════════════════════════════════════

/// Directory-backed asset storage.
///
/// Each record is two files: `{id}.bin` (payload) and `{id}.json`
/// (metadata). Both are written under a `.tmp` name, synced, then renamed
/// into place, payload first. The metadata file is the commit marker:
/// a record without one does not exist for `read` or `list_metadata`.
#[derive(Clone)]
pub struct FileAssetStore {
    data_dir: PathBuf,
}

impl FileAssetStore {
    pub fn new(config: &FileStoreConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
        }
    }

    fn payload_path(&self, id: &AssetId) -> PathBuf {
        self.data_dir.join(format!("{id}.{PAYLOAD_EXT}"))
    }

    fn meta_path(&self, id: &AssetId) -> PathBuf {
        self.data_dir.join(format!("{id}.{META_EXT}"))
    }

    // ── Init ──

    /// Create the directory and drop whatever an interrupted create left
    /// behind. Must run before the store serves requests.
    async fn do_init(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| StorageError::io(format!("mkdir {}", self.data_dir.display()), e))?;

        let mut dir = tokio::fs::read_dir(&self.data_dir)
            .await
            .map_err(|e| StorageError::io(format!("read_dir {}", self.data_dir.display()), e))?;

        let mut swept = 0usize;
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| StorageError::io("read_dir", e))?
        {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let stale = if name.ends_with(TMP_SUFFIX) {
                true
            } else if has_extension(&path, PAYLOAD_EXT) {
                !exists(&path.with_extension(META_EXT)).await?
            } else {
                false
            };

            if stale {
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|e| StorageError::io(format!("remove {}", path.display()), e))?;
                swept += 1;
            }
        }

        if swept > 0 {
            tracing::warn!(dir = %self.data_dir.display(), swept, "removed incomplete uploads");
        }
        tracing::info!(dir = %self.data_dir.display(), "file asset store ready");
        Ok(())
    }

    // ── Create ──

    async fn do_create(&self, asset: NewAsset) -> Result<AssetId, StorageError> {
        let (id, payload_file, payload_tmp) = self.reserve_id().await?;
        let record = AssetRecord::from_new(id.clone(), asset);

        if let Err(e) = self.commit(&record, payload_file, &payload_tmp).await {
            let _ = tokio::fs::remove_file(&payload_tmp).await;
            let _ = tokio::fs::remove_file(tmp_path(&self.meta_path(&id))).await;
            let _ = tokio::fs::remove_file(self.payload_path(&id)).await;
            return Err(e);
        }

        tracing::debug!(id = %id, bytes = record.data.len(), dir = %self.data_dir.display(), "stored asset on disk");
        Ok(id)
    }

    /// Write payload and metadata, then move both into place. The
    /// metadata rename is the last step and publishes the record.
    async fn commit(
        &self,
        record: &AssetRecord,
        mut payload_file: tokio::fs::File,
        payload_tmp: &Path,
    ) -> Result<(), StorageError> {
        payload_file
            .write_all(&record.data)
            .await
            .map_err(|e| StorageError::io(format!("write {}", payload_tmp.display()), e))?;
        payload_file
            .sync_all()
            .await
            .map_err(|e| StorageError::io(format!("sync {}", payload_tmp.display()), e))?;
        drop(payload_file);

        let meta_json = serde_json::to_vec_pretty(&record.meta())
            .map_err(|e| StorageError::io("encode metadata", e.into()))?;
        let meta_path = self.meta_path(&record.id);
        let meta_tmp = tmp_path(&meta_path);
        write_synced(&meta_tmp, &meta_json).await?;

        rename(payload_tmp, &self.payload_path(&record.id)).await?;
        rename(&meta_tmp, &meta_path).await
    }

    /// Pick an unused id and claim it by creating its payload temp file
    /// with `create_new`. Two creates can never hold the same claim.
    async fn reserve_id(&self) -> Result<(AssetId, tokio::fs::File, PathBuf), StorageError> {
        loop {
            let id = AssetId::generate();
            if exists(&self.meta_path(&id)).await? {
                continue;
            }
            let tmp = tmp_path(&self.payload_path(&id));
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&tmp)
                .await
            {
                Ok(f) => return Ok((id, f, tmp)),
                Err(e) if e.kind() == IoErrorKind::AlreadyExists => continue,
                Err(e) => return Err(StorageError::io(format!("create {}", tmp.display()), e)),
            }
        }
    }

    // ── Read ──

    async fn do_read(&self, id: &AssetId) -> Result<Option<AssetRecord>, StorageError> {
        // Anything that is not a UUID could not have been issued here,
        // and must not reach the filesystem as a path component.
        if !id.is_well_formed() {
            return Ok(None);
        }

        let meta_path = self.meta_path(id);
        let meta = match tokio::fs::read(&meta_path).await {
            Ok(raw) => decode_meta(&meta_path, &raw)?,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(format!("read {}", meta_path.display()), e)),
        };

        let payload_path = self.payload_path(id);
        let data = tokio::fs::read(&payload_path)
            .await
            .map_err(|e| StorageError::io(format!("read {}", payload_path.display()), e))?;
        if data.len() as u64 != meta.size {
            return Err(StorageError::corrupt(
                &payload_path,
                format!("expected {} bytes, found {}", meta.size, data.len()),
            ));
        }

        Ok(Some(AssetRecord {
            id: id.clone(),
            name: meta.name,
            data: Bytes::from(data),
            declared_content_type: meta.declared_content_type,
            uploaded_at: meta.uploaded_at,
        }))
    }

    // ── List ──

    async fn do_list(&self) -> Result<Vec<AssetMeta>, StorageError> {
        let mut dir = match tokio::fs::read_dir(&self.data_dir).await {
            Ok(d) => d,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(format!("read_dir {}", self.data_dir.display()), e)),
        };

        let mut metas = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| StorageError::io("read_dir", e))?
        {
            let path = entry.path();
            // `{id}.json.tmp` has extension `tmp` and is skipped here.
            if !has_extension(&path, META_EXT) {
                continue;
            }
            let raw = tokio::fs::read(&path)
                .await
                .map_err(|e| StorageError::io(format!("read {}", path.display()), e))?;
            metas.push(decode_meta(&path, &raw)?);
        }
        Ok(metas)
    }
}

// ════════════════════════════════════════════════════════════════
//  AssetStore impl
// ════════════════════════════════════════════════════════════════

impl AssetStore for FileAssetStore {
    fn init(&self) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        let this = self.clone();
        Box::pin(async move { this.do_init().await })
    }

    fn create(&self, asset: NewAsset) -> Pin<Box<dyn Future<Output = Result<AssetId, StorageError>> + Send + '_>> {
        let this = self.clone();
        Box::pin(async move { this.do_create(asset).await })
    }

    fn read(&self, id: &AssetId) -> Pin<Box<dyn Future<Output = Result<Option<AssetRecord>, StorageError>> + Send + '_>> {
        let this = self.clone();
        let id = id.clone();
        Box::pin(async move { this.do_read(&id).await })
    }

    fn list_metadata(&self) -> Pin<Box<dyn Future<Output = Result<Vec<AssetMeta>, StorageError>> + Send + '_>> {
        let this = self.clone();
        Box::pin(async move { this.do_list().await })
    }
}

// ════════════════════════════════════════════════════════════════
//  Helpers
// ════════════════════════════════════════════════════════════════

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(TMP_SUFFIX);
    PathBuf::from(os)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}

async fn exists(path: &Path) -> Result<bool, StorageError> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| StorageError::io(format!("stat {}", path.display()), e))
}

async fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let mut f = tokio::fs::File::create(path)
        .await
        .map_err(|e| StorageError::io(format!("create {}", path.display()), e))?;
    f.write_all(bytes)
        .await
        .map_err(|e| StorageError::io(format!("write {}", path.display()), e))?;
    f.sync_all()
        .await
        .map_err(|e| StorageError::io(format!("sync {}", path.display()), e))
}

async fn rename(from: &Path, to: &Path) -> Result<(), StorageError> {
    tokio::fs::rename(from, to)
        .await
        .map_err(|e| StorageError::io(format!("rename {} -> {}", from.display(), to.display()), e))
}

fn decode_meta(path: &Path, raw: &[u8]) -> Result<AssetMeta, StorageError> {
    serde_json::from_slice(raw)
        .map_err(|e| StorageError::corrupt(path, format!("undecodable metadata: {e}")))
}
