use std::path::PathBuf;

// ════════════════════════════════════════════════════════════════
//  Configuration
// ════════════════════════════════════════════════════════════════

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data/models")
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct FileStoreConfig {
    /// Directory holding `{id}.bin` payloads and `{id}.json` metadata.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  On-disk layout
// ════════════════════════════════════════════════════════════════

pub(crate) const PAYLOAD_EXT: &str = "bin";
pub(crate) const META_EXT: &str = "json";
/// Suffix of files still being written. Never read back.
pub(crate) const TMP_SUFFIX: &str = ".tmp";
