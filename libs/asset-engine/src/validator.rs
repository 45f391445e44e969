use crate::format::AssetFormat;

/// Upload size ceiling: 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Why an upload was refused. Client-caused; never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Only GLB and GLTF files are supported")]
    UnsupportedFormat,

    #[error("Uploaded file is empty")]
    EmptyPayload,

    #[error("File exceeds the maximum upload size of {limit} bytes")]
    PayloadTooLarge { limit: u64 },
}

impl ValidationError {
    /// Stable machine-readable code.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::UnsupportedFormat => "unsupported_format",
            ValidationError::EmptyPayload => "empty_payload",
            ValidationError::PayloadTooLarge { .. } => "payload_too_large",
        }
    }
}

/// Admission check run before anything is persisted.
#[derive(Debug, Clone, Copy)]
pub struct IngestValidator {
    max_bytes: u64,
}

impl Default for IngestValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl IngestValidator {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Checks format, then emptiness, then size. Returns the detected
    /// format on success.
    pub fn validate(&self, filename: &str, size: u64) -> Result<AssetFormat, ValidationError> {
        let format = AssetFormat::from_filename(filename).ok_or(ValidationError::UnsupportedFormat)?;
        if size == 0 {
            return Err(ValidationError::EmptyPayload);
        }
        if size > self.max_bytes {
            return Err(ValidationError::PayloadTooLarge { limit: self.max_bytes });
        }
        Ok(format)
    }
}
