pub mod content_type;
pub mod error;
pub mod format;
pub mod service;
pub mod validator;

pub use content_type::resolve_content_type;
pub use error::ServiceError;
pub use format::AssetFormat;
pub use service::{AssetService, FetchedAsset};
pub use validator::{IngestValidator, ValidationError, DEFAULT_MAX_UPLOAD_BYTES};
