//! Object storage for uploaded files
//!
//! Uploads are validated against a per-bucket policy ([`upload`]) and written
//! through the [`ObjectStore`] trait. The shipped backend is
//! [`local::LocalObjectStore`], which keeps files on disk and serves them
//! through the API's `/storage` route.
//!
//! Objects are keyed `<bucket>/<user_id>/<uuid>.<ext>`.

pub mod local;
pub mod upload;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use local::LocalObjectStore;
pub use upload::{store_upload, Bucket, StoredObject};

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Unknown bucket: {0}")]
    UnknownBucket(String),

    #[error("File type {content_type} is not allowed in bucket {bucket}")]
    DisallowedType { bucket: String, content_type: String },

    #[error("File is too large ({size} bytes, limit {limit} bytes)")]
    TooLarge { size: usize, limit: usize },

    #[error("File is empty")]
    Empty,

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Errors caused by the uploaded file rather than the backend
    pub fn is_client_error(&self) -> bool {
        !matches!(self, StorageError::Io(_))
    }
}

/// Backend that persists uploaded objects
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes `data` under `key`, replacing any existing object
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StorageError>;

    /// Public URL under which `key` is served
    fn public_url(&self, key: &str) -> String;
}

/// Rejects keys that could escape the bucket layout
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..");

    if bad {
        return Err(StorageError::InvalidKey(key.to_string()));
    }

    Ok(())
}
