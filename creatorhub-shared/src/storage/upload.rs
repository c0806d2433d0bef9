//! Upload policy: buckets, allowed types and size limits

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::{ObjectStore, StorageError};

/// Default upload size limit (5 MiB)
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

const WORKFLOW_FILE_TYPES: &[(&str, &str)] = &[("application/json", "json"), ("application/zip", "zip")];

/// Upload destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    /// Profile pictures
    Avatars,

    /// Workflow screenshots and exported workflow files
    Workflows,

    /// News and event images (admins only)
    Content,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Avatars => "avatars",
            Bucket::Workflows => "workflows",
            Bucket::Content => "content",
        }
    }

    pub fn requires_admin(&self) -> bool {
        matches!(self, Bucket::Content)
    }

    /// File extension for an allowed content type, `None` if not allowed
    pub fn extension_for(&self, content_type: &str) -> Option<&'static str> {
        let content_type = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        let extra: &[(&str, &str)] = match self {
            Bucket::Workflows => WORKFLOW_FILE_TYPES,
            _ => &[],
        };

        IMAGE_TYPES
            .iter()
            .chain(extra)
            .find(|(mime, _)| *mime == content_type)
            .map(|(_, ext)| *ext)
    }
}

impl FromStr for Bucket {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "avatars" => Ok(Bucket::Avatars),
            "workflows" => Ok(Bucket::Workflows),
            "content" => Ok(Bucket::Content),
            other => Err(StorageError::UnknownBucket(other.to_string())),
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful upload
#[derive(Debug, Clone, Serialize)]
pub struct StoredObject {
    pub bucket: Bucket,
    pub key: String,
    pub url: String,
    pub content_type: String,
    pub size_bytes: usize,

    /// Hex SHA-256 of the file contents
    pub checksum: String,
}

/// Checks an upload against the bucket policy and returns the file extension
pub fn validate_upload(
    bucket: Bucket,
    content_type: &str,
    size: usize,
    max_bytes: usize,
) -> Result<&'static str, StorageError> {
    if size == 0 {
        return Err(StorageError::Empty);
    }

    if size > max_bytes {
        return Err(StorageError::TooLarge { size, limit: max_bytes });
    }

    bucket
        .extension_for(content_type)
        .ok_or_else(|| StorageError::DisallowedType {
            bucket: bucket.to_string(),
            content_type: content_type.to_string(),
        })
}

/// Builds `<bucket>/<user_id>/<uuid>.<ext>`
pub fn object_key(bucket: Bucket, user_id: Uuid, extension: &str) -> String {
    format!("{}/{}/{}.{}", bucket, user_id, Uuid::new_v4(), extension)
}

/// Validates and stores an upload
pub async fn store_upload(
    store: &dyn ObjectStore,
    bucket: Bucket,
    user_id: Uuid,
    content_type: &str,
    data: Bytes,
    max_bytes: usize,
) -> Result<StoredObject, StorageError> {
    let extension = validate_upload(bucket, content_type, data.len(), max_bytes)?;
    let key = object_key(bucket, user_id, extension);
    let checksum = hex::encode(Sha256::digest(&data));
    let size_bytes = data.len();

    store.put(&key, data, content_type).await?;

    tracing::info!(%bucket, %user_id, key = %key, size_bytes, "Upload stored");

    Ok(StoredObject {
        bucket,
        url: store.public_url(&key),
        key,
        content_type: content_type.to_string(),
        size_bytes,
        checksum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalObjectStore;

    #[test]
    fn test_bucket_parse() {
        assert_eq!("avatars".parse::<Bucket>().unwrap(), Bucket::Avatars);
        assert_eq!("content".parse::<Bucket>().unwrap(), Bucket::Content);
        assert!(matches!("private".parse::<Bucket>(), Err(StorageError::UnknownBucket(_))));
    }

    #[test]
    fn test_only_content_requires_admin() {
        assert!(Bucket::Content.requires_admin());
        assert!(!Bucket::Avatars.requires_admin());
        assert!(!Bucket::Workflows.requires_admin());
    }

    #[test]
    fn test_allowed_types() {
        assert_eq!(Bucket::Avatars.extension_for("image/png"), Some("png"));
        assert_eq!(Bucket::Avatars.extension_for("IMAGE/JPEG"), Some("jpg"));
        assert_eq!(Bucket::Content.extension_for("image/webp; charset=binary"), Some("webp"));
        assert_eq!(Bucket::Workflows.extension_for("application/json"), Some("json"));
        assert_eq!(Bucket::Avatars.extension_for("application/json"), None);
        assert_eq!(Bucket::Avatars.extension_for("image/svg+xml"), None);
        assert_eq!(Bucket::Workflows.extension_for("text/html"), None);
    }

    #[test]
    fn test_size_limits() {
        assert!(validate_upload(Bucket::Avatars, "image/png", MAX_UPLOAD_BYTES, MAX_UPLOAD_BYTES).is_ok());
        assert!(matches!(
            validate_upload(Bucket::Avatars, "image/png", MAX_UPLOAD_BYTES + 1, MAX_UPLOAD_BYTES),
            Err(StorageError::TooLarge { .. })
        ));
        assert!(matches!(
            validate_upload(Bucket::Avatars, "image/png", 0, MAX_UPLOAD_BYTES),
            Err(StorageError::Empty)
        ));
    }

    #[test]
    fn test_object_key_layout() {
        let user = Uuid::new_v4();
        let key = object_key(Bucket::Workflows, user, "zip");

        let parts: Vec<&str> = key.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "workflows");
        assert_eq!(parts[1], user.to_string());
        assert!(parts[2].ends_with(".zip"));
    }

    #[tokio::test]
    async fn test_store_upload() {
        let root = std::env::temp_dir().join(format!("creatorhub-upload-{}", Uuid::new_v4()));
        let store = LocalObjectStore::new(&root, "http://localhost:8080/storage").await.unwrap();
        let user = Uuid::new_v4();

        let stored = store_upload(
            &store,
            Bucket::Avatars,
            user,
            "image/gif",
            Bytes::from_static(b"GIF89a"),
            MAX_UPLOAD_BYTES,
        )
        .await
        .unwrap();

        assert!(stored.url.starts_with(&format!("http://localhost:8080/storage/avatars/{user}/")));
        assert_eq!(stored.size_bytes, 6);
        assert_eq!(stored.checksum.len(), 64);
        assert!(root.join(&stored.key).exists());

        tokio::fs::remove_dir_all(&root).await.ok();
    }

    #[tokio::test]
    async fn test_store_upload_rejects_before_writing() {
        let root = std::env::temp_dir().join(format!("creatorhub-upload-{}", Uuid::new_v4()));
        let store = LocalObjectStore::new(&root, "http://localhost/storage").await.unwrap();

        let result = store_upload(
            &store,
            Bucket::Avatars,
            Uuid::new_v4(),
            "application/x-msdownload",
            Bytes::from_static(b"MZ"),
            MAX_UPLOAD_BYTES,
        )
        .await;

        assert!(matches!(result, Err(StorageError::DisallowedType { .. })));
        assert!(!root.join("avatars").exists());

        tokio::fs::remove_dir_all(&root).await.ok();
    }
}
