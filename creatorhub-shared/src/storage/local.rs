//! Filesystem-backed object store

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, info};

use super::{validate_key, ObjectStore, StorageError};

/// Stores objects as files under a root directory
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root_dir: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    /// Opens (and creates if needed) a store rooted at `root_dir`
    ///
    /// `public_base_url` is the URL prefix objects are served from, e.g.
    /// `http://localhost:8080/storage`.
    pub async fn new<P: AsRef<Path>>(root_dir: P, public_base_url: &str) -> Result<Self, StorageError> {
        let root_dir = root_dir.as_ref().to_path_buf();
        fs::create_dir_all(&root_dir).await?;

        info!(path = %root_dir.display(), "Initialized object store");

        Ok(Self {
            root_dir,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let path = self.object_path(key);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write then rename so readers never see a partial file
        let tmp = path.with_extension("partial");
        fs::write(&tmp, &data).await?;
        fs::rename(&tmp, &path).await?;

        debug!(key, size = data.len(), content_type, "Stored object");
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}
