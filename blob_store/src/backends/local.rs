//! Local filesystem blob store backend.
//!
//! Objects are files under a root directory. A key ending in `/` is a
//! folder marker and maps to a directory, so empty folders survive on disk
//! the same way marker objects do in S3.

use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::{
    listing::{list_keys, DELIMITER},
    BlobError,
    BlobResult,
    BlobStore,
    Listing,
};

/// Local filesystem blob store.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> BlobResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        debug!(root = %root.display(), "Created local blob store");
        Ok(Self { root })
    }

    /// Create a store from a `file://` URI.
    pub async fn from_uri(uri: &str) -> BlobResult<Self> {
        let path = uri
            .strip_prefix("file://")
            .ok_or_else(|| BlobError::InvalidUri {
                uri: uri.to_string(),
                reason: "URI must start with file://".to_string(),
            })?;
        Self::new(path).await
    }

    fn path_for_key(&self, key: &str) -> BlobResult<PathBuf> {
        let relative = Path::new(key.trim_end_matches(DELIMITER));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if relative.as_os_str().is_empty() || escapes {
            return Err(BlobError::InvalidUri {
                uri: key.to_string(),
                reason: "key must be a relative path without '.' or '..' segments".to_string(),
            });
        }
        Ok(self.root.join(relative))
    }

    /// Every key under the root: files as-is, directories as `dir/` markers.
    async fn all_keys(&self) -> BlobResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut pending = vec![(self.root.clone(), String::new())];
        while let Some((dir, key_prefix)) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                    continue;
                };
                let key = format!("{}{}", key_prefix, name);
                if entry.file_type().await?.is_dir() {
                    let marker = format!("{}{}", key, DELIMITER);
                    pending.push((entry.path(), marker.clone()));
                    keys.push(marker);
                } else {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }

    async fn is_empty_dir(path: &Path) -> BlobResult<bool> {
        let mut entries = tokio::fs::read_dir(path).await?;
        Ok(entries.next_entry().await?.is_none())
    }
}

fn not_found_is_ok(result: std::io::Result<()>) -> BlobResult<()> {
    match result {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(BlobError::IoError { source: e }),
        _ => Ok(()),
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put_object(&self, key: &str, data: Bytes) -> BlobResult<()> {
        let path = self.path_for_key(key)?;
        if key.ends_with(DELIMITER) {
            tokio::fs::create_dir_all(&path).await?;
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;
        Ok(())
    }

    async fn list(&self, prefix: &str, delimited: bool) -> BlobResult<Listing> {
        let keys = self.all_keys().await?;
        Ok(list_keys(keys.iter().map(String::as_str), prefix, delimited))
    }

    async fn delete_object(&self, key: &str) -> BlobResult<()> {
        let path = self.path_for_key(key)?;
        if !key.ends_with(DELIMITER) {
            return not_found_is_ok(tokio::fs::remove_file(&path).await);
        }
        // A marker of a folder that still holds objects is implied by them.
        match Self::is_empty_dir(&path).await {
            Ok(true) => not_found_is_ok(tokio::fs::remove_dir(&path).await),
            Ok(false) => Ok(()),
            Err(BlobError::IoError { source }) if source.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn copy_object(&self, from: &str, to: &str) -> BlobResult<()> {
        let source = self.path_for_key(from)?;
        let target = self.path_for_key(to)?;
        let metadata = tokio::fs::metadata(&source).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                BlobError::NotFound {
                    key: from.to_string(),
                }
            } else {
                BlobError::IoError { source: e }
            }
        })?;
        if metadata.is_dir() {
            tokio::fs::create_dir_all(&target).await?;
            return Ok(());
        }
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&source, &target).await?;
        Ok(())
    }
}
