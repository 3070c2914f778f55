//! Folder view over a flat blob store.
//!
//! A folder is only a key prefix: `A/photo.jpg` lives in folder `A`. An
//! empty object at `A/` marks a folder that has no images yet.

use std::{path::Path, sync::Arc};

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::{listing::DELIMITER, BlobError, BlobResult, BlobStore};

/// A top-level folder and the image keys directly under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub folder: String,
    pub images: Vec<String>,
}

/// The object that stopped a rename.
#[derive(Debug)]
pub struct RenameFailure {
    pub key: String,
    pub error: BlobError,
}

/// Outcome of moving every object from one prefix to another.
///
/// Rename is a sequence of independent copy+delete pairs. When one fails the
/// objects in `moved` are already under the new prefix, the failing object
/// may exist under both, and the rest are still under the old prefix.
#[derive(Debug, Default)]
pub struct RenameReport {
    pub total: usize,
    pub moved: Vec<String>,
    pub failure: Option<RenameFailure>,
}

impl RenameReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Clone)]
pub struct FolderStorage {
    store: Arc<dyn BlobStore>,
}

impl FolderStorage {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    pub fn object_key(folder: &str, file_name: &str) -> String {
        format!("{}{}{}", folder, DELIMITER, file_name)
    }

    fn marker_key(folder: &str) -> String {
        format!("{}{}", folder, DELIMITER)
    }

    /// Upload the file at `source` as `<folder>/<file name>`, overwriting any
    /// object already there. Returns the key written.
    pub async fn put_file(&self, folder: &str, source: &Path) -> BlobResult<String> {
        let file_name = source
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| BlobError::InvalidUri {
                uri: source.display().to_string(),
                reason: "source path has no UTF-8 file name".to_string(),
            })?;
        let key = Self::object_key(folder, file_name);
        let data = tokio::fs::read(source).await?;
        let size_bytes = data.len();
        self.store.put_object(&key, Bytes::from(data)).await?;
        info!(key = %key, size_bytes, "uploaded file");
        Ok(key)
    }

    /// Write the empty `<folder>/` marker object.
    pub async fn ensure_folder(&self, folder: &str) -> BlobResult<()> {
        self.store
            .put_object(&Self::marker_key(folder), Bytes::new())
            .await
    }

    /// List every top-level folder with the images directly inside it.
    ///
    /// Folder discovery and per-folder listing are separate calls, so an
    /// object written in between may or may not show up.
    pub async fn list_folders(&self) -> BlobResult<Vec<Folder>> {
        let top = self.store.list("", true).await?;
        let mut folders = Vec::with_capacity(top.common_prefixes.len());
        for prefix in top.common_prefixes {
            let listing = self.store.list(&prefix, true).await?;
            let images = listing
                .keys
                .into_iter()
                .filter(|key| !key.ends_with(DELIMITER))
                .collect();
            folders.push(Folder {
                folder: prefix.trim_matches(DELIMITER).to_string(),
                images,
            });
        }
        Ok(folders)
    }

    /// Delete a single object. Deleting a missing key succeeds.
    pub async fn delete_image(&self, key: &str) -> BlobResult<()> {
        self.store.delete_object(key).await?;
        info!(key = %key, "deleted image");
        Ok(())
    }

    /// Move every object under `old/` to `new/` by copy+delete.
    ///
    /// Only the initial listing failing is an `Err`; failures while moving
    /// are recorded in the report, which stops at the first one.
    pub async fn rename_folder(&self, old: &str, new: &str) -> BlobResult<RenameReport> {
        let listing = self.store.list(&Self::marker_key(old), false).await?;

        // Markers last, deepest first, so a directory-backed store only drops
        // a marker once its contents are gone.
        let (mut markers, mut keys): (Vec<String>, Vec<String>) = listing
            .keys
            .into_iter()
            .partition(|key| key.ends_with(DELIMITER));
        markers.sort_by_key(|key| std::cmp::Reverse(key.matches(DELIMITER).count()));
        keys.extend(markers);

        let mut report = RenameReport {
            total: keys.len(),
            ..Default::default()
        };
        for old_key in keys {
            let new_key = old_key.replacen(old, new, 1);
            debug!(from = %old_key, to = %new_key, "moving object");
            let moved = match self.store.copy_object(&old_key, &new_key).await {
                Ok(()) => self.store.delete_object(&old_key).await,
                Err(e) => Err(e),
            };
            if let Err(error) = moved {
                warn!(key = %old_key, moved = report.moved.len(), total = report.total, "folder rename stopped: {}", error);
                report.failure = Some(RenameFailure {
                    key: old_key,
                    error,
                });
                return Ok(report);
            }
            report.moved.push(old_key);
        }
        info!(old = %old, new = %new, moved = report.moved.len(), "renamed folder");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::{backends::memory::MemoryBlobStore, Listing};

    /// Delegates to a memory store but fails copies of the listed keys.
    struct FailingCopies {
        inner: MemoryBlobStore,
        fail_on: Vec<String>,
        copies: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BlobStore for FailingCopies {
        async fn put_object(&self, key: &str, data: Bytes) -> BlobResult<()> {
            self.inner.put_object(key, data).await
        }

        async fn list(&self, prefix: &str, delimited: bool) -> BlobResult<Listing> {
            self.inner.list(prefix, delimited).await
        }

        async fn delete_object(&self, key: &str) -> BlobResult<()> {
            self.inner.delete_object(key).await
        }

        async fn copy_object(&self, from: &str, to: &str) -> BlobResult<()> {
            self.copies.lock().unwrap().push(from.to_string());
            if self.fail_on.iter().any(|k| k == from) {
                return Err(BlobError::NetworkError {
                    source: anyhow::anyhow!("connection reset"),
                });
            }
            self.inner.copy_object(from, to).await
        }
    }

    async fn seeded(keys: &[&str]) -> Arc<MemoryBlobStore> {
        let store = Arc::new(MemoryBlobStore::new());
        for key in keys {
            store
                .put_object(key, Bytes::from(key.to_string()))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_list_folders_empty_bucket() -> BlobResult<()> {
        let folders = FolderStorage::new(Arc::new(MemoryBlobStore::new()));
        assert!(folders.list_folders().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_folders_skips_markers_and_loose_keys() -> BlobResult<()> {
        let store = seeded(&["A/photo.jpg", "new_face/", "new_face/x.png", "loose.jpg"]).await;
        let folders = FolderStorage::new(store);
        assert_eq!(
            folders.list_folders().await?,
            vec![
                Folder {
                    folder: "A".to_string(),
                    images: vec!["A/photo.jpg".to_string()],
                },
                Folder {
                    folder: "new_face".to_string(),
                    images: vec!["new_face/x.png".to_string()],
                },
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_put_file_uses_basename() -> BlobResult<()> {
        let temp_dir = tempfile::tempdir()?;
        let source = temp_dir.path().join("selfie.jpg");
        tokio::fs::write(&source, b"jpeg bytes").await?;

        let store = Arc::new(MemoryBlobStore::new());
        let folders = FolderStorage::new(store.clone());
        let key = folders.put_file("B", &source).await?;

        assert_eq!(key, "B/selfie.jpg");
        assert_eq!(
            store.object("B/selfie.jpg"),
            Some(Bytes::from_static(b"jpeg bytes"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_missing_image_succeeds() -> BlobResult<()> {
        let folders = FolderStorage::new(Arc::new(MemoryBlobStore::new()));
        folders.delete_image("A/never-existed.jpg").await
    }

    #[tokio::test]
    async fn test_rename_moves_everything() -> BlobResult<()> {
        let store = seeded(&["old/", "old/a.jpg", "old/b.jpg", "other/c.jpg"]).await;
        let folders = FolderStorage::new(store.clone());

        let report = folders.rename_folder("old", "new").await?;

        assert!(report.is_complete());
        assert_eq!(report.total, 3);
        assert_eq!(report.moved, vec!["old/a.jpg", "old/b.jpg", "old/"]);
        assert_eq!(
            store.keys(),
            vec!["new/", "new/a.jpg", "new/b.jpg", "other/c.jpg"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_rename_replaces_first_occurrence_only() -> BlobResult<()> {
        let store = seeded(&["a/a.jpg"]).await;
        let folders = FolderStorage::new(store.clone());
        folders.rename_folder("a", "b").await?;
        assert_eq!(store.keys(), vec!["b/a.jpg"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_rename_stops_at_first_failure() -> BlobResult<()> {
        let inner = MemoryBlobStore::new();
        for key in ["old/1.jpg", "old/2.jpg", "old/3.jpg"] {
            inner.put_object(key, Bytes::new()).await?;
        }
        let store = Arc::new(FailingCopies {
            inner,
            fail_on: vec!["old/2.jpg".to_string()],
            copies: Mutex::new(Vec::new()),
        });
        let folders = FolderStorage::new(store.clone());

        let report = folders.rename_folder("old", "new").await?;

        assert!(!report.is_complete());
        assert_eq!(report.total, 3);
        assert_eq!(report.moved, vec!["old/1.jpg"]);
        let failure = report.failure.unwrap();
        assert_eq!(failure.key, "old/2.jpg");
        assert!(failure.error.to_string().contains("connection reset"));

        // object 3 was never touched
        assert_eq!(
            *store.copies.lock().unwrap(),
            vec!["old/1.jpg", "old/2.jpg"]
        );
        assert_eq!(
            store.inner.keys(),
            vec!["new/1.jpg", "old/2.jpg", "old/3.jpg"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_rename_missing_folder_is_empty_success() -> BlobResult<()> {
        let folders = FolderStorage::new(Arc::new(MemoryBlobStore::new()));
        let report = folders.rename_folder("ghost", "spirit").await?;
        assert!(report.is_complete());
        assert_eq!(report.total, 0);
        Ok(())
    }
}
