//! In-process blob store backend.

use std::{collections::BTreeMap, sync::RwLock};

use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;

use crate::{listing::list_keys, BlobError, BlobResult, BlobStore, Listing};

/// Blob store that keeps every object in memory. Used for `memory://`
/// storage paths and in tests.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the object stored at `key`, if any.
    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.objects
            .read()
            .ok()
            .and_then(|objects| objects.get(key).cloned())
    }

    /// All keys currently stored, in lexicographic order.
    pub fn keys(&self) -> Vec<String> {
        self.objects
            .read()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }
}

fn poisoned<T>(_: T) -> BlobError {
    BlobError::Other {
        source: anyhow!("memory blob store lock poisoned"),
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put_object(&self, key: &str, data: Bytes) -> BlobResult<()> {
        self.objects
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), data);
        Ok(())
    }

    async fn list(&self, prefix: &str, delimited: bool) -> BlobResult<Listing> {
        let objects = self.objects.read().map_err(poisoned)?;
        Ok(list_keys(
            objects.keys().map(String::as_str),
            prefix,
            delimited,
        ))
    }

    async fn delete_object(&self, key: &str) -> BlobResult<()> {
        self.objects.write().map_err(poisoned)?.remove(key);
        Ok(())
    }

    async fn copy_object(&self, from: &str, to: &str) -> BlobResult<()> {
        let mut objects = self.objects.write().map_err(poisoned)?;
        let data = objects.get(from).cloned().ok_or_else(|| BlobError::NotFound {
            key: from.to_string(),
        })?;
        objects.insert(to.to_string(), data);
        Ok(())
    }
}
