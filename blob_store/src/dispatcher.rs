//! Picks the blob store backend from the storage URI scheme.

use std::sync::Arc;

use crate::{
    backends::{local::LocalBlobStore, memory::MemoryBlobStore, s3::S3BlobStore},
    BlobError,
    BlobResult,
    BlobStorageConfig,
    BlobStore,
};

/// Build the backend named by `config.path`.
pub async fn new_blob_store(config: &BlobStorageConfig) -> BlobResult<Arc<dyn BlobStore>> {
    let scheme = extract_scheme(&config.path)?;
    let store: Arc<dyn BlobStore> = match scheme.as_str() {
        "s3" => Arc::new(S3BlobStore::new(&config.path, config.region.clone()).await?),
        "file" => Arc::new(LocalBlobStore::from_uri(&config.path).await?),
        "memory" => Arc::new(MemoryBlobStore::new()),
        _ => return Err(BlobError::UnsupportedBackend { scheme }),
    };
    Ok(store)
}

fn extract_scheme(uri: &str) -> BlobResult<String> {
    let parts: Vec<&str> = uri.splitn(2, "://").collect();
    if parts.len() != 2 {
        return Err(BlobError::InvalidUri {
            uri: uri.to_string(),
            reason: "Missing scheme (expected format: scheme://...)".to_string(),
        });
    }
    Ok(parts[0].to_string())
}
