//! Blob storage configuration.

use serde::{Deserialize, Serialize};

/// Configuration for blob storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobStorageConfig {
    /// Storage location: `s3://bucket`, `file:///path` or `memory://`.
    #[serde(default = "default_blob_store_path")]
    pub path: String,

    /// AWS region (for S3).
    #[serde(default)]
    pub region: Option<String>,
}

impl Default for BlobStorageConfig {
    fn default() -> Self {
        Self {
            path: default_blob_store_path(),
            region: None,
        }
    }
}

/// Default bucket holding the sorted photos.
pub fn default_blob_store_path() -> String {
    "s3://mainbuckets123".to_string()
}
