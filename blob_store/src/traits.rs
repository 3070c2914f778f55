//! Core blob store trait.

use async_trait::async_trait;
use bytes::Bytes;

use crate::BlobResult;

/// Result of a single listing call.
///
/// Mirrors S3 `ListObjectsV2`: with a delimiter, keys sharing the next
/// `/`-terminated segment after the prefix are rolled up into
/// `common_prefixes` (each ending in `/`); the remaining keys land in `keys`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub common_prefixes: Vec<String>,
    pub keys: Vec<String>,
}

/// Flat key/value object store with prefix listing.
///
/// Keys are opaque strings. A key ending in `/` is a regular (usually empty)
/// object, conventionally used as a folder marker.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `key`, replacing any existing object.
    async fn put_object(&self, key: &str, data: Bytes) -> BlobResult<()>;

    /// List keys starting with `prefix`. When `delimited` is set, keys are
    /// grouped on the next `/` after the prefix.
    async fn list(&self, prefix: &str, delimited: bool) -> BlobResult<Listing>;

    /// Delete the object at `key`. Deleting a missing key succeeds.
    async fn delete_object(&self, key: &str) -> BlobResult<()>;

    /// Copy the object at `from` to `to`.
    ///
    /// Returns `BlobError::NotFound` if `from` doesn't exist.
    async fn copy_object(&self, from: &str, to: &str) -> BlobResult<()>;
}
