//! S3 blob store backend using aws-sdk-s3.
//!
//! The SDK is used directly rather than through a path-normalising client so
//! that keys keep their exact S3 form, including `folder/` markers.

use anyhow::anyhow;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::Region,
    error::{DisplayErrorContext, ProvideErrorMetadata},
    primitives::ByteStream,
    Client as S3Client,
};
use bytes::Bytes;
use tracing::debug;
use url::form_urlencoded::byte_serialize;

use crate::{listing::DELIMITER, BlobError, BlobResult, BlobStore, Listing};

/// S3 blob store backend.
pub struct S3BlobStore {
    client: S3Client,
    bucket: String,
}

impl S3BlobStore {
    /// Create a new S3 blob store from a bucket URL.
    ///
    /// # Arguments
    /// * `url` - S3 URL (e.g., `s3://bucket`)
    /// * `region` - Optional AWS region override
    pub async fn new(url: &str, region: Option<String>) -> BlobResult<Self> {
        let bucket = Self::parse_s3_url(url)?;

        let mut config_loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(r) = region {
            config_loader = config_loader.region(Region::new(r));
        }
        let aws_config = config_loader.load().await;

        debug!(bucket = %bucket, "Created S3 blob store");
        Ok(Self::from_client(S3Client::new(&aws_config), bucket))
    }

    pub fn from_client(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Extract the bucket name from an `s3://bucket` URL.
    fn parse_s3_url(url: &str) -> BlobResult<String> {
        let without_scheme = url
            .strip_prefix("s3://")
            .ok_or_else(|| BlobError::InvalidUri {
                uri: url.to_string(),
                reason: "Must start with s3://".to_string(),
            })?;

        let bucket = without_scheme.trim_end_matches(DELIMITER);
        if bucket.is_empty() || bucket.contains(DELIMITER) {
            return Err(BlobError::InvalidUri {
                uri: url.to_string(),
                reason: "expected s3://<bucket> without a key prefix".to_string(),
            });
        }
        Ok(bucket.to_string())
    }

    /// `CopySource` value: bucket plus URL-encoded key, segment by segment.
    fn copy_source(bucket: &str, key: &str) -> String {
        let encoded: Vec<String> = key
            .split(DELIMITER)
            .map(|segment| {
                byte_serialize(segment.as_bytes())
                    .collect::<String>()
                    .replace('+', "%20")
            })
            .collect();
        format!("{}/{}", bucket, encoded.join("/"))
    }
}

fn network_error(operation: &str, err: impl std::error::Error) -> BlobError {
    BlobError::NetworkError {
        source: anyhow!("failed to {}: {}", operation, DisplayErrorContext(err)),
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put_object(&self, key: &str, data: Bytes) -> BlobResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| network_error("put object", e))?;
        Ok(())
    }

    async fn list(&self, prefix: &str, delimited: bool) -> BlobResult<Listing> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_prefix((!prefix.is_empty()).then(|| prefix.to_string()))
            .set_delimiter(delimited.then(|| DELIMITER.to_string()))
            .into_paginator()
            .send();

        let mut listing = Listing::default();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| network_error("list objects", e))?;
            listing.common_prefixes.extend(
                page.common_prefixes()
                    .iter()
                    .filter_map(|p| p.prefix().map(str::to_string)),
            );
            listing.keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );
        }
        Ok(listing)
    }

    async fn delete_object(&self, key: &str) -> BlobResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| network_error("delete object", e))?;
        Ok(())
    }

    async fn copy_object(&self, from: &str, to: &str) -> BlobResult<()> {
        let result = self
            .client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(Self::copy_source(&self.bucket, from))
            .key(to)
            .send()
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if e.as_service_error().and_then(|se| se.code()) == Some("NoSuchKey") => {
                Err(BlobError::NotFound {
                    key: from.to_string(),
                })
            }
            Err(e) => Err(network_error("copy object", e)),
        }
    }
}
