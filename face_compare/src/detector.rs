//! Per-image face detection, reported alongside batch uploads.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::CompareResult;

/// Position of a face as ratios of the image width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgeRange {
    pub low: i32,
    pub high: i32,
}

/// One face found in an image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceDetail {
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_range: Option<AgeRange>,
}

#[async_trait]
pub trait FaceDetector: Send + Sync {
    /// Every face in `image`; an image without faces yields an empty list.
    async fn detect_faces(&self, image: Bytes) -> CompareResult<Vec<FaceDetail>>;
}
