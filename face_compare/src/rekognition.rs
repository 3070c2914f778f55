//! Face comparison and detection backed by AWS Rekognition `CompareFaces`
//! and `DetectFaces`.

use anyhow::anyhow;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_rekognition::{
    config::Region,
    error::{DisplayErrorContext, SdkError},
    primitives::Blob,
    types::{self, Attribute, Image},
    Client,
};
use bytes::Bytes;
use tracing::debug;

use crate::{
    AgeRange,
    BoundingBox,
    CompareError,
    CompareResult,
    FaceComparer,
    FaceDetail,
    FaceDetector,
};

pub struct RekognitionComparer {
    client: Client,
}

impl RekognitionComparer {
    /// Build a client from the default AWS credential chain.
    pub async fn new(region: Option<String>) -> Self {
        let mut config_loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(r) = region {
            config_loader = config_loader.region(Region::new(r));
        }
        let aws_config = config_loader.load().await;
        Self::from_client(Client::new(&aws_config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn service_error<E, R>(rejected_input: bool, e: SdkError<E, R>) -> CompareError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = DisplayErrorContext(e).to_string();
    if rejected_input {
        CompareError::InvalidImage { reason: message }
    } else {
        CompareError::Service {
            source: anyhow!(message),
        }
    }
}

fn face_detail(face: &types::FaceDetail) -> FaceDetail {
    FaceDetail {
        confidence: face.confidence().unwrap_or_default(),
        bounding_box: face.bounding_box().map(|b| BoundingBox {
            left: b.left().unwrap_or_default(),
            top: b.top().unwrap_or_default(),
            width: b.width().unwrap_or_default(),
            height: b.height().unwrap_or_default(),
        }),
        age_range: face.age_range().and_then(|range| {
            Some(AgeRange {
                low: range.low()?,
                high: range.high()?,
            })
        }),
    }
}

fn image(bytes: Bytes) -> Image {
    Image::builder().bytes(Blob::new(bytes.to_vec())).build()
}

#[async_trait]
impl FaceComparer for RekognitionComparer {
    async fn similarities(&self, source: Bytes, target: Bytes) -> CompareResult<Vec<f32>> {
        let output = self
            .client
            .compare_faces()
            .source_image(image(source))
            .target_image(image(target))
            .send()
            .await
            .map_err(|e| {
                let rejected_input = e.as_service_error().is_some_and(|se| {
                    se.is_invalid_image_format_exception()
                        || se.is_invalid_parameter_exception()
                        || se.is_image_too_large_exception()
                });
                service_error(rejected_input, e)
            })?;

        let scores: Vec<f32> = output
            .face_matches()
            .iter()
            .filter_map(|m| m.similarity())
            .collect();
        debug!(
            candidates = scores.len(),
            unmatched = output.unmatched_faces().len(),
            "rekognition compare_faces"
        );
        Ok(scores)
    }
}

#[async_trait]
impl FaceDetector for RekognitionComparer {
    async fn detect_faces(&self, image_bytes: Bytes) -> CompareResult<Vec<FaceDetail>> {
        let output = self
            .client
            .detect_faces()
            .image(image(image_bytes))
            .attributes(Attribute::All)
            .send()
            .await
            .map_err(|e| {
                let rejected_input = e.as_service_error().is_some_and(|se| {
                    se.is_invalid_image_format_exception()
                        || se.is_invalid_parameter_exception()
                        || se.is_image_too_large_exception()
                });
                service_error(rejected_input, e)
            })?;

        let faces: Vec<FaceDetail> = output.face_details().iter().map(face_detail).collect();
        debug!(faces = faces.len(), "rekognition detect_faces");
        Ok(faces)
    }
}
