//! Face matching against reference images.
//!
//! [`FaceComparer`] is the external similarity capability, implemented for
//! AWS Rekognition by [`RekognitionComparer`]. [`Comparator`] applies the
//! match threshold to its scores. [`FaceDetector`] reports the faces found
//! in a single image.

mod comparer;
mod config;
mod detector;
mod error;
mod rekognition;

pub use comparer::{Comparator, FaceComparer};
pub use config::{default_similarity_threshold, FaceCompareConfig};
pub use detector::{AgeRange, BoundingBox, FaceDetail, FaceDetector};
pub use error::{CompareError, CompareResult};
pub use rekognition::RekognitionComparer;
