//! Configuration for the face comparison client.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceCompareConfig {
    /// AWS region override for the comparison service.
    #[serde(default)]
    pub region: Option<String>,

    /// A pair of images matches when the best similarity score is strictly
    /// above this value (0-100).
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
}

impl Default for FaceCompareConfig {
    fn default() -> Self {
        Self {
            region: None,
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

pub fn default_similarity_threshold() -> f32 {
    90.0
}
