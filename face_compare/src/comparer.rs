//! The face comparison seam and the threshold decision built on it.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::CompareResult;

/// External face comparison capability.
#[async_trait]
pub trait FaceComparer: Send + Sync {
    /// Similarity scores (0-100) of every face in `target` that resembles the
    /// largest face in `source`. An empty list means no candidate at all.
    async fn similarities(&self, source: Bytes, target: Bytes) -> CompareResult<Vec<f32>>;
}

/// Turns similarity scores into a match decision.
#[derive(Clone)]
pub struct Comparator {
    comparer: Arc<dyn FaceComparer>,
    threshold: f32,
}

impl Comparator {
    pub fn new(comparer: Arc<dyn FaceComparer>, threshold: f32) -> Self {
        Self {
            comparer,
            threshold,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Highest similarity between the two images, `None` without candidates.
    pub async fn top_similarity(&self, source: Bytes, target: Bytes) -> CompareResult<Option<f32>> {
        let scores = self.comparer.similarities(source, target).await?;
        Ok(scores.into_iter().reduce(f32::max))
    }

    /// True iff the best candidate scores strictly above the threshold.
    pub async fn matches(&self, source: Bytes, target: Bytes) -> CompareResult<bool> {
        let top = self.top_similarity(source, target).await?;
        debug!(?top, threshold = self.threshold, "compared faces");
        Ok(top.is_some_and(|score| score > self.threshold))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;
    use crate::CompareError;

    struct FixedScores(Vec<f32>);

    #[async_trait]
    impl FaceComparer for FixedScores {
        async fn similarities(&self, _source: Bytes, _target: Bytes) -> CompareResult<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    struct Unavailable;

    #[async_trait]
    impl FaceComparer for Unavailable {
        async fn similarities(&self, _source: Bytes, _target: Bytes) -> CompareResult<Vec<f32>> {
            Err(CompareError::Service {
                source: anyhow!("throttled"),
            })
        }
    }

    async fn matches(scores: &[f32]) -> bool {
        Comparator::new(Arc::new(FixedScores(scores.to_vec())), 90.0)
            .matches(Bytes::new(), Bytes::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_threshold_is_exclusive() {
        assert!(!matches(&[]).await);
        assert!(!matches(&[90.0]).await);
        assert!(matches(&[90.5]).await);
        assert!(!matches(&[40.0, 89.9]).await);
    }

    #[tokio::test]
    async fn test_uses_best_candidate() {
        assert!(matches(&[12.0, 99.2, 50.0]).await);
        let comparator = Comparator::new(Arc::new(FixedScores(vec![70.0, 95.0])), 90.0);
        assert_eq!(
            comparator
                .top_similarity(Bytes::new(), Bytes::new())
                .await
                .unwrap(),
            Some(95.0)
        );
    }

    #[tokio::test]
    async fn test_service_errors_propagate() {
        let comparator = Comparator::new(Arc::new(Unavailable), 90.0);
        let err = comparator
            .matches(Bytes::new(), Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CompareError::Service { .. }));
        assert!(err.to_string().contains("throttled"));
    }
}
