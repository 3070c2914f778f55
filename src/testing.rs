use std::{
    collections::{HashMap, HashSet},
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
        Mutex,
    },
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::Router;
use blob_store::{
    BlobError,
    BlobResult,
    BlobStorageConfig,
    BlobStore,
    FolderStorage,
    Listing,
    MemoryBlobStore,
};
use bytes::Bytes;
use face_compare::{
    Comparator,
    CompareError,
    CompareResult,
    FaceComparer,
    FaceDetail,
    FaceDetector,
};
use tempfile::TempDir;
use tracing::subscriber;
use tracing_subscriber::{layer::SubscriberExt, Layer};

use crate::{
    config::{ReferenceImage, ServerConfig},
    metrics::Metrics,
    routes::{create_routes, RouteState},
    sorter::PhotoSorter,
    staging::StagedPhoto,
};

/// Face comparer scripted by the content of the target image. Reference
/// fixtures contain their label, so scores are keyed by label.
///
/// As a detector it finds one face in every image except those whose
/// content was registered with `faceless` or `undetectable`.
#[derive(Default)]
pub struct ScriptedComparer {
    scores: HashMap<String, f32>,
    failing: HashSet<String>,
    faceless: HashSet<String>,
    undetectable: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedComparer {
    pub fn score(mut self, label: &str, score: f32) -> Self {
        self.scores.insert(label.to_string(), score);
        self
    }

    pub fn fail(mut self, label: &str) -> Self {
        self.failing.insert(label.to_string());
        self
    }

    pub fn faceless(mut self, content: &str) -> Self {
        self.faceless.insert(content.to_string());
        self
    }

    pub fn undetectable(mut self, content: &str) -> Self {
        self.undetectable.insert(content.to_string());
        self
    }

    /// Labels compared so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FaceComparer for ScriptedComparer {
    async fn similarities(&self, _source: Bytes, target: Bytes) -> CompareResult<Vec<f32>> {
        let label = String::from_utf8_lossy(&target).to_string();
        self.calls.lock().unwrap().push(label.clone());
        if self.failing.contains(&label) {
            return Err(CompareError::InvalidImage {
                reason: "no face in image".to_string(),
            });
        }
        Ok(self.scores.get(&label).copied().into_iter().collect())
    }
}

#[async_trait]
impl FaceDetector for ScriptedComparer {
    async fn detect_faces(&self, image: Bytes) -> CompareResult<Vec<FaceDetail>> {
        let content = String::from_utf8_lossy(&image).to_string();
        if self.undetectable.contains(&content) {
            return Err(CompareError::InvalidImage {
                reason: "unsupported image format".to_string(),
            });
        }
        if self.faceless.contains(&content) {
            return Ok(Vec::new());
        }
        Ok(vec![FaceDetail {
            confidence: 99.0,
            bounding_box: None,
            age_range: None,
        }])
    }
}

/// Memory store with switchable failures.
#[derive(Default)]
pub struct FaultyBlobStore {
    pub inner: MemoryBlobStore,
    fail_puts: AtomicBool,
    fail_lists: AtomicBool,
    fail_copies_of: Mutex<HashSet<String>>,
    fail_deletes_of: Mutex<HashSet<String>>,
}

impl FaultyBlobStore {
    pub fn fail_puts(&self) {
        self.fail_puts.store(true, Ordering::SeqCst);
    }

    pub fn fail_lists(&self) {
        self.fail_lists.store(true, Ordering::SeqCst);
    }

    pub fn fail_copy_of(&self, key: &str) {
        self.fail_copies_of.lock().unwrap().insert(key.to_string());
    }

    pub fn fail_delete_of(&self, key: &str) {
        self.fail_deletes_of.lock().unwrap().insert(key.to_string());
    }

    fn injected(what: &str) -> BlobError {
        BlobError::NetworkError {
            source: anyhow!("injected {} failure", what),
        }
    }
}

#[async_trait]
impl BlobStore for FaultyBlobStore {
    async fn put_object(&self, key: &str, data: Bytes) -> BlobResult<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(Self::injected("put"));
        }
        self.inner.put_object(key, data).await
    }

    async fn list(&self, prefix: &str, delimited: bool) -> BlobResult<Listing> {
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(Self::injected("list"));
        }
        self.inner.list(prefix, delimited).await
    }

    async fn delete_object(&self, key: &str) -> BlobResult<()> {
        if self.fail_deletes_of.lock().unwrap().contains(key) {
            return Err(Self::injected("delete"));
        }
        self.inner.delete_object(key).await
    }

    async fn copy_object(&self, from: &str, to: &str) -> BlobResult<()> {
        if self.fail_copies_of.lock().unwrap().contains(from) {
            return Err(Self::injected("copy"));
        }
        self.inner.copy_object(from, to).await
    }
}

/// Reference images A, B and C on disk, a memory-backed store and a
/// scripted comparer, wired the way `Service` wires the real ones.
pub struct TestFixture {
    pub dir: TempDir,
    pub store: Arc<FaultyBlobStore>,
    pub comparer: Arc<ScriptedComparer>,
    pub config: ServerConfig,
}

impl TestFixture {
    pub fn new(comparer: ScriptedComparer) -> Result<Self> {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
        let _ = subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_filter(env_filter)),
        );

        let dir = tempfile::tempdir()?;
        let base_images = dir.path().join("base_images");
        std::fs::create_dir_all(&base_images)?;
        let mut references = Vec::new();
        for (label, file) in [("A", "A.jpeg"), ("B", "B.png"), ("C", "C.jpeg")] {
            let path = base_images.join(file);
            std::fs::write(&path, label)?;
            references.push(ReferenceImage::new(label, path));
        }

        let config = ServerConfig {
            blob_storage: BlobStorageConfig {
                path: "memory://".to_string(),
                region: None,
            },
            references,
            staging_dir: dir.path().join("staging"),
            ..Default::default()
        };

        Ok(Self {
            dir,
            store: Arc::new(FaultyBlobStore::default()),
            comparer: Arc::new(comparer),
            config,
        })
    }

    pub fn reference_path(&self, label: &str) -> PathBuf {
        self.config
            .references
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.path.clone())
            .unwrap()
    }

    pub async fn remove_reference(&self, label: &str) -> Result<()> {
        tokio::fs::remove_file(self.reference_path(label)).await?;
        Ok(())
    }

    pub async fn stage(&self, file_name: &str, data: &[u8]) -> Result<StagedPhoto> {
        StagedPhoto::write(&self.config.staging_dir, file_name, data).await
    }

    pub fn folders(&self) -> FolderStorage {
        FolderStorage::new(self.store.clone())
    }

    pub fn sorter(&self) -> PhotoSorter {
        PhotoSorter::new(
            Comparator::new(
                self.comparer.clone(),
                self.config.face_compare.similarity_threshold,
            ),
            self.folders(),
            self.config.references.clone(),
            self.config.fallback_folder.clone(),
        )
    }

    pub fn router(&self) -> Router {
        create_routes(RouteState {
            sorter: Arc::new(self.sorter()),
            folders: Arc::new(self.folders()),
            detector: self.comparer.clone(),
            staging_dir: self.config.staging_dir.clone(),
            max_batch_files: self.config.max_batch_files,
            metrics: Arc::new(Metrics::new()),
        })
        .layer(axum::extract::DefaultBodyLimit::max(
            self.config.max_upload_bytes,
        ))
    }
}
