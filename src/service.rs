use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum_server::Handle;
use blob_store::{new_blob_store, FolderStorage};
use face_compare::{Comparator, FaceDetector, RekognitionComparer};
use tokio::{self, signal};
use tracing::{error, info};

use super::routes::RouteState;
use crate::{config::ServerConfig, metrics::Metrics, routes::create_routes, sorter::PhotoSorter};

#[derive(Clone)]
pub struct Service {
    pub config: ServerConfig,
    pub folders: Arc<FolderStorage>,
    pub sorter: Arc<PhotoSorter>,
    pub detector: Arc<dyn FaceDetector>,
    pub metrics: Arc<Metrics>,
}

impl Service {
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let blob_store = new_blob_store(&config.blob_storage)
            .await
            .context("error initializing blob store")?;
        let folders = FolderStorage::new(blob_store);

        let rekognition =
            Arc::new(RekognitionComparer::new(config.face_compare.region.clone()).await);
        let comparator = Comparator::new(
            rekognition.clone(),
            config.face_compare.similarity_threshold,
        );

        let sorter = Arc::new(PhotoSorter::new(
            comparator,
            folders.clone(),
            config.references.clone(),
            config.fallback_folder.clone(),
        ));

        info!(
            blob_store = %config.blob_storage.path,
            references = config.references.len(),
            threshold = config.face_compare.similarity_threshold,
            "service initialized"
        );

        Ok(Self {
            config,
            folders: Arc::new(folders),
            sorter,
            detector: rekognition,
            metrics: Arc::new(Metrics::new()),
        })
    }

    pub async fn start(&self) -> Result<()> {
        let route_state = RouteState {
            sorter: self.sorter.clone(),
            folders: self.folders.clone(),
            detector: self.detector.clone(),
            staging_dir: self.config.staging_dir.clone(),
            max_batch_files: self.config.max_batch_files,
            metrics: self.metrics.clone(),
        };

        let handle = Handle::new();
        let handle_sh = handle.clone();
        tokio::spawn(async move {
            shutdown_signal(handle_sh).await;
            info!("graceful shutdown signal received, shutting down server gracefully");
        });

        let addr: SocketAddr = self
            .config
            .listen_addr
            .parse()
            .with_context(|| format!("invalid listen address {}", self.config.listen_addr))?;
        info!("server api listening on {}", self.config.listen_addr);
        let routes = create_routes(route_state)
            .layer(DefaultBodyLimit::max(self.config.max_upload_bytes));
        axum_server::bind(addr)
            .handle(handle)
            .serve(routes.into_make_service())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {:?}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("failed to install signal handler: {:?}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
        },
        _ = terminate => {
        },
    }
    handle.shutdown();
    info!("signal received, shutting down server gracefully");
}
