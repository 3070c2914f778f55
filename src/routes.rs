use std::{path::PathBuf, sync::Arc};

use axum::{
    extract::{MatchedPath, Request},
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use blob_store::FolderStorage;
use face_compare::FaceDetector;
use rust_embed::RustEmbed;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{metrics::Metrics, sorter::PhotoSorter};

mod folders;
mod upload;
use folders::{delete_image, list_folders, rename_folder};
use upload::{upload_batch, upload_photo};

#[derive(RustEmbed)]
#[folder = "ui/"]
struct UiAssets;

#[derive(Clone)]
pub struct RouteState {
    pub sorter: Arc<PhotoSorter>,
    pub folders: Arc<FolderStorage>,
    pub detector: Arc<dyn FaceDetector>,
    pub staging_dir: PathBuf,
    pub max_batch_files: usize,
    pub metrics: Arc<Metrics>,
}

pub fn create_routes(route_state: RouteState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload_photo))
        .route("/upload_batch", post(upload_batch))
        .route("/folders", get(list_folders))
        .route("/delete_image", post(delete_image))
        .route("/rename_folder", post(rename_folder))
        .with_state(route_state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request| {
                    let method = req.method();
                    let uri = req.uri();

                    let matched_path = req
                        .extensions()
                        .get::<MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::debug_span!("request", %method, %uri, matched_path)
                })
                .on_failure(()),
        )
        .layer(cors)
}

#[tracing::instrument(skip_all)]
async fn index() -> impl IntoResponse {
    match UiAssets::get("index.html") {
        Some(content) => {
            let mimetype = content.metadata.mimetype().to_string();
            ([(header::CONTENT_TYPE, mimetype)], content.data).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
