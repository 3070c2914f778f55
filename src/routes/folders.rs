use anyhow::anyhow;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use super::RouteState;
use crate::{
    http_objects::{
        ApiError,
        DeleteImageRequest,
        FolderListing,
        MessageResponse,
        RenameFolderRequest,
        RenameFolderResponse,
    },
    metrics::outcome,
};

/// List every folder with the image keys directly inside it.
pub async fn list_folders(
    State(state): State<RouteState>,
) -> Result<Json<Vec<FolderListing>>, ApiError> {
    let folders = state.folders.list_folders().await.map_err(|e| {
        error!("Error fetching folders: {}", e);
        ApiError::internal_error(anyhow!("Error fetching folders: {}", e))
    })?;
    Ok(Json(folders.into_iter().map(FolderListing::from).collect()))
}

pub async fn delete_image(
    State(state): State<RouteState>,
    request: Result<Json<DeleteImageRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = request?;
    let image_key = request
        .image_key
        .filter(|key| !key.is_empty())
        .ok_or_else(|| ApiError::bad_request("Image key is required"))?;

    state
        .folders
        .delete_image(&image_key)
        .await
        .map_err(|e| ApiError::internal_error(anyhow!("Error deleting image: {}", e)))?;
    Ok(Json(MessageResponse::new("Image deleted successfully")))
}

/// Move every object under `old_folder_name/` to `new_folder_name/`.
///
/// A rename that fails midway answers 500 with how far it got, since the
/// objects already moved are not rolled back.
pub async fn rename_folder(
    State(state): State<RouteState>,
    request: Result<Json<RenameFolderRequest>, JsonRejection>,
) -> Result<Json<RenameFolderResponse>, ApiError> {
    let Json(request) = request?;
    let (old, new) = match (request.old_folder_name, request.new_folder_name) {
        (Some(old), Some(new)) if !old.is_empty() && !new.is_empty() => (old, new),
        _ => {
            return Err(ApiError::bad_request(
                "Both old and new folder names are required",
            ))
        }
    };
    if old == new {
        return Err(ApiError::bad_request(
            "Old and new folder names must differ",
        ));
    }

    let report = state
        .folders
        .rename_folder(&old, &new)
        .await
        .map_err(|e| ApiError::internal_error(anyhow!("Error renaming folder: {}", e)))?;

    match report.failure {
        None => {
            state.metrics.rename(outcome::COMPLETE);
            Ok(Json(RenameFolderResponse {
                message: "Folder renamed successfully".to_string(),
                moved: report.moved.len(),
            }))
        }
        Some(failure) => {
            state.metrics.rename(outcome::PARTIAL);
            warn!(
                old = %old,
                new = %new,
                moved = report.moved.len(),
                total = report.total,
                "folder rename left objects under both prefixes"
            );
            Err(ApiError::internal_error(anyhow!(
                "Error renaming folder: {}",
                failure.error
            ))
            .with_details(json!({
                "moved": report.moved.len(),
                "total": report.total,
                "failed_key": failure.key,
            })))
        }
    }
}
