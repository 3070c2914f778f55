use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use bytes::Bytes;
use futures::future::join_all;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::RouteState;
use crate::{
    http_objects::{ApiError, BatchUploadResult, UploadResponse},
    metrics::outcome,
    sorter::SortOutcome,
    staging::{sanitize_filename, StagedPhoto},
};

const PHOTO_FIELD: &str = "photo";
const BATCH_FIELD: &str = "photos";

/// Accept a `photo` file part, stage it, and file it into the folder of the
/// first matching reference image or the fallback folder.
#[axum::debug_handler]
pub async fn upload_photo(
    State(state): State<RouteState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut files = read_files(multipart, PHOTO_FIELD, 1).await?;
    let (file_name, data) = files
        .pop()
        .ok_or_else(|| ApiError::bad_request("No file part"))?;
    if file_name.is_empty() {
        return Err(ApiError::bad_request("No selected file"));
    }
    let file_name =
        sanitize_filename(&file_name).ok_or_else(|| ApiError::bad_request("Invalid file name"))?;

    let staged = stage(&state, &file_name, &data).await?;
    match state.sorter.sort(&staged).await {
        Ok(sorted) => {
            record(&state, &sorted);
            Ok(Json(UploadResponse {
                message: sorted.message(),
                folder: sorted.folder().to_string(),
                key: sorted.key().to_string(),
            }))
        }
        Err(e) => {
            error!(
                file_name = staged.file_name(),
                "Error comparing faces or uploading photo: {:#}", e
            );
            state.metrics.upload(outcome::FAILED);
            Err(ApiError::internal_error(e))
        }
    }
}

/// Sort every `photos` file part independently and report one result per
/// file, in request order.
///
/// Stored names get a random prefix so files with the same name, in this
/// batch or an earlier one, never overwrite each other. A failing file does
/// not fail the batch.
#[axum::debug_handler]
pub async fn upload_batch(
    State(state): State<RouteState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<BatchUploadResult>>, ApiError> {
    let files = read_files(multipart, BATCH_FIELD, state.max_batch_files).await?;
    if files.is_empty() {
        return Err(ApiError::bad_request("No file part"));
    }
    info!(files = files.len(), "processing batch upload");

    let results = join_all(
        files
            .into_iter()
            .map(|(file_name, data)| sort_batch_file(&state, file_name, data)),
    )
    .await;
    Ok(Json(results))
}

/// Read the file parts named `field_name`, skipping everything else. More than
/// `limit` such parts is a bad request.
async fn read_files(
    multipart: Result<Multipart, MultipartRejection>,
    field_name: &str,
    limit: usize,
) -> Result<Vec<(String, Bytes)>, ApiError> {
    let mut multipart = multipart.map_err(|rejection| {
        debug!("upload is not a multipart request: {}", rejection.body_text());
        ApiError::bad_request("No file part")
    })?;

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(e.status(), &e.body_text()))?
    {
        // only file parts count
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if field.name() != Some(field_name) {
            continue;
        }
        if files.len() == limit {
            if limit == 1 {
                // a single-file upload uses the first part
                break;
            }
            return Err(ApiError::bad_request(&format!(
                "Too many files, at most {} per upload",
                limit
            )));
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(e.status(), &e.body_text()))?;
        files.push((file_name, data));
    }
    Ok(files)
}

async fn stage(
    state: &RouteState,
    file_name: &str,
    data: &Bytes,
) -> Result<StagedPhoto, ApiError> {
    state.metrics.upload_bytes.add(data.len() as u64, &[]);
    StagedPhoto::write(&state.staging_dir, file_name, data)
        .await
        .map_err(|e| {
            error!("Error saving file {}: {:#}", file_name, e);
            state.metrics.upload(outcome::FAILED);
            ApiError::internal_error_str("File saving error")
        })
}

fn record(state: &RouteState, sorted: &SortOutcome) {
    state.metrics.upload(match sorted {
        SortOutcome::Matched { .. } => outcome::MATCHED,
        SortOutcome::Fallback { .. } => outcome::FALLBACK,
    });
}

async fn sort_batch_file(
    state: &RouteState,
    file_name: String,
    data: Bytes,
) -> BatchUploadResult {
    let mut result = BatchUploadResult {
        file_name: file_name.clone(),
        ..Default::default()
    };
    if file_name.is_empty() {
        result.error = Some("No selected file".to_string());
        return result;
    }
    let Some(sanitized) = sanitize_filename(&file_name) else {
        result.error = Some("Invalid file name".to_string());
        return result;
    };
    let stored_name = format!("{}_{}", Uuid::new_v4(), sanitized);

    match state.detector.detect_faces(data.clone()).await {
        Ok(faces) => result.faces = faces,
        Err(e) => {
            error!(file_name = %file_name, "Error detecting faces: {}", e);
            state.metrics.upload(outcome::FAILED);
            result.error = Some(format!("Error detecting faces: {}", e));
            return result;
        }
    }

    let staged = match stage(state, &stored_name, &data).await {
        Ok(staged) => staged,
        Err(e) => {
            result.error = Some(e.message().to_string());
            return result;
        }
    };
    match state.sorter.sort(&staged).await {
        Ok(sorted) => {
            record(state, &sorted);
            result.message = Some(sorted.message());
            result.folder = Some(sorted.folder().to_string());
            result.key = Some(sorted.key().to_string());
        }
        Err(e) => {
            error!(
                file_name = %file_name,
                "Error comparing faces or uploading photo: {:#}", e
            );
            state.metrics.upload(outcome::FAILED);
            result.error = Some(format!("{:#}", e));
        }
    }
    result
}
