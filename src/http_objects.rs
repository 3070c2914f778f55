use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub struct ApiError {
    status_code: StatusCode,
    message: String,
    /// Extra fields merged into the JSON error body.
    details: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ApiError {
    pub fn new(status_code: StatusCode, message: &str) -> Self {
        Self {
            status_code,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal_error(e: anyhow::Error) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, &format!("{:#}", e))
    }

    pub fn internal_error_str(e: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, e)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = details {
            self.details = Some(map);
        }
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("API Error: {} - {}", self.status_code, self.message);
        let mut body = self.details.unwrap_or_default();
        body.insert("error".to_string(), json!(self.message));
        (self.status_code, Json(serde_json::Value::Object(body))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(&rejection.body_text())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub folder: String,
    pub key: String,
}

/// Outcome for one file of a batch upload. A failed file carries `error`
/// and none of the placement fields.
#[derive(Debug, Default, Serialize)]
pub struct BatchUploadResult {
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub faces: Vec<face_compare::FaceDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FolderListing {
    pub folder: String,
    pub images: Vec<String>,
}

impl From<blob_store::Folder> for FolderListing {
    fn from(folder: blob_store::Folder) -> Self {
        Self {
            folder: folder.folder,
            images: folder.images,
        }
    }
}

/// Fields are optional so a missing key is reported as a 400 with a
/// readable message rather than a deserialization error.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DeleteImageRequest {
    #[serde(default)]
    pub image_key: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RenameFolderRequest {
    #[serde(default)]
    pub old_folder_name: Option<String>,
    #[serde(default)]
    pub new_folder_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RenameFolderResponse {
    pub message: String,
    pub moved: usize,
}
