use std::{collections::HashSet, env, net::SocketAddr, path::PathBuf};

use anyhow::{anyhow, Result};
use blob_store::BlobStorageConfig;
use face_compare::FaceCompareConfig;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// A labelled image that uploads are compared against. The label doubles as
/// the destination folder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferenceImage {
    pub label: String,
    pub path: PathBuf,
}

impl ReferenceImage {
    pub fn new(label: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.to_string(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub enable_tracing: bool,
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub env: String,
    pub instance_id: Option<String>,
    pub listen_addr: String,
    pub structured_logging: bool,
    pub telemetry: TelemetryConfig,
    pub blob_storage: BlobStorageConfig,
    pub face_compare: FaceCompareConfig,
    /// Compared in order; the first match wins.
    pub references: Vec<ReferenceImage>,
    pub fallback_folder: String,
    pub staging_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Most files accepted by one batch upload.
    pub max_batch_files: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            env: "local".to_string(),
            instance_id: None,
            listen_addr: "0.0.0.0:8900".to_string(),
            structured_logging: false,
            telemetry: TelemetryConfig::default(),
            blob_storage: BlobStorageConfig::default(),
            face_compare: FaceCompareConfig::default(),
            references: vec![
                ReferenceImage::new("A", "base_images/A.jpeg"),
                ReferenceImage::new("B", "base_images/B.png"),
                ReferenceImage::new("C", "base_images/C.jpeg"),
            ],
            fallback_folder: "new_face".to_string(),
            staging_dir: env::temp_dir(),
            max_upload_bytes: 20 * 1024 * 1024,
            max_batch_files: 12,
        }
    }
}

impl ServerConfig {
    pub fn from_path(path: &str) -> Result<ServerConfig> {
        let config_str = std::fs::read_to_string(path)?;
        Self::from_yaml(&config_str)
    }

    pub fn from_yaml(config_str: &str) -> Result<ServerConfig> {
        let config: ServerConfig = Figment::new().merge(Yaml::string(config_str)).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn instance_id(&self) -> String {
        self.instance_id
            .clone()
            .unwrap_or_else(|| format!("face-sorter-{}", self.env))
    }

    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(anyhow!("invalid listen address: {}", self.listen_addr));
        }
        let threshold = self.face_compare.similarity_threshold;
        if !(0.0..=100.0).contains(&threshold) {
            return Err(anyhow!(
                "similarity threshold must be between 0 and 100, got {}",
                threshold
            ));
        }
        if self.max_batch_files == 0 {
            return Err(anyhow!("max_batch_files must be at least 1"));
        }
        validate_folder_name("fallback folder", &self.fallback_folder)?;
        let mut labels = HashSet::new();
        for reference in &self.references {
            validate_folder_name("reference label", &reference.label)?;
            if !labels.insert(reference.label.as_str()) {
                return Err(anyhow!("duplicate reference label: {}", reference.label));
            }
        }
        Ok(())
    }
}

fn validate_folder_name(what: &str, name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') {
        return Err(anyhow!("{} must be non-empty and contain no '/': {:?}", what, name));
    }
    Ok(())
}
