//! Per-request staging of uploaded files on local disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::info;
use unicode_normalization::UnicodeNormalization;

/// Reduce a client-supplied file name to a safe basename.
///
/// Compatibility-decomposes the name and drops what is left outside ASCII,
/// so `é` becomes `e`. `/` and whitespace runs become `_`, anything outside
/// `[A-Za-z0-9_.-]` (including `\`) is dropped and leading/trailing `.` and
/// `_` are trimmed. Returns `None` when nothing usable is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let ascii: String = name.nfkd().filter(char::is_ascii).collect();
    let spaced = ascii.replace('/', " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// An uploaded file written to its own temporary directory. The directory
/// and file are removed when this is dropped.
pub struct StagedPhoto {
    dir: TempDir,
    path: PathBuf,
}

impl StagedPhoto {
    /// Write `data` as `<fresh temp dir under root>/<file_name>`.
    pub async fn write(root: &Path, file_name: &str, data: &[u8]) -> Result<Self> {
        tokio::fs::create_dir_all(root)
            .await
            .with_context(|| format!("creating staging root {}", root.display()))?;
        let dir = tempfile::Builder::new()
            .prefix("upload-")
            .tempdir_in(root)
            .with_context(|| format!("creating staging directory in {}", root.display()))?;
        let path = dir.path().join(file_name);
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("writing staged file {}", path.display()))?;
        info!("File saved to {}", path.display());
        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }

    pub fn staging_dir(&self) -> &Path {
        self.dir.path()
    }
}
