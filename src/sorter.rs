//! Matches an uploaded photo against the reference images and files it.

use std::{io::ErrorKind, path::PathBuf};

use anyhow::{Context, Result};
use blob_store::FolderStorage;
use bytes::Bytes;
use face_compare::Comparator;
use tracing::{debug, info};

use crate::{config::ReferenceImage, staging::StagedPhoto};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortOutcome {
    /// Stored in the folder of the first reference that matched.
    Matched {
        label: String,
        reference: PathBuf,
        key: String,
    },
    /// No reference matched; stored in the fallback folder.
    Fallback { folder: String, key: String },
}

impl SortOutcome {
    pub fn folder(&self) -> &str {
        match self {
            SortOutcome::Matched { label, .. } => label,
            SortOutcome::Fallback { folder, .. } => folder,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            SortOutcome::Matched { key, .. } | SortOutcome::Fallback { key, .. } => key,
        }
    }

    pub fn message(&self) -> String {
        match self {
            SortOutcome::Matched {
                label, reference, ..
            } => format!(
                "The image matches with {}, uploaded to folder {}",
                reference.display(),
                label
            ),
            SortOutcome::Fallback { folder, .. } => {
                format!("No match found, uploaded to new folder {}", folder)
            }
        }
    }
}

pub struct PhotoSorter {
    comparator: Comparator,
    folders: FolderStorage,
    references: Vec<ReferenceImage>,
    fallback_folder: String,
}

impl PhotoSorter {
    pub fn new(
        comparator: Comparator,
        folders: FolderStorage,
        references: Vec<ReferenceImage>,
        fallback_folder: String,
    ) -> Self {
        Self {
            comparator,
            folders,
            references,
            fallback_folder,
        }
    }

    /// Compare the staged photo with each reference in order and upload it
    /// into the folder of the first match, or into the fallback folder.
    ///
    /// References whose file is missing are skipped. Any comparison or
    /// storage error aborts immediately without trying later references or
    /// the fallback.
    pub async fn sort(&self, staged: &StagedPhoto) -> Result<SortOutcome> {
        let photo = Bytes::from(
            tokio::fs::read(staged.path())
                .await
                .with_context(|| format!("reading staged file {}", staged.path().display()))?,
        );

        for reference in &self.references {
            let target = match tokio::fs::read(&reference.path).await {
                Ok(data) => Bytes::from(data),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(label = %reference.label, path = %reference.path.display(), "reference image missing, skipping");
                    continue;
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("reading reference image {}", reference.path.display())
                    })
                }
            };

            if self.comparator.matches(photo.clone(), target).await? {
                let key = self.folders.put_file(&reference.label, staged.path()).await?;
                info!(label = %reference.label, key = %key, "photo matched reference");
                return Ok(SortOutcome::Matched {
                    label: reference.label.clone(),
                    reference: reference.path.clone(),
                    key,
                });
            }
        }

        self.folders.ensure_folder(&self.fallback_folder).await?;
        let key = self
            .folders
            .put_file(&self.fallback_folder, staged.path())
            .await?;
        info!(key = %key, "no reference matched, stored in fallback folder");
        Ok(SortOutcome::Fallback {
            folder: self.fallback_folder.clone(),
            key,
        })
    }
}
