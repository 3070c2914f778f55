//! Object storage for sorted photos.
//!
//! The low-level [`BlobStore`] trait models an S3-like flat key space with
//! prefix/delimiter listing. Backends:
//!
//! - [`S3BlobStore`]: an S3 bucket (`s3://bucket`)
//! - [`LocalBlobStore`]: a directory on disk (`file:///path`)
//! - [`MemoryBlobStore`]: process memory (`memory://`)
//!
//! [`FolderStorage`] layers the folder conventions on top: upload into a
//! folder, list folders, delete an image and rename a folder.
//!
//! ```rust,no_run
//! use blob_store::{new_blob_store, BlobStorageConfig, FolderStorage};
//!
//! # async fn example() -> Result<(), blob_store::BlobError> {
//! let store = new_blob_store(&BlobStorageConfig::default()).await?;
//! let folders = FolderStorage::new(store);
//! for folder in folders.list_folders().await? {
//!     println!("{}: {} images", folder.folder, folder.images.len());
//! }
//! # Ok(())
//! # }
//! ```

mod backends;
mod config;
mod dispatcher;
mod error;
mod folders;
mod listing;
mod traits;

pub use backends::{local::LocalBlobStore, memory::MemoryBlobStore, s3::S3BlobStore};
pub use config::{default_blob_store_path, BlobStorageConfig};
pub use dispatcher::new_blob_store;
pub use error::{BlobError, BlobResult};
pub use folders::{Folder, FolderStorage, RenameFailure, RenameReport};
pub use traits::{BlobStore, Listing};
