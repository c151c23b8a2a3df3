//! Storage module for uploaded print documents
//!
//! Every backend keeps blobs under opaque keys of the form
//! `print-jobs/{job_uuid}/{stored_name}` so a whole job can be purged by prefix.

mod local;
mod minio_client;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use local::LocalFileStore;
pub use minio_client::MinIOClient;

/// Top-level directory every print job's files live under
pub const PRINT_JOBS_PREFIX: &str = "print-jobs";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to write '{key}': {message}")]
    Write { key: String, message: String },

    #[error("failed to read '{key}': {message}")]
    Read { key: String, message: String },

    #[error("failed to delete '{key}': {message}")]
    Delete { key: String, message: String },

    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Blob storage used for uploaded print documents
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store `data` under `key`, replacing any existing object
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), StorageError>;

    async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Delete every object below `prefix`. A missing directory is not an error.
    async fn delete_directory(&self, prefix: &str) -> Result<(), StorageError>;

    /// URL the shop terminal can fetch the file from
    async fn file_url(&self, key: &str) -> Result<String, StorageError>;
}

/// Directory holding all files of one print job
pub fn job_directory(job_uuid: Uuid) -> String {
    format!("{}/{}", PRINT_JOBS_PREFIX, job_uuid)
}

/// Key for a stored file inside a job directory
pub fn job_file_key(job_uuid: Uuid, stored_name: &str) -> String {
    format!("{}/{}", job_directory(job_uuid), stored_name)
}

/// Reject keys that could escape the storage root
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");

    if invalid {
        Err(StorageError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}
