pub mod s3;

pub use s3::S3Archive;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upstream fetch failed: {0}")]
    UpstreamFetch(String),
    #[error("Storage upload failed: {0}")]
    Upload(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}
