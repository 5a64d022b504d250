use std::path::PathBuf;

/// Failures loading or saving a store file
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid store file {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        source: serde_json::Error,
    },
}
