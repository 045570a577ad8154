use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CovlensError {
    #[error("Coverage file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Coverage file is not readable: {}: {source}", path.display())]
    FileUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse coverage XML: {0}")]
    MalformedDocument(String),

    #[error("Unknown coverage format")]
    UnknownFormat,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CovlensError>;
