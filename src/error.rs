//! Engine error type

use crate::assets::AssetError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can end a benchmark invocation
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O failure on {path}: {source}")]
    IoFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BenchError>;

/// The four outcomes a failed invocation is classified into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    InvalidArgument,
    IoFailure,
}

impl BenchError {
    /// Wraps an I/O error, promoting missing files and denied access to
    /// their dedicated variants
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into().display().to_string();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::IoFailure { path, source },
        }
    }

    /// Builds an I/O failure that did not come from the OS
    pub fn io_failure(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::IoFailure {
            path: path.into().display().to_string(),
            source: std::io::Error::other(message.into()),
        }
    }

    /// Classifies this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::InvalidArgument(_) | Self::Config(_) => ErrorKind::InvalidArgument,
            Self::IoFailure { .. } => ErrorKind::IoFailure,
            Self::Asset(e) => match e {
                AssetError::NotFound(_) => ErrorKind::NotFound,
                AssetError::InvalidName(_) => ErrorKind::InvalidArgument,
                AssetError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                    ErrorKind::NotFound
                }
                AssetError::Io(io) if io.kind() == std::io::ErrorKind::PermissionDenied => {
                    ErrorKind::PermissionDenied
                }
                _ => ErrorKind::IoFailure,
            },
        }
    }
}
