//! Domain-specific error types for casegen

use thiserror::Error;

/// Main error type for the test case generation service
#[derive(Error, Debug)]
pub enum CasegenError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Generation backend timeout after {timeout_secs} seconds")]
    BackendTimeout { timeout_secs: u64 },

    #[error("Could not connect to generation backend at {url}")]
    BackendUnreachable { url: String },

    #[error("Generation backend error: {message}")]
    BackendProtocol { message: String },

    #[error("File format error: {message}")]
    FileFormat { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<std::io::Error> for CasegenError {
    fn from(err: std::io::Error) -> Self {
        CasegenError::Io {
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for CasegenError {
    fn from(err: anyhow::Error) -> Self {
        CasegenError::Internal {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CasegenError>;
