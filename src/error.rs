use std::path::PathBuf;

use aws_sdk_s3::error::DisplayErrorContext;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InspectError {
    #[error("Unknown info type: {0}")]
    UnknownInfoType(String),

    #[error("Unknown likelihood: {0}")]
    UnknownLikelihood(String),

    #[error("Invalid object pattern: {pattern}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("S3 {operation} failed: {message}")]
    S3 {
        operation: &'static str,
        message: String,
    },

    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: aws_smithy_types::byte_stream::error::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonSerialize(#[from] serde_json::Error),
}

impl InspectError {
    /// Wraps an SDK error with the name of the S3 operation that produced it.
    pub(crate) fn s3<E>(operation: &'static str, err: E) -> Self
    where
        E: std::error::Error,
    {
        InspectError::S3 {
            operation,
            message: DisplayErrorContext(&err).to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, InspectError>;
