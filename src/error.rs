//! Error types for lmprobe operations.
//!
//! This module provides the error hierarchy using `thiserror` for memory
//! sampling, language-model calls, growth logging and configuration.

use thiserror::Error;

/// Result type alias for lmprobe operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the probe.
#[derive(Error, Debug)]
pub enum Error {
    /// Memory sampling errors (process status file).
    #[error("memory sampling error: {0}")]
    Memory(#[from] MemoryError),

    /// Language-model errors that escape the fan-out.
    #[error("language model error: {0}")]
    Lm(#[from] LmError),

    /// Growth log errors.
    #[error("growth log error: {0}")]
    Log(#[from] LogError),

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Errors raised while reading or parsing the process status file.
#[derive(Error, Debug)]
pub enum MemoryError {
    /// The status file could not be read.
    #[error("failed to read {path}: {reason}")]
    ReadFailed {
        /// Path to the status file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// A required field was absent from the status text.
    #[error("missing field {field} in process status")]
    MissingField {
        /// Field prefix, e.g. `VmRSS`.
        field: &'static str,
    },

    /// A field was present but its value was not a kB count.
    #[error("invalid value for {field}: {value:?}")]
    InvalidValue {
        /// Field prefix.
        field: &'static str,
        /// Raw value text.
        value: String,
    },
}

/// Errors from a single language-model call.
#[derive(Error, Debug)]
pub enum LmError {
    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The service call failed (network, HTTP status, API error).
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The service answered without any completion text.
    #[error("empty completion")]
    EmptyCompletion,

    /// The completion did not contain a required output field.
    #[error("missing output field: {field}")]
    MissingOutputField {
        /// Name of the missing field.
        field: String,
    },
}

/// Errors writing the growth log.
#[derive(Error, Debug)]
pub enum LogError {
    /// Failed to create or truncate the log file.
    #[error("failed to create log {path}: {reason}")]
    CreateFailed {
        /// Path to the log file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to append to the log file.
    #[error("failed to append to log {path}: {reason}")]
    AppendFailed {
        /// Path to the log file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to write to the console.
    #[error("console write failed: {0}")]
    Console(String),

    /// Failed to serialize a JSON report line.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<async_openai::error::OpenAIError> for LmError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        match err {
            async_openai::error::OpenAIError::InvalidArgument(msg) => Self::InvalidRequest(msg),
            other => Self::RequestFailed(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for LogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
