//! Error type definitions for the M3U curator
//!
//! Source-level failures (download, decode) are recoverable: the curator logs
//! them and skips the source. Everything else propagates to `main`.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Source handling errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// External service errors
    #[error("External service error: {service} - {message}")]
    ExternalService { service: String, message: String },

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Source handling specific errors
#[derive(Error, Debug)]
pub enum SourceError {
    /// Network connection timeouts
    #[error("Connection timeout: {url}")]
    Timeout { url: String },

    /// Connection, DNS and body read failures
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Parsing errors for source data
    #[error("Parse error: {source_type} - {message}")]
    Parse { source_type: String, message: String },

    /// Non-success HTTP responses from external sources
    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an external service error
    pub fn external_service<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a source transport error
    pub fn source_error<S: Into<String>>(message: S) -> Self {
        Self::Source(SourceError::Transport {
            message: message.into(),
        })
    }
}

impl SourceError {
    /// Create an M3U parse error
    pub fn m3u_parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            source_type: "m3u".to_string(),
            message: message.into(),
        }
    }
}
