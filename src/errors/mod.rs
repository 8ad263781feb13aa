//! Centralized error handling for the M3U curator
//!
//! # Error Categories
//!
//! - **Source Errors**: download and decode failures for a single playlist source
//! - **Configuration Errors**: unreadable config files, invalid target rules
//! - **I/O Errors**: writing the merged playlist
//!
//! # Usage
//!
//! ```rust
//! use m3u_curator::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Err(AppError::configuration("missing output path"))
//! }
//! assert!(example_function().is_err());
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Source Results
pub type SourceResult<T> = Result<T, SourceError>;
