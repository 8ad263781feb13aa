//! Curates a small playlist of target channels out of public IPTV sources.
//!
//! Sources are downloaded one by one, their target channels are matched and
//! normalized, duplicates collapse onto a single entry and the result is
//! written as one extended M3U file.

pub mod config;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod sources;
pub mod utils;
