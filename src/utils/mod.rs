//! Utility modules shared by the fetcher and the pipeline

pub mod decompression;
pub mod http_client;
pub mod url;

pub use decompression::{CompressionFormat, DecompressionService};
pub use http_client::{DecompressingHttpClient, StandardHttpClient};
pub use url::UrlUtils;
