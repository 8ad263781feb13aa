//! Playlist sources: the extended M3U codec and the remote source fetcher

pub mod fetcher;
pub mod m3u;

pub use fetcher::SourceFetcher;
pub use m3u::M3uCodec;
