use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::errors::AppResult;
use crate::models::{Attributes, ChannelRecord, PLAYLIST_EPG_URL, Playlist};
use crate::sources::M3uCodec;

/// Generation stage - writes the merged playlist to its output file
pub struct GenerationStage {
    output_path: PathBuf,
    baseline_guide_urls: Vec<String>,
}

impl GenerationStage {
    pub fn new(output_path: impl Into<PathBuf>, baseline_guide_urls: Vec<String>) -> Self {
        Self {
            output_path: output_path.into(),
            baseline_guide_urls,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Baseline plus harvested guide-data URLs, deduplicated and sorted, joined with `,`
    pub fn merged_guide_urls<I>(&self, harvested: I) -> Option<String>
    where
        I: IntoIterator<Item = String>,
    {
        let urls: BTreeSet<String> = self
            .baseline_guide_urls
            .iter()
            .cloned()
            .chain(harvested)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();

        if urls.is_empty() {
            return None;
        }
        Some(urls.into_iter().collect::<Vec<_>>().join(","))
    }

    /// Build the output playlist; `x-tvg-url` is omitted when no guide URLs are known
    pub fn build_playlist<I>(&self, channels: Vec<ChannelRecord>, harvested: I) -> Playlist
    where
        I: IntoIterator<Item = String>,
    {
        let mut attributes = Attributes::new();
        if let Some(guide_urls) = self.merged_guide_urls(harvested) {
            attributes.insert(PLAYLIST_EPG_URL, guide_urls);
        }
        Playlist::new(attributes, channels)
    }

    /// Encode and write the playlist, replacing any existing file.
    /// Returns the number of channels written.
    pub async fn process<I>(&self, channels: Vec<ChannelRecord>, harvested: I) -> AppResult<usize>
    where
        I: IntoIterator<Item = String>,
    {
        let stage_start = Instant::now();
        let playlist = self.build_playlist(channels, harvested);
        let content = M3uCodec::encode(&playlist);

        if let Some(parent) = self.output_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(&self.output_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        debug!("Encoded playlist bytes={}", content.len());
        info!(
            "Completed generation stage file={} channels_written={} duration={:?}",
            self.output_path.display(),
            playlist.channels.len(),
            stage_start.elapsed()
        );

        Ok(playlist.channels.len())
    }
}
