//! Core data types shared by the codec and the curation pipeline.

use std::collections::BTreeSet;
use std::fmt;

pub mod attributes;

pub use attributes::Attributes;

/// `group-title` EXTINF attribute
pub const ATTR_GROUP_TITLE: &str = "group-title";
/// `tvg-id` EXTINF attribute (guide ID)
pub const ATTR_TVG_ID: &str = "tvg-id";
/// `tvg-name` EXTINF attribute (guide name)
pub const ATTR_TVG_NAME: &str = "tvg-name";
/// `tvg-logo` EXTINF attribute
pub const ATTR_TVG_LOGO: &str = "tvg-logo";
/// Playback header attribute understood by most IPTV players
pub const ATTR_HTTP_USER_AGENT: &str = "http-user-agent";

/// Global `#EXTM3U` attribute holding the comma separated guide-data URLs
pub const PLAYLIST_EPG_URL: &str = "x-tvg-url";
/// Older spelling of [`PLAYLIST_EPG_URL`] still emitted by some sources
pub const PLAYLIST_EPG_URL_ALIAS: &str = "url-tvg";

/// Duration marker for live streams of unknown length
pub const LIVE_DURATION: &str = "-1";

/// Attributes that describe presentation rather than the stream itself.
///
/// They are left out of [`IdentityKey`] so that the same stream listed under
/// different names or logos still collapses into one entry.
pub const NORMAL_ATTRIBUTES: [&str; 4] = [ATTR_GROUP_TITLE, ATTR_TVG_NAME, ATTR_TVG_ID, ATTR_TVG_LOGO];

/// One playlist entry: a display name, a stream URL and its metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRecord {
    pub name: String,
    pub url: String,
    /// Duration text from the `#EXTINF` line, [`LIVE_DURATION`] for live streams
    pub duration: String,
    pub attributes: Attributes,
    /// Auxiliary `#...` lines found between `#EXTINF` and the URL (e.g. `#EXTVLCOPT`)
    pub extras: Vec<String>,
}

impl ChannelRecord {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            duration: LIVE_DURATION.to_string(),
            attributes: Attributes::new(),
            extras: Vec::new(),
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key)
    }

    pub fn group_title(&self) -> Option<&str> {
        self.attributes.get(ATTR_GROUP_TITLE)
    }

    /// Name used for matching: `tvg-name`, then `tvg-id`, then the raw name, trimmed.
    ///
    /// Blank guide attributes are skipped so that an empty `tvg-name=""`
    /// does not hide a usable `tvg-id` or title.
    pub fn display_name(&self) -> &str {
        [ATTR_TVG_NAME, ATTR_TVG_ID]
            .iter()
            .filter_map(|key| self.attributes.get(key))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .unwrap_or_else(|| self.name.trim())
    }

    /// Deduplication key: stream URL plus every non-presentation attribute
    pub fn identity_key(&self) -> IdentityKey {
        let extended = self
            .attributes
            .iter()
            .filter(|(key, _)| !NORMAL_ATTRIBUTES.contains(key))
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        IdentityKey {
            url: self.url.clone(),
            extended,
        }
    }

    /// Ordering key for the merged playlist: (group title or name, name)
    pub fn sort_key(&self) -> (&str, &str) {
        (self.group_title().unwrap_or(&self.name), &self.name)
    }
}

impl fmt::Display for ChannelRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.url)
    }
}

/// Identity of a channel for deduplication purposes.
///
/// Attribute keys are compared verbatim, so `Tvg-ID` and `tvg-id` are
/// different keys here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    pub url: String,
    pub extended: BTreeSet<(String, String)>,
}

/// A decoded or to-be-encoded playlist
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    /// Attributes of the `#EXTM3U` header line
    pub attributes: Attributes,
    pub channels: Vec<ChannelRecord>,
}

impl Playlist {
    pub fn new(attributes: Attributes, channels: Vec<ChannelRecord>) -> Self {
        Self { attributes, channels }
    }

    /// Comma separated guide-data URLs declared in the header, in declaration order
    pub fn guide_urls(&self) -> Vec<String> {
        [PLAYLIST_EPG_URL, PLAYLIST_EPG_URL_ALIAS]
            .iter()
            .filter_map(|key| self.attributes.get(key))
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect()
    }
}
