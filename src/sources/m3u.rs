//! Extended M3U codec
//!
//! Decodes IPTV-style playlists (`#EXTM3U` header, `#EXTINF` entries with
//! `key="value"` attributes) into [`Playlist`] values and encodes them back.
//! Attribute keys and order are kept exactly as found in the source.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::errors::{SourceError, SourceResult};
use crate::models::{Attributes, ChannelRecord, Playlist};

const HEADER_TAG: &str = "#EXTM3U";
const EXTINF_TAG: &str = "#EXTINF:";
const BYTE_ORDER_MARK: char = '\u{feff}';

static ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z0-9_.:-]+)=(?:"([^"]*)"|([^\s",]+))"#).expect("valid regex")
});

/// Codec for extended M3U playlists
pub struct M3uCodec;

impl M3uCodec {
    /// Decode playlist text into header attributes and ordered channel records.
    ///
    /// Fails when the `#EXTM3U` header is missing, an `#EXTINF` duration is not
    /// numeric, or an `#EXTINF` entry has no stream URL.
    pub fn decode(content: &str) -> SourceResult<Playlist> {
        let content = content.strip_prefix(BYTE_ORDER_MARK).unwrap_or(content);
        let mut lines = content
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let attributes = match lines.next() {
            Some((_, header)) if header.starts_with(HEADER_TAG) => {
                Self::parse_attributes(&header[HEADER_TAG.len()..])
            }
            Some((line_num, _)) => {
                return Err(SourceError::m3u_parse(format!(
                    "missing {HEADER_TAG} header at line {line_num}"
                )));
            }
            None => return Err(SourceError::m3u_parse("empty playlist")),
        };

        let mut channels = Vec::new();
        let mut pending: Option<(usize, ChannelRecord)> = None;
        let mut bare_urls = 0;

        for (line_num, line) in lines {
            if let Some(body) = line.strip_prefix(EXTINF_TAG) {
                if let Some((start, _)) = pending {
                    return Err(SourceError::m3u_parse(format!(
                        "#EXTINF at line {start} has no stream URL"
                    )));
                }
                pending = Some((line_num, Self::parse_extinf(body, line_num)?));
            } else if line.starts_with('#') {
                // Repeated headers show up in concatenated playlists
                if line.starts_with(HEADER_TAG) {
                    continue;
                }
                if let Some((_, record)) = pending.as_mut() {
                    record.extras.push(line.to_string());
                }
            } else {
                match pending.take() {
                    Some((_, mut record)) => {
                        record.url = line.to_string();
                        channels.push(record);
                    }
                    None => {
                        bare_urls += 1;
                        channels.push(ChannelRecord::new(Self::name_from_url(line), line));
                    }
                }
            }
        }

        if let Some((start, _)) = pending {
            return Err(SourceError::m3u_parse(format!(
                "#EXTINF at line {start} has no stream URL"
            )));
        }

        if bare_urls > 0 {
            warn!("Found {} stream URLs without EXTINF metadata", bare_urls);
        }
        debug!(
            "Decoded M3U playlist channels={} header_attributes={}",
            channels.len(),
            attributes.len()
        );

        Ok(Playlist::new(attributes, channels))
    }

    /// Encode a playlist; every line, including the last, ends with `\n`.
    pub fn encode(playlist: &Playlist) -> String {
        let mut m3u = String::from(HEADER_TAG);
        Self::push_attributes(&mut m3u, &playlist.attributes);
        m3u.push('\n');

        for channel in &playlist.channels {
            m3u.push_str(EXTINF_TAG);
            m3u.push_str(&channel.duration);
            Self::push_attributes(&mut m3u, &channel.attributes);
            m3u.push(',');
            m3u.push_str(&channel.name);
            m3u.push('\n');

            for extra in &channel.extras {
                m3u.push_str(extra);
                m3u.push('\n');
            }

            m3u.push_str(&channel.url);
            m3u.push('\n');
        }

        m3u
    }

    /// Parse the part of an `#EXTINF` line after the tag: `<duration> <attrs>,<title>`
    fn parse_extinf(body: &str, line_num: usize) -> SourceResult<ChannelRecord> {
        let duration_end = body
            .find(|c: char| c.is_whitespace() || c == ',')
            .unwrap_or(body.len());
        let duration = &body[..duration_end];
        if duration.parse::<f64>().is_err() {
            return Err(SourceError::m3u_parse(format!(
                "invalid duration '{duration}' at line {line_num}"
            )));
        }

        let rest = &body[duration_end..];
        let (attributes_part, name) = match Self::title_separator(rest) {
            Some(comma_pos) => (&rest[..comma_pos], rest[comma_pos + 1..].trim().to_string()),
            // No separator: whatever is not an attribute is the title
            None => (rest, ATTRIBUTE_RE.replace_all(rest, "").trim().to_string()),
        };

        let mut record = ChannelRecord::new(name, String::new());
        record.duration = duration.to_string();
        record.attributes = Self::parse_attributes(attributes_part);
        Ok(record)
    }

    /// Position of the first comma outside double quotes
    fn title_separator(text: &str) -> Option<usize> {
        let mut in_quotes = false;
        for (pos, ch) in text.char_indices() {
            match ch {
                '"' => in_quotes = !in_quotes,
                ',' if !in_quotes => return Some(pos),
                _ => {}
            }
        }
        None
    }

    fn parse_attributes(text: &str) -> Attributes {
        ATTRIBUTE_RE
            .captures_iter(text)
            .map(|caps| {
                let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
                (caps[1].to_string(), value.to_string())
            })
            .collect()
    }

    fn push_attributes(out: &mut String, attributes: &Attributes) {
        for (key, value) in attributes.iter() {
            // A raw quote would end the value early on the next decode
            out.push_str(&format!(" {key}=\"{}\"", value.replace('"', "'")));
        }
    }

    /// Fallback title for URL lines without metadata: last path segment without query
    fn name_from_url(url: &str) -> String {
        url.split('/')
            .next_back()
            .and_then(|segment| segment.split('?').next())
            .filter(|segment| !segment.is_empty())
            .unwrap_or("Unnamed Channel")
            .to_string()
    }
}
