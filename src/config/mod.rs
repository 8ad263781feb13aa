use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::errors::{AppError, AppResult};

pub mod defaults;
pub mod duration_serde;

use defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,
    #[serde(default = "default_static_entries")]
    pub static_entries: Vec<StaticEntry>,
    #[serde(default)]
    pub output: OutputConfig,
}

/// HTTP settings shared by every source download
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent sent unless a source overrides it
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_connect_timeout", with = "duration_serde::duration")]
    pub connect_timeout: Duration,
    #[serde(default = "default_request_timeout", with = "duration_serde::duration")]
    pub request_timeout: Duration,
}

/// One remote playlist to pull channels from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    pub url: String,
    /// Replaces the fetch User-Agent for this source. In the `canonical` match
    /// style it is also written to each matched channel as `http-user-agent`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Extra request headers; these win over the User-Agent settings
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl SourceConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user_agent: None,
            headers: BTreeMap::new(),
        }
    }
}

/// How matched channels are rewritten
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchStyle {
    /// Rename and regroup only; other attributes and extras pass through
    #[default]
    Grouped,
    /// Also match on `tvg-id`, rewrite `tvg-id`, drop `tvg-name`, sort
    /// attributes and drop extras
    Canonical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    #[serde(default)]
    pub style: MatchStyle,
    /// Ordered target rules; the first matching rule decides the canonical name
    #[serde(default = "default_targets")]
    pub targets: Vec<TargetRuleConfig>,
    /// Substrings that disqualify a channel even when a target matches
    #[serde(default = "default_exclusions")]
    pub exclusions: Vec<String>,
    #[serde(default = "default_groups")]
    pub groups: Vec<GroupMappingConfig>,
    /// Merge the `x-tvg-url` lists declared by sources into the output header
    #[serde(default = "default_harvest_source_guide_urls")]
    pub harvest_source_guide_urls: bool,
}

/// A target rule as written in the config file.
///
/// Accepts a bare string (literal substring, canonical name equal to the
/// literal), `{ literal = "...", canonical = "..." }` or
/// `{ regex = "...", canonical = "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TargetRuleConfig {
    Plain(String),
    Regex {
        regex: String,
        canonical: String,
    },
    Literal {
        literal: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        canonical: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupMappingConfig {
    /// Group label assigned to matching channels
    pub group: String,
    /// Substrings of a canonical name that select this group
    pub aliases: Vec<String>,
}

/// A channel that no remote source provides
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaticEntry {
    pub name: String,
    pub url: String,
    /// Applied over the default `group-title` and `tvg-id`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    /// Baseline guide-data URLs, always present in the output header
    #[serde(default = "default_guide_urls")]
    pub guide_urls: Vec<String>,
}

// Fetch defaults
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
}

fn default_sources() -> Vec<SourceConfig> {
    DEFAULT_SOURCE_URLS.iter().map(|url| SourceConfig::new(*url)).collect()
}

fn default_static_entries() -> Vec<StaticEntry> {
    DEFAULT_STATIC_ENTRIES
        .iter()
        .map(|(name, url)| StaticEntry {
            name: name.to_string(),
            url: url.to_string(),
            attributes: BTreeMap::new(),
        })
        .collect()
}

// Matching defaults
fn default_targets() -> Vec<TargetRuleConfig> {
    DEFAULT_TARGETS
        .iter()
        .map(|target| TargetRuleConfig::Plain(target.to_string()))
        .collect()
}

fn default_exclusions() -> Vec<String> {
    DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_groups() -> Vec<GroupMappingConfig> {
    DEFAULT_GROUPS
        .iter()
        .map(|(group, aliases)| GroupMappingConfig {
            group: group.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        })
        .collect()
}

fn default_harvest_source_guide_urls() -> bool {
    DEFAULT_HARVEST_SOURCE_GUIDE_URLS
}

// Output defaults
fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}

fn default_guide_urls() -> Vec<String> {
    DEFAULT_GUIDE_URLS.iter().map(|s| s.to_string()).collect()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            style: MatchStyle::default(),
            targets: default_targets(),
            exclusions: default_exclusions(),
            groups: default_groups(),
            harvest_source_guide_urls: default_harvest_source_guide_urls(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            guide_urls: default_guide_urls(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            matching: MatchingConfig::default(),
            sources: default_sources(),
            static_entries: default_static_entries(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load the config file, falling back to the built-in lists when it does not exist.
    ///
    /// A missing file is not created; the only file a run writes is the playlist.
    pub fn load_from_file(config_file: impl AsRef<Path>) -> AppResult<Self> {
        let config_file = config_file.as_ref();
        if !config_file.exists() {
            info!(
                "Config file not found, using built-in defaults path={}",
                config_file.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(config_file)?;
        let config = Self::from_toml(&contents).map_err(|e| {
            AppError::configuration(format!("{}: {e}", config_file.display()))
        })?;
        info!("Configuration loaded from: {}", config_file.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> AppResult<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| AppError::configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make every run fail
    pub fn validate(&self) -> AppResult<()> {
        if self.output.path.as_os_str().is_empty() {
            return Err(AppError::validation("output.path must not be empty"));
        }

        for source in &self.sources {
            url::Url::parse(&source.url).map_err(|e| {
                AppError::validation(format!("invalid source url '{}': {e}", source.url))
            })?;
        }

        for entry in &self.static_entries {
            if entry.name.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "static entry for '{}' has an empty name",
                    entry.url
                )));
            }
        }

        if self.matching.targets.is_empty() {
            warn!("No target rules configured; only static entries will be written");
        }

        Ok(())
    }
}
