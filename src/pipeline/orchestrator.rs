//! Runs one curation pass: fetch, match, merge, write

use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, warn};

use crate::config::Config;
use crate::errors::AppResult;
use crate::pipeline::stages::{ChannelMatcher, GenerationStage, MergeStage, StaticEntryProvider};
use crate::sources::SourceFetcher;
use crate::utils::{DecompressingHttpClient, StandardHttpClient, UrlUtils};

/// Outcome of a curation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub sources_total: usize,
    /// Sources that could not be downloaded or decoded
    pub sources_failed: usize,
    /// Records matched across all sources, before static entries and merging
    pub channels_matched: usize,
    pub channels_written: usize,
    pub output_path: PathBuf,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sources_total={} sources_failed={} channels_matched={} channels_written={} output={}",
            self.sources_total,
            self.sources_failed,
            self.channels_matched,
            self.channels_written,
            self.output_path.display()
        )
    }
}

/// Sequences the pipeline stages over the configured sources
pub struct Curator<C> {
    config: Config,
    fetcher: SourceFetcher<C>,
    matcher: ChannelMatcher,
    generation: GenerationStage,
}

impl Curator<StandardHttpClient> {
    /// Curator backed by the reqwest client configured in `[fetch]`
    pub fn from_config(config: Config) -> AppResult<Self> {
        let client =
            StandardHttpClient::new(config.fetch.connect_timeout, config.fetch.request_timeout)?;
        Self::new(config, client)
    }
}

impl<C: DecompressingHttpClient> Curator<C> {
    pub fn new(config: Config, client: C) -> AppResult<Self> {
        let matcher = ChannelMatcher::from_config(&config.matching)?;
        let fetcher = SourceFetcher::new(client, config.fetch.user_agent.clone());
        let generation =
            GenerationStage::new(config.output.path.clone(), config.output.guide_urls.clone());

        Ok(Self {
            config,
            fetcher,
            matcher,
            generation,
        })
    }

    /// Process every source in configured order, one at a time.
    ///
    /// Unavailable or undecodable sources are skipped; only output errors fail the run.
    pub async fn run(&self) -> AppResult<RunSummary> {
        let run_start = Instant::now();
        let sources_total = self.config.sources.len();
        info!("Starting curation run sources={}", sources_total);

        let mut channels = Vec::new();
        let mut harvested_guide_urls = Vec::new();
        let mut sources_failed = 0;

        for (index, source) in self.config.sources.iter().enumerate() {
            let url = UrlUtils::obfuscate_credentials(&source.url);
            info!("Processing source {}/{} url={}", index + 1, sources_total, url);

            let Some(document) = self.fetcher.fetch(source).await else {
                sources_failed += 1;
                warn!("Skipping unavailable source url={}", url);
                continue;
            };

            let Some(matched) = self
                .matcher
                .match_document(&document, source.user_agent.as_deref())
            else {
                sources_failed += 1;
                warn!("Skipping undecodable source url={}", url);
                continue;
            };

            if self.config.matching.harvest_source_guide_urls {
                harvested_guide_urls.extend(matched.guide_urls);
            }
            info!("Finished source url={} matched={}", url, matched.channels.len());
            channels.extend(matched.channels);
        }

        let channels_matched = channels.len();
        let static_channels =
            StaticEntryProvider::records(&self.config.static_entries, self.matcher.groups());
        info!("Adding static channels count={}", static_channels.len());
        channels.extend(static_channels);

        let merged = MergeStage::process(channels);
        let channels_written = self.generation.process(merged, harvested_guide_urls).await?;

        let summary = RunSummary {
            sources_total,
            sources_failed,
            channels_matched,
            channels_written,
            output_path: self.generation.output_path().to_path_buf(),
        };
        info!(
            "Completed curation run {} duration={:?}",
            summary,
            run_start.elapsed()
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SourceConfig, StaticEntry, TargetRuleConfig};
    use crate::errors::AppError;
    use crate::models::ATTR_GROUP_TITLE;
    use crate::sources::M3uCodec;
    use async_trait::async_trait;
    use std::collections::{BTreeMap, HashMap};

    /// Serves canned documents; any other URL fails like a refused connection
    struct FakeClient {
        documents: HashMap<String, String>,
    }

    #[async_trait]
    impl DecompressingHttpClient for FakeClient {
        async fn fetch_text_with_headers(
            &self,
            url: &str,
            _headers: &[(&str, &str)],
        ) -> AppResult<String> {
            self.documents
                .get(url)
                .cloned()
                .ok_or_else(|| AppError::source_error(format!("connection refused: {url}")))
        }
    }

    fn config(dir: &tempfile::TempDir, sources: &[&str]) -> Config {
        let mut config = Config::default();
        config.sources = sources.iter().map(|url| SourceConfig::new(*url)).collect();
        config.output.path = dir.path().join("f1tv.m3u");
        config.output.guide_urls = vec!["a.xml".to_string(), "b.xml".to_string()];
        config.static_entries = vec![StaticEntry {
            name: "五星体育".to_string(),
            url: "http://static/wxty".to_string(),
            attributes: BTreeMap::new(),
        }];
        config
    }

    #[tokio::test]
    async fn test_unreachable_source_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeClient {
            documents: HashMap::from([(
                "http://second/list.m3u".to_string(),
                "#EXTM3U x-tvg-url=\"b.xml,c.xml\"\n#EXTINF:-1,CCTV5PLUS\nhttp://stream/5p\n"
                    .to_string(),
            )]),
        };

        let curator = Curator::new(
            config(&dir, &["http://first/list.m3u", "http://second/list.m3u"]),
            client,
        )
        .unwrap();
        let summary = curator.run().await.unwrap();

        assert_eq!(summary.sources_total, 2);
        assert_eq!(summary.sources_failed, 1);
        assert_eq!(summary.channels_matched, 1);
        assert_eq!(summary.channels_written, 2);

        let output = M3uCodec::decode(&std::fs::read_to_string(&summary.output_path).unwrap())
            .unwrap();
        assert_eq!(output.guide_urls(), vec!["a.xml", "b.xml", "c.xml"]);

        let names: Vec<&str> = output.channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["CCTV5PLUS", "五星体育"]);
        assert_eq!(output.channels[0].group_title(), Some("CCTV5+"));
    }

    #[tokio::test]
    async fn test_undecodable_source_contributes_no_guide_urls() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeClient {
            documents: HashMap::from([(
                "http://broken/list.m3u".to_string(),
                "#EXTM3U x-tvg-url=\"z.xml\"\n#EXTINF:-1,CCTV5\n".to_string(),
            )]),
        };

        let mut config = config(&dir, &["http://broken/list.m3u"]);
        config.output.guide_urls = vec!["a.xml".to_string()];

        let summary = Curator::new(config, client).unwrap().run().await.unwrap();
        assert_eq!(summary.sources_failed, 1);
        assert_eq!(summary.channels_matched, 0);

        let output = M3uCodec::decode(&std::fs::read_to_string(&summary.output_path).unwrap())
            .unwrap();
        assert_eq!(output.guide_urls(), vec!["a.xml"]);
    }

    #[tokio::test]
    async fn test_later_source_wins_for_same_stream() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeClient {
            documents: HashMap::from([
                (
                    "http://one/list.m3u".to_string(),
                    "#EXTM3U\n#EXTINF:-1 tvg-logo=\"old.png\",CCTV5\nhttp://stream/5\n".to_string(),
                ),
                (
                    "http://two/list.m3u".to_string(),
                    "#EXTM3U\n#EXTINF:-1 tvg-logo=\"new.png\",CCTV5 HD\nhttp://stream/5\n"
                        .to_string(),
                ),
            ]),
        };

        let mut config = config(&dir, &["http://one/list.m3u", "http://two/list.m3u"]);
        config.static_entries.clear();
        config.matching.harvest_source_guide_urls = false;

        let summary = Curator::new(config, client).unwrap().run().await.unwrap();
        assert_eq!(summary.channels_matched, 2);
        assert_eq!(summary.channels_written, 1);

        let output = M3uCodec::decode(&std::fs::read_to_string(&summary.output_path).unwrap())
            .unwrap();
        assert_eq!(output.channels[0].attribute("tvg-logo"), Some("new.png"));
        assert_eq!(output.channels[0].attribute(ATTR_GROUP_TITLE), Some("CCTV5"));
    }

    #[test]
    fn test_invalid_target_regex_fails_construction() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(&dir, &[]);
        config.matching.targets = vec![TargetRuleConfig::Regex {
            regex: "(CCTV".to_string(),
            canonical: "CCTV5".to_string(),
        }];

        let client = FakeClient {
            documents: HashMap::new(),
        };
        assert!(matches!(
            Curator::new(config, client),
            Err(AppError::Configuration { .. })
        ));
    }
}
