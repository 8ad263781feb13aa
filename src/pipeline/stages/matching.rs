//! Channel matching stage
//!
//! Picks the target channels out of one decoded source document, drops the
//! excluded ones and rewrites the survivors to their canonical name and
//! group. Rules are tested in configured order and the first match wins, so
//! overlapping rules (`CCTV5+` before `CCTV5`) stay deterministic.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use tracing::{debug, error, info};

use crate::config::{GroupMappingConfig, MatchStyle, MatchingConfig, TargetRuleConfig};
use crate::errors::{AppError, AppResult};
use crate::models::{
    ATTR_GROUP_TITLE, ATTR_HTTP_USER_AGENT, ATTR_TVG_ID, ATTR_TVG_NAME, ChannelRecord,
};
use crate::sources::M3uCodec;

/// Some sources put `,`, `:` or `;` straight after the live duration
static EXTINF_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#EXTINF:-1[,:;]").expect("valid regex"));

/// Characters of an undecodable document included in the error log
const DOCUMENT_PREVIEW_CHARS: usize = 100;

/// Rewrite `#EXTINF:-1,` (and the `:`/`;` variants) to `#EXTINF:-1 ` before decoding
pub fn repair_extinf_separators(document: &str) -> Cow<'_, str> {
    EXTINF_SEPARATOR_RE.replace_all(document, "#EXTINF:-1 ")
}

#[derive(Debug, Clone)]
pub enum RulePattern {
    /// Case-sensitive substring
    Literal(String),
    /// Always compiled case-insensitive
    Regex(Regex),
}

impl RulePattern {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::Literal(literal) => text.contains(literal.as_str()),
            Self::Regex(regex) => regex.is_match(text),
        }
    }
}

/// A pattern and the canonical name its matches are renamed to
#[derive(Debug, Clone)]
pub struct TargetRule {
    pub pattern: RulePattern,
    pub canonical: String,
}

impl TargetRule {
    pub fn literal(literal: impl Into<String>, canonical: impl Into<String>) -> Self {
        Self {
            pattern: RulePattern::Literal(literal.into()),
            canonical: canonical.into(),
        }
    }

    pub fn regex(pattern: &str, canonical: impl Into<String>) -> AppResult<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| AppError::configuration(format!("invalid target regex '{pattern}': {e}")))?;

        Ok(Self {
            pattern: RulePattern::Regex(regex),
            canonical: canonical.into(),
        })
    }

    pub fn from_config(config: &TargetRuleConfig) -> AppResult<Self> {
        let rule = match config {
            TargetRuleConfig::Plain(literal) => Self::literal(literal, literal),
            TargetRuleConfig::Literal { literal, canonical } => {
                Self::literal(literal, canonical.as_deref().unwrap_or(literal.as_str()))
            }
            TargetRuleConfig::Regex { regex, canonical } => Self::regex(regex, canonical)?,
        };

        if let RulePattern::Literal(literal) = &rule.pattern
            && literal.is_empty()
        {
            return Err(AppError::configuration(format!(
                "empty literal target for canonical name '{}'",
                rule.canonical
            )));
        }

        Ok(rule)
    }
}

/// Ordered canonical name → group label mapping
#[derive(Debug, Clone, Default)]
pub struct GroupMappings {
    mappings: Vec<GroupMappingConfig>,
}

impl GroupMappings {
    pub fn new(mappings: Vec<GroupMappingConfig>) -> Self {
        Self { mappings }
    }

    /// Group of the first mapping with an alias contained in `name`, else `name`
    pub fn group_for<'a>(&'a self, name: &'a str) -> &'a str {
        self.mappings
            .iter()
            .find(|mapping| {
                mapping
                    .aliases
                    .iter()
                    .any(|alias| !alias.is_empty() && name.contains(alias.as_str()))
            })
            .map_or(name, |mapping| mapping.group.as_str())
    }
}

/// What one decoded source contributes to the run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchedSource {
    pub channels: Vec<ChannelRecord>,
    /// Entries of the header's `x-tvg-url` / `url-tvg` attributes
    pub guide_urls: Vec<String>,
}

/// Applies target rules, exclusions and group mapping to source documents
#[derive(Debug, Clone)]
pub struct ChannelMatcher {
    style: MatchStyle,
    rules: Vec<TargetRule>,
    exclusions: Vec<String>,
    groups: GroupMappings,
}

impl ChannelMatcher {
    pub fn new(
        style: MatchStyle,
        rules: Vec<TargetRule>,
        exclusions: Vec<String>,
        groups: GroupMappings,
    ) -> Self {
        let exclusions = exclusions
            .into_iter()
            .filter(|exclusion| !exclusion.is_empty())
            .collect();

        Self {
            style,
            rules,
            exclusions,
            groups,
        }
    }

    /// Build the matcher from config; an invalid regex rule is a configuration error
    pub fn from_config(config: &MatchingConfig) -> AppResult<Self> {
        let rules = config
            .targets
            .iter()
            .map(TargetRule::from_config)
            .collect::<AppResult<Vec<_>>>()?;

        debug!(
            "Built channel matcher style={:?} rules={} exclusions={} groups={}",
            config.style,
            rules.len(),
            config.exclusions.len(),
            config.groups.len()
        );

        Ok(Self::new(
            config.style,
            rules,
            config.exclusions.clone(),
            GroupMappings::new(config.groups.clone()),
        ))
    }

    pub fn groups(&self) -> &GroupMappings {
        &self.groups
    }

    /// Decode a source document and return its target channels, rewritten, in
    /// source order, together with the guide-data URLs its header declares.
    ///
    /// An undecodable document is logged and yields `None`, so it contributes
    /// neither channels nor guide URLs.
    /// `user_agent` is written as `http-user-agent` in the canonical style.
    pub fn match_document(&self, document: &str, user_agent: Option<&str>) -> Option<MatchedSource> {
        let repaired = repair_extinf_separators(document);
        let playlist = match M3uCodec::decode(&repaired) {
            Ok(playlist) => playlist,
            Err(e) => {
                let preview: String = document.chars().take(DOCUMENT_PREVIEW_CHARS).collect();
                error!("Failed to decode source document error={} preview={:?}", e, preview);
                return None;
            }
        };

        let guide_urls = playlist.guide_urls();
        let decoded = playlist.channels.len();
        let channels: Vec<ChannelRecord> = playlist
            .channels
            .into_iter()
            .filter_map(|record| self.match_record(record, user_agent))
            .collect();

        info!(
            "Matched target channels decoded={} matched={} guide_urls={}",
            decoded,
            channels.len(),
            guide_urls.len()
        );
        Some(MatchedSource {
            channels,
            guide_urls,
        })
    }

    /// Match and rewrite a single record; `None` when it is excluded or no rule applies
    pub fn match_record(
        &self,
        mut record: ChannelRecord,
        user_agent: Option<&str>,
    ) -> Option<ChannelRecord> {
        let display_name = record.display_name().to_string();

        if self
            .exclusions
            .iter()
            .any(|exclusion| display_name.contains(exclusion.as_str()))
        {
            debug!("Excluded channel name={}", display_name);
            return None;
        }

        let match_guide_id = self.style == MatchStyle::Canonical;
        let canonical = self
            .rules
            .iter()
            .find(|rule| {
                rule.pattern.matches(&display_name)
                    || (match_guide_id
                        && record
                            .attribute(ATTR_TVG_ID)
                            .is_some_and(|id| rule.pattern.matches(id)))
            })?
            .canonical
            .clone();

        let group = self.groups.group_for(&canonical).to_string();
        record.attributes.insert(ATTR_GROUP_TITLE, group);

        if self.style == MatchStyle::Canonical {
            record.attributes.insert(ATTR_TVG_ID, canonical.as_str());
            record.attributes.remove(ATTR_TVG_NAME);
            if let Some(user_agent) = user_agent {
                record.attributes.insert(ATTR_HTTP_USER_AGENT, user_agent);
            }
            record.attributes.sort_keys();
            record.extras.clear();
        }

        record.name = canonical;
        debug!("Found target channel original={} channel={}", display_name, record);
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchingConfig;
    use crate::models::ATTR_TVG_LOGO;
    use rstest::rstest;

    fn default_matcher() -> ChannelMatcher {
        ChannelMatcher::from_config(&MatchingConfig::default()).unwrap()
    }

    fn canonical_matcher() -> ChannelMatcher {
        ChannelMatcher::new(
            MatchStyle::Canonical,
            vec![
                TargetRule::regex(r"^\s*CCTV-?5\s*(体育)?\s*$", "CCTV5").unwrap(),
                TargetRule::literal("Sky Sports F1", "Sky Sports F1"),
            ],
            vec!["广播".to_string()],
            GroupMappings::default(),
        )
    }

    #[test]
    fn test_repair_extinf_separators() {
        let repaired = repair_extinf_separators(
            "#EXTM3U\n#EXTINF:-1,A\nu\n#EXTINF:-1:B\nu\n#EXTINF:-1;C\nu\n#EXTINF:-1 tvg-id=\"x\",D\nu\n",
        );
        assert_eq!(
            repaired,
            "#EXTM3U\n#EXTINF:-1 A\nu\n#EXTINF:-1 B\nu\n#EXTINF:-1 C\nu\n#EXTINF:-1 tvg-id=\"x\",D\nu\n"
        );
    }

    #[rstest]
    #[case("CCTV5+ 体育赛事", Some(("CCTV5+", "CCTV5+")))]
    #[case("CCTV5PLUS", Some(("CCTV5PLUS", "CCTV5+")))]
    #[case("CCTV-5", None)]
    #[case("CCTV5 体育", Some(("CCTV5", "CCTV5")))]
    #[case("SkySportsF1 HD", Some(("SkySportsF1", "Sky Sports F1")))]
    #[case("广东体育", Some(("广东体育", "广东体育")))]
    #[case("五星体育广播", None)]
    #[case("CCTV5 伴音", None)]
    #[case("CNN", None)]
    fn test_default_rules(#[case] name: &str, #[case] expected: Option<(&str, &str)>) {
        let matched = default_matcher().match_record(ChannelRecord::new(name, "http://a/b"), None);
        let actual = matched
            .as_ref()
            .map(|record| (record.name.as_str(), record.group_title().unwrap_or_default()));
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_regex_rule_normalizes_name_and_group() {
        let mut record = ChannelRecord::new("raw", "http://a/cctv5");
        record.attributes.insert(ATTR_TVG_NAME, "CCTV-5 体育");

        let matcher = ChannelMatcher::new(
            MatchStyle::Grouped,
            vec![TargetRule::regex(r"^\s*CCTV-?5\s*(体育)?\s*$", "CCTV5").unwrap()],
            Vec::new(),
            GroupMappings::default(),
        );
        let matched = matcher.match_record(record, None).unwrap();
        assert_eq!(matched.name, "CCTV5");
        assert_eq!(matched.group_title(), Some("CCTV5"));
        assert_eq!(matched.attribute(ATTR_TVG_NAME), Some("CCTV-5 体育"));
    }

    #[test]
    fn test_regex_rule_is_case_insensitive() {
        let rule = TargetRule::regex("^cctv-?5$", "CCTV5").unwrap();
        assert!(rule.pattern.matches("CCTV-5"));
        assert!(TargetRule::regex("(unclosed", "x").is_err());
    }

    #[test]
    fn test_exclusion_wins_over_target() {
        let mut record = ChannelRecord::new("CCTV5", "http://a/b");
        record.attributes.insert(ATTR_TVG_NAME, "CCTV5 广播");
        assert!(canonical_matcher().match_record(record, None).is_none());
    }

    #[test]
    fn test_canonical_style_rewrites_attributes() {
        let mut record = ChannelRecord::new("Whatever", "http://a/b");
        record.attributes.insert(ATTR_TVG_NAME, "Sky Sports F1 UK");
        record.attributes.insert(ATTR_TVG_LOGO, "f1.png");
        record.extras.push("#EXTVLCOPT:http-referrer=x".to_string());

        let matched = canonical_matcher()
            .match_record(record, Some("okhttp/4.9"))
            .unwrap();
        assert_eq!(matched.name, "Sky Sports F1");
        assert!(matched.extras.is_empty());
        assert_eq!(matched.attribute(ATTR_TVG_NAME), None);

        let keys: Vec<&str> = matched.attributes.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["group-title", "http-user-agent", "tvg-id", "tvg-logo"]);
        assert_eq!(matched.attribute(ATTR_TVG_ID), Some("Sky Sports F1"));
        assert_eq!(matched.attribute(ATTR_HTTP_USER_AGENT), Some("okhttp/4.9"));
    }

    #[test]
    fn test_canonical_style_also_matches_guide_id() {
        let mut record = ChannelRecord::new("体育频道", "http://a/b");
        record.attributes.insert(ATTR_TVG_NAME, "体育频道");
        record.attributes.insert(ATTR_TVG_ID, "CCTV5");

        let matched = canonical_matcher().match_record(record.clone(), None).unwrap();
        assert_eq!(matched.name, "CCTV5");

        let grouped = ChannelMatcher::new(
            MatchStyle::Grouped,
            vec![TargetRule::literal("CCTV5", "CCTV5")],
            Vec::new(),
            GroupMappings::default(),
        );
        assert!(grouped.match_record(record, None).is_none());
    }

    #[test]
    fn test_match_document_keeps_source_order() {
        let document = "#EXTM3U x-tvg-url=\"b.xml, c.xml\"\n\
            #EXTINF:-1,CCTV5+\nhttp://a/1\n\
            #EXTINF:-1 tvg-name=\"CCTV5\",ignored\nhttp://a/2\n\
            #EXTINF:-1,CNN\nhttp://a/3\n\
            #EXTINF:-1;广东体育\nhttp://a/4\n";

        let matched = default_matcher().match_document(document, None).unwrap();
        let names: Vec<&str> = matched.channels.iter().map(|record| record.name.as_str()).collect();
        assert_eq!(names, vec!["CCTV5+", "CCTV5", "广东体育"]);
        assert_eq!(matched.guide_urls, vec!["b.xml", "c.xml"]);
    }

    #[test]
    fn test_header_without_guide_urls() {
        let matched = default_matcher().match_document("#EXTM3U\n", None).unwrap();
        assert!(matched.channels.is_empty());
        assert!(matched.guide_urls.is_empty());
    }

    #[rstest]
    #[case("<html>502</html>")]
    #[case("#EXTM3U x-tvg-url=\"z.xml\"\n#EXTINF:-1,CCTV5\n")]
    fn test_undecodable_document_contributes_nothing(#[case] document: &str) {
        assert_eq!(default_matcher().match_document(document, None), None);
    }
}
