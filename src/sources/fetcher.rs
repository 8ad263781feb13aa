//! Remote playlist retrieval
//!
//! A failed download never aborts a run: the error is logged and the source
//! is reported as unavailable.

use tracing::{debug, error};

use crate::config::SourceConfig;
use crate::utils::{DecompressingHttpClient, UrlUtils};

const USER_AGENT_HEADER: &str = "User-Agent";

/// Downloads playlist text for configured sources
pub struct SourceFetcher<C> {
    client: C,
    default_user_agent: String,
}

impl<C: DecompressingHttpClient> SourceFetcher<C> {
    pub fn new(client: C, default_user_agent: impl Into<String>) -> Self {
        Self {
            client,
            default_user_agent: default_user_agent.into(),
        }
    }

    /// Request headers for a source: default User-Agent, then the source
    /// User-Agent, then the source's extra headers (matched case-insensitively).
    pub fn request_headers(&self, source: &SourceConfig) -> Vec<(String, String)> {
        let user_agent = source
            .user_agent
            .as_deref()
            .unwrap_or(&self.default_user_agent);
        let mut headers = vec![(USER_AGENT_HEADER.to_string(), user_agent.to_string())];

        for (name, value) in &source.headers {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }

        headers
    }

    /// Fetch the raw playlist text, or `None` when the source is unavailable
    pub async fn fetch(&self, source: &SourceConfig) -> Option<String> {
        let url = UrlUtils::obfuscate_credentials(&source.url);
        let headers = self.request_headers(source);
        let header_refs: Vec<(&str, &str)> = headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();

        debug!("Fetching source url={} headers={}", url, header_refs.len());

        match self
            .client
            .fetch_text_with_headers(&source.url, &header_refs)
            .await
        {
            Ok(text) => {
                debug!("Fetched source url={} bytes={}", url, text.len());
                Some(text)
            }
            Err(e) => {
                error!("Failed to fetch source url={} error={}", url, e);
                None
            }
        }
    }
}
