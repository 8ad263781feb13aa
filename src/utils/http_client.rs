use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult, SourceError};
use crate::utils::url::UrlUtils;
use crate::utils::{CompressionFormat, DecompressionService};

/// HTTP client trait that provides automatic decompression for fetched text
#[async_trait]
pub trait DecompressingHttpClient: Send + Sync {
    /// Fetch URL and return decompressed text content
    async fn fetch_text(&self, url: &str) -> AppResult<String> {
        self.fetch_text_with_headers(url, &[]).await
    }

    /// Fetch URL with custom headers and return decompressed text
    async fn fetch_text_with_headers(&self, url: &str, headers: &[(&str, &str)]) -> AppResult<String>;
}

/// Default implementation of DecompressingHttpClient using reqwest
pub struct StandardHttpClient {
    client: Client,
}

impl StandardHttpClient {
    /// Create a client with both a connect timeout and an overall request timeout
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()?;

        Ok(Self { client })
    }

    fn send_error(error: reqwest::Error, url: &str) -> AppError {
        let url = UrlUtils::obfuscate_credentials(url);
        if error.is_timeout() {
            SourceError::Timeout { url }.into()
        } else {
            SourceError::Transport {
                message: UrlUtils::obfuscate_credentials(&error.to_string()),
            }
            .into()
        }
    }

    /// Check status, read the body and decompress it if needed
    async fn process_response_to_bytes(response: Response, url: &str) -> AppResult<Vec<u8>> {
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                message: format!(
                    "{} - URL: {}",
                    status.canonical_reason().unwrap_or("Unknown"),
                    UrlUtils::obfuscate_credentials(url)
                ),
            }
            .into());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::send_error(e, url))?;

        debug!("Fetched {} bytes of raw content", bytes.len());

        let compression_format = DecompressionService::detect_compression_format(&bytes);
        let decompressed_bytes = match compression_format {
            CompressionFormat::Uncompressed => bytes.to_vec(),
            _ => DecompressionService::decompress(bytes).map_err(|e| {
                AppError::external_service(
                    "http_client",
                    format!("Failed to decompress content: {e:#}"),
                )
            })?,
        };

        debug!(
            "Processed {} bytes of content (compression: {:?})",
            decompressed_bytes.len(),
            compression_format
        );

        Ok(decompressed_bytes)
    }
}

#[async_trait]
impl DecompressingHttpClient for StandardHttpClient {
    async fn fetch_text_with_headers(&self, url: &str, headers: &[(&str, &str)]) -> AppResult<String> {
        debug!("Fetching text content from: {}", UrlUtils::obfuscate_credentials(url));

        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Self::send_error(e, url))?;

        let decompressed_bytes = Self::process_response_to_bytes(response, url).await?;

        let content = match String::from_utf8(decompressed_bytes) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "Content from {} is not valid UTF-8, replacing invalid sequences",
                    UrlUtils::obfuscate_credentials(url)
                );
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };

        debug!("Successfully fetched {} characters of text content", content.len());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> StandardHttpClient {
        StandardHttpClient::new(Duration::from_secs(2), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_text_sends_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/iptv.m3u"))
            .and(header("User-Agent", "iPlayTV/3.3.9"))
            .respond_with(ResponseTemplate::new(200).set_body_string("#EXTM3U\n"))
            .mount(&server)
            .await;

        let text = client()
            .fetch_text_with_headers(
                &format!("{}/iptv.m3u", server.uri()),
                &[("User-Agent", "iPlayTV/3.3.9")],
            )
            .await
            .unwrap();
        assert_eq!(text, "#EXTM3U\n");
    }

    #[tokio::test]
    async fn test_non_success_status_is_a_source_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = client().fetch_text(&format!("{}/missing.m3u", server.uri())).await;
        assert!(matches!(
            result,
            Err(AppError::Source(SourceError::Http { status: 404, .. }))
        ));
    }

    #[cfg(feature = "compression-gzip")]
    #[tokio::test]
    async fn test_gzip_body_is_decompressed() {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all("#EXTM3U\n#EXTINF:-1,CCTV5\nhttp://a/b\n".as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(compressed))
            .mount(&server)
            .await;

        let text = client().fetch_text(&server.uri()).await.unwrap();
        assert!(text.contains("CCTV5"));
    }
}
