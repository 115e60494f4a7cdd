//! Content sources: resolves a source URL and streams its bytes into a sink.

mod data;
pub mod headers;
mod http;

pub use headers::{parse_headers, HeaderError};

use crate::config::FetchSettings;
use crate::error::{IgnExtractError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use url::Url;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("unsupported source scheme: {scheme}")]
    UnsupportedScheme { scheme: String },

    #[error("invalid data url: {reason}")]
    InvalidDataUrl { reason: String },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("writing content failed: {0}")]
    Write(#[from] std::io::Error),
}

/// Per-fetch options. Header order is preserved on the wire.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub headers: Vec<(HeaderName, HeaderValue)>,
}

impl FetchOptions {
    pub fn with_headers(headers: Vec<(HeaderName, HeaderValue)>) -> Self {
        Self { headers }
    }
}

/// Parse a declared source URL.
///
/// URL parsing strips trailing spaces, which for `data:` sources belong to the
/// payload; they are kept as `%20` instead.
pub fn parse_source(raw: &str) -> std::result::Result<Url, url::ParseError> {
    let kept = raw.trim_end_matches(' ');
    let trailing = raw.len() - kept.len();
    if trailing == 0 || kept.is_empty() {
        return Url::parse(raw);
    }

    Url::parse(&format!("{}{}", kept, "%20".repeat(trailing)))
}

/// Streams the bytes behind `source` into `sink`, returning how many were written.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(
        &self,
        source: &Url,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        options: &FetchOptions,
    ) -> std::result::Result<u64, FetchError>;
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Exponential backoff: base, 2*base, 4*base, ...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(16))
    }
}

/// Default fetcher: `data:` and `http(s):` sources.
pub struct Fetcher {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.timeout_duration())
            .build()
            .map_err(|e| IgnExtractError::Config {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            retry: RetryPolicy {
                max_retries: settings.retries,
                base_delay: settings.retry_delay(),
            },
        })
    }
}

#[async_trait]
impl ContentFetcher for Fetcher {
    async fn fetch(
        &self,
        source: &Url,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        options: &FetchOptions,
    ) -> std::result::Result<u64, FetchError> {
        match source.scheme() {
            "data" => {
                let bytes = data::decode(source)?;
                sink.write_all(&bytes).await?;
                Ok(bytes.len() as u64)
            }
            "http" | "https" => {
                http::fetch(&self.client, source, &options.headers, self.retry, sink).await
            }
            other => Err(FetchError::UnsupportedScheme {
                scheme: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_fetcher() -> Fetcher {
        let mut settings = Settings::default();
        settings.fetch.retries = 2;
        settings.fetch.retry_delay_ms = 5;
        Fetcher::new(&settings.fetch).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_data_url() {
        let fetcher = test_fetcher();
        let mut sink: Vec<u8> = Vec::new();
        let url = Url::parse("data:,hello").unwrap();

        let written = fetcher
            .fetch(&url, &mut sink, &FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(written, 5);
        assert_eq!(sink, b"hello");
    }

    #[test]
    fn test_parse_source_keeps_trailing_spaces() {
        assert_eq!(parse_source("data:,hi ").unwrap().as_str(), "data:,hi%20");
        assert_eq!(parse_source("data:,hi").unwrap().as_str(), "data:,hi");
        assert_eq!(
            parse_source("https://example.com/motd").unwrap().as_str(),
            "https://example.com/motd"
        );
        assert!(parse_source("not a url").is_err());
        assert!(parse_source("   ").is_err());
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let fetcher = test_fetcher();
        let mut sink: Vec<u8> = Vec::new();

        for source in ["s3://bucket/key", "tftp://host/file", "ftp://host/file"] {
            let url = Url::parse(source).unwrap();
            let err = fetcher
                .fetch(&url, &mut sink, &FetchOptions::default())
                .await
                .unwrap_err();
            assert!(matches!(err, FetchError::UnsupportedScheme { .. }), "{}", source);
        }
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_http_with_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/motd"))
            .and(header("x-token", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string("welcome"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = test_fetcher();
        let url = Url::parse(&format!("{}/motd", server.uri())).unwrap();
        let options = FetchOptions::with_headers(vec![(
            HeaderName::from_static("x-token"),
            HeaderValue::from_static("secret"),
        )]);

        let mut sink: Vec<u8> = Vec::new();
        let written = fetcher.fetch(&url, &mut sink, &options).await.unwrap();

        assert_eq!(written, 7);
        assert_eq!(sink, b"welcome");
    }

    #[tokio::test]
    async fn test_http_not_found_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = test_fetcher();
        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let mut sink: Vec<u8> = Vec::new();

        let err = fetcher
            .fetch(&url, &mut sink, &FetchOptions::default())
            .await
            .unwrap_err();

        match err {
            FetchError::HttpStatus { status, .. } => assert_eq!(status.as_u16(), 404),
            other => panic!("unexpected error: {}", other),
        }
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_http_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
            .mount(&server)
            .await;

        let fetcher = test_fetcher();
        let url = Url::parse(&format!("{}/flaky", server.uri())).unwrap();
        let mut sink: Vec<u8> = Vec::new();

        fetcher
            .fetch(&url, &mut sink, &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(sink, b"recovered");
    }

    #[tokio::test]
    async fn test_http_gives_up_after_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3) // 1 initial + 2 retries
            .mount(&server)
            .await;

        let fetcher = test_fetcher();
        let url = Url::parse(&format!("{}/down", server.uri())).unwrap();
        let mut sink: Vec<u8> = Vec::new();

        let err = fetcher
            .fetch(&url, &mut sink, &FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus { .. }));
    }

    #[test]
    fn test_retry_backoff() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
    }
}
