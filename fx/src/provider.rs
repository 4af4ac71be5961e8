//! Rate source trait and the shared JSON feed client.

use async_trait::async_trait;
use ratewatch_common::CurrencyPair;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::SourceConfig;
use crate::error::{FxError, FxResult};

/// An independently failing upstream of one rate.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// What a successful fetch produces.
    type Output: Send + 'static;

    /// Get the source name.
    fn name(&self) -> &str;

    /// Pair this source quotes.
    fn pair(&self) -> CurrencyPair;

    /// Single attempt against the upstream, with the failure reason.
    async fn try_fetch(&self) -> FxResult<Self::Output>;

    /// Single attempt that degrades every failure to `None`.
    async fn fetch(&self) -> Option<Self::Output> {
        match self.try_fetch().await {
            Ok(value) => {
                debug!(source = self.name(), pair = %self.pair(), "Source answered");
                Some(value)
            }
            Err(e) => {
                warn!(
                    source = self.name(),
                    pair = %self.pair(),
                    error = %e,
                    "Source unavailable"
                );
                None
            }
        }
    }
}

/// HTTP client shared by the JSON feeds.
///
/// Every request carries the configured user agent and language header and
/// is bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: reqwest::Client,
}

impl FeedClient {
    /// Build a client from source configuration.
    pub fn new(config: &SourceConfig) -> FxResult<Self> {
        let mut headers = HeaderMap::new();
        let language = HeaderValue::from_str(&config.accept_language)
            .map_err(|e| FxError::Config(format!("invalid Accept-Language: {e}")))?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| FxError::Config(e.to_string()))?;

        Ok(Self { client })
    }

    /// GET a URL and return the body of a successful response.
    pub async fn get_text(&self, url: &str) -> FxResult<String> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FxError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    /// GET a URL and decode its body as JSON.
    ///
    /// Decoding goes through the text body because some feeds serve JSON
    /// with a JavaScript content type.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> FxResult<T> {
        let body = self.get_text(url).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Source returning a fixed value, for tests.
#[cfg(any(test, feature = "test-utils"))]
pub struct StaticSource<T> {
    name: String,
    pair: CurrencyPair,
    value: Option<T>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl<T> StaticSource<T> {
    /// Source that always answers with `value`.
    pub fn available(name: impl Into<String>, pair: CurrencyPair, value: T) -> Self {
        Self {
            name: name.into(),
            pair,
            value: Some(value),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Source that always fails.
    pub fn unavailable(name: impl Into<String>, pair: CurrencyPair) -> Self {
        Self {
            name: name.into(),
            pair,
            value: None,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Number of fetch attempts so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl<T> RateSource for StaticSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = T;

    fn name(&self) -> &str {
        &self.name
    }

    fn pair(&self) -> CurrencyPair {
        self.pair.clone()
    }

    async fn try_fetch(&self) -> FxResult<T> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.value
            .clone()
            .ok_or_else(|| FxError::Transport(format!("{} is offline", self.name)))
    }
}
