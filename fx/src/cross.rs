//! EUR/CNY from public conversion APIs, with a second API as fallback.

use async_trait::async_trait;
use ratewatch_common::CurrencyPair;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{FxError, FxResult};
use crate::provider::{FeedClient, RateSource};

/// Conversion-API leg of the cross rate.
///
/// Tries the primary API once; on any failure tries the fallback API
/// once. The fallback is never contacted when the primary answers.
pub struct CrossRateSource {
    client: FeedClient,
    pair: CurrencyPair,
    primary_url: String,
    fallback_url: String,
}

impl CrossRateSource {
    /// Create a source for `pair` using the two API URLs.
    pub fn new(
        client: FeedClient,
        pair: CurrencyPair,
        primary_url: impl Into<String>,
        fallback_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            pair,
            primary_url: primary_url.into(),
            fallback_url: fallback_url.into(),
        }
    }

    /// `{"rates": {"CNY": 7.8}}`
    async fn fetch_primary(&self) -> FxResult<Decimal> {
        let body: Value = self.client.get_json(&self.primary_url).await?;
        let pointer = format!("/rates/{}", self.pair.quote.code());
        rate_at(&body, &pointer)
    }

    /// `{"eur": {"cny": 7.9}}`
    async fn fetch_fallback(&self) -> FxResult<Decimal> {
        let body: Value = self.client.get_json(&self.fallback_url).await?;
        let pointer = format!(
            "/{}/{}",
            self.pair.base.lowercase_code(),
            self.pair.quote.lowercase_code()
        );
        rate_at(&body, &pointer)
    }
}

#[async_trait]
impl RateSource for CrossRateSource {
    type Output = Decimal;

    fn name(&self) -> &str {
        "conversion-api"
    }

    fn pair(&self) -> CurrencyPair {
        self.pair.clone()
    }

    async fn try_fetch(&self) -> FxResult<Decimal> {
        let primary = match self.fetch_primary().await {
            Ok(rate) => {
                debug!(pair = %self.pair, rate = %rate, "Primary conversion API answered");
                return Ok(rate);
            }
            Err(e) => e,
        };

        warn!(
            pair = %self.pair,
            error = %primary,
            "Primary conversion API failed, trying fallback"
        );

        self.fetch_fallback()
            .await
            .map_err(|fallback| FxError::BothTiersFailed {
                primary: primary.to_string(),
                fallback: fallback.to_string(),
            })
    }
}

/// Read a positive decimal at a JSON pointer.
fn rate_at(body: &Value, pointer: &str) -> FxResult<Decimal> {
    let value = body
        .pointer(pointer)
        .filter(|v| v.is_number())
        .ok_or_else(|| FxError::Shape(format!("no number at {pointer}")))?;

    let rate: Decimal = serde_json::from_value(value.clone())?;
    if rate <= Decimal::ZERO {
        return Err(FxError::Shape(format!("non-positive rate {rate} at {pointer}")));
    }
    Ok(rate)
}
