//! Refresh orchestration: sources in, one snapshot out.

use std::sync::Arc;

use ratewatch_common::{
    now, CrossRate, CurrencyPair, Forecast, PrimaryRate, PrimarySource, RateSnapshot,
    ReferenceRates,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::browser::ChromeLauncher;
use crate::config::AggregatorConfig;
use crate::cross::CrossRateSource;
use crate::error::FxResult;
use crate::forecast::forecast;
use crate::market::MarketRateSource;
use crate::provider::{FeedClient, RateSource};
use crate::reference::ReferenceRateSource;
use crate::scraped::ScrapedRateSource;

/// The four upstreams of a refresh.
#[derive(Clone)]
pub struct RateSources {
    pub reference: Arc<dyn RateSource<Output = ReferenceRates>>,
    pub market: Arc<dyn RateSource<Output = Decimal>>,
    pub cross: Arc<dyn RateSource<Output = Decimal>>,
    pub scraped: Arc<dyn RateSource<Output = Decimal>>,
}

impl RateSources {
    /// Production sources built from configuration.
    pub fn live(config: &AggregatorConfig) -> FxResult<Self> {
        let client = FeedClient::new(&config.sources)?;
        let sources = &config.sources;

        Ok(Self {
            reference: Arc::new(ReferenceRateSource::new(
                client.clone(),
                &sources.reference_url,
            )),
            market: Arc::new(MarketRateSource::new(client.clone(), &sources.market_url)),
            cross: Arc::new(CrossRateSource::new(
                client,
                CurrencyPair::eur_cny(),
                &sources.cross_primary_url,
                &sources.cross_fallback_url,
            )),
            scraped: Arc::new(ScrapedRateSource::new(
                ChromeLauncher {
                    chrome_path: config.scrape.chrome_path.clone(),
                },
                config.scrape.clone(),
            )?),
        })
    }
}

/// A snapshot with the values derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateReport {
    pub snapshot: RateSnapshot,
    pub primary: Option<PrimaryRate>,
    pub forecast: Option<Forecast>,
}

/// Combines the sources into snapshots and derives primary rate and forecast.
pub struct RateAggregator {
    sources: RateSources,
    config: AggregatorConfig,
}

impl RateAggregator {
    /// Create an aggregator over the given sources.
    pub fn new(sources: RateSources, config: AggregatorConfig) -> Self {
        Self { sources, config }
    }

    /// Create an aggregator over the production sources.
    pub fn from_config(config: AggregatorConfig) -> FxResult<Self> {
        let sources = RateSources::live(&config)?;
        Ok(Self::new(sources, config))
    }

    /// Query every source once, one after another, and assemble a snapshot.
    ///
    /// Never fails: an unavailable source leaves its field empty.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> RateSnapshot {
        let reference = self.sources.reference.fetch().await;
        let cny_rub = self.sources.market.fetch().await;
        let eur_cny = self.sources.cross.fetch().await;
        let scraped = self.sources.scraped.fetch().await;

        let snapshot = RateSnapshot {
            reference,
            cross: CrossRate::new(cny_rub, eur_cny),
            scraped,
            fetched_at: now(),
        };

        info!(
            available = snapshot.available_sources(),
            reference = snapshot.reference.is_some(),
            market = snapshot.cross.cny_rub.is_some(),
            conversion = snapshot.cross.eur_cny.is_some(),
            scraped = snapshot.scraped.is_some(),
            "Refresh complete"
        );
        if snapshot.is_empty() {
            warn!("No source answered");
        }

        snapshot
    }

    /// Best available market rate: scraped, else offset-adjusted cross rate.
    pub fn primary_rate(&self, snapshot: &RateSnapshot) -> Option<PrimaryRate> {
        if let Some(value) = snapshot.scraped {
            return Some(PrimaryRate {
                value,
                source: PrimarySource::Scraped,
            });
        }

        let cross = snapshot.cross.value?;
        Some(PrimaryRate {
            value: cross.checked_sub(self.config.calibration_offset)?,
            source: PrimarySource::CrossAdjusted,
        })
    }

    /// Forecast for the next official rate, when both inputs are present.
    pub fn forecast(&self, snapshot: &RateSnapshot) -> Option<Forecast> {
        let primary = self.primary_rate(snapshot)?;
        let reference = snapshot.reference_rate()?;
        forecast(primary.value, reference, &self.config.forecast)
    }

    /// Snapshot plus derived values.
    pub fn report(&self, snapshot: RateSnapshot) -> RateReport {
        RateReport {
            primary: self.primary_rate(&snapshot),
            forecast: self.forecast(&snapshot),
            snapshot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticSource;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn reference(eur: Decimal) -> ReferenceRates {
        ReferenceRates {
            eur,
            eur_previous: eur - dec!(0.5),
            usd: dec!(90.75),
            cny: dec!(12.53),
            date: NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
        }
    }

    struct Upstreams {
        reference: Option<ReferenceRates>,
        market: Option<Decimal>,
        cross: Option<Decimal>,
        scraped: Option<Decimal>,
    }

    fn source<T: Clone + Send + Sync + 'static>(
        name: &str,
        pair: CurrencyPair,
        value: Option<T>,
    ) -> Arc<StaticSource<T>> {
        Arc::new(match value {
            Some(v) => StaticSource::available(name, pair, v),
            None => StaticSource::unavailable(name, pair),
        })
    }

    fn aggregator(up: Upstreams) -> RateAggregator {
        let sources = RateSources {
            reference: source("reference", CurrencyPair::eur_rub(), up.reference),
            market: source("market", CurrencyPair::cny_rub(), up.market),
            cross: source("cross", CurrencyPair::eur_cny(), up.cross),
            scraped: source("scraped", CurrencyPair::eur_rub(), up.scraped),
        };
        RateAggregator::new(sources, AggregatorConfig::default())
    }

    #[tokio::test]
    async fn test_refresh_all_sources() {
        let agg = aggregator(Upstreams {
            reference: Some(reference(dec!(94.0))),
            market: Some(dec!(12.5)),
            cross: Some(dec!(7.8)),
            scraped: Some(dec!(95.0)),
        });

        let snapshot = agg.refresh().await;

        assert_eq!(snapshot.cross.value, Some(dec!(97.5)));
        assert_eq!(snapshot.available_sources(), 4);

        let primary = agg.primary_rate(&snapshot).unwrap();
        assert_eq!(primary.value, dec!(95.0));
        assert_eq!(primary.source, PrimarySource::Scraped);

        let forecast = agg.forecast(&snapshot).unwrap();
        assert_eq!(forecast.estimate, dec!(94.6));
        assert_eq!(forecast.low, dec!(94.4));
        assert_eq!(forecast.high, dec!(94.8));
    }

    #[tokio::test]
    async fn test_cross_fallback_applies_offset() {
        let agg = aggregator(Upstreams {
            reference: None,
            market: Some(dec!(2)),
            cross: Some(dec!(5.1)),
            scraped: None,
        });

        let snapshot = agg.refresh().await;
        assert_eq!(snapshot.cross.value, Some(dec!(10.2)));

        let primary = agg.primary_rate(&snapshot).unwrap();
        assert_eq!(primary.value, dec!(8.7));
        assert_eq!(primary.source, PrimarySource::CrossAdjusted);

        // no reference rate, no forecast
        assert_eq!(agg.forecast(&snapshot), None);
    }

    #[tokio::test]
    async fn test_forecast_from_adjusted_cross_rate() {
        let agg = aggregator(Upstreams {
            reference: Some(reference(dec!(94.0))),
            market: Some(dec!(12.5)),
            cross: Some(dec!(7.8)),
            scraped: None,
        });

        let report = agg.report(agg.refresh().await);

        // (97.5 - 1.5) * 0.6 + 94.0 * 0.4
        let primary = report.primary.unwrap();
        assert_eq!(primary.value, dec!(96.0));
        assert_eq!(primary.source, PrimarySource::CrossAdjusted);
        let forecast = report.forecast.unwrap();
        assert_eq!(forecast.estimate, dec!(95.2));
        assert_eq!(forecast.low, dec!(95.0));
        assert_eq!(forecast.high, dec!(95.4));
    }

    #[tokio::test]
    async fn test_oversized_market_leg_is_unavailable() {
        let huge = Decimal::from_str_exact("50000000000000000000000000000").unwrap();
        let agg = aggregator(Upstreams {
            reference: Some(reference(dec!(94.0))),
            market: Some(huge),
            cross: Some(dec!(7.8)),
            scraped: None,
        });

        let report = agg.report(agg.refresh().await);

        assert_eq!(report.snapshot.cross.cny_rub, Some(huge));
        assert_eq!(report.snapshot.cross.value, None);
        assert_eq!(report.primary, None);
        assert_eq!(report.forecast, None);
    }

    #[tokio::test]
    async fn test_offset_underflow_is_unavailable() {
        let mut agg = aggregator(Upstreams {
            reference: None,
            market: Some(dec!(1)),
            cross: Some(Decimal::MIN),
            scraped: None,
        });
        agg.config.calibration_offset = Decimal::MAX;

        let snapshot = agg.refresh().await;

        assert_eq!(snapshot.cross.value, Some(Decimal::MIN));
        assert_eq!(agg.primary_rate(&snapshot), None);
    }

    #[tokio::test]
    async fn test_zero_offset() {
        let mut agg = aggregator(Upstreams {
            reference: Some(reference(dec!(94.0))),
            market: Some(dec!(12.5)),
            cross: Some(dec!(7.8)),
            scraped: None,
        });
        agg.config.calibration_offset = Decimal::ZERO;

        let snapshot = agg.refresh().await;
        assert_eq!(agg.primary_rate(&snapshot).unwrap().value, dec!(97.5));
    }

    #[tokio::test]
    async fn test_half_cross_is_unavailable() {
        let agg = aggregator(Upstreams {
            reference: Some(reference(dec!(94.0))),
            market: None,
            cross: Some(dec!(7.8)),
            scraped: None,
        });

        let snapshot = agg.refresh().await;

        assert_eq!(snapshot.cross.eur_cny, Some(dec!(7.8)));
        assert_eq!(snapshot.cross.value, None);
        assert_eq!(agg.primary_rate(&snapshot), None);
        assert_eq!(agg.forecast(&snapshot), None);
    }

    #[tokio::test]
    async fn test_everything_unavailable() {
        let agg = aggregator(Upstreams {
            reference: None,
            market: None,
            cross: None,
            scraped: None,
        });

        let report = agg.report(agg.refresh().await);

        assert!(report.snapshot.is_empty());
        assert_eq!(report.primary, None);
        assert_eq!(report.forecast, None);
    }

    #[tokio::test]
    async fn test_every_source_queried_once() {
        let reference = source("reference", CurrencyPair::eur_rub(), None::<ReferenceRates>);
        let market = source("market", CurrencyPair::cny_rub(), Some(dec!(12.5)));
        let cross = source("cross", CurrencyPair::eur_cny(), None::<Decimal>);
        let scraped = source("scraped", CurrencyPair::eur_rub(), Some(dec!(98.1)));
        let agg = RateAggregator::new(
            RateSources {
                reference: reference.clone(),
                market: market.clone(),
                cross: cross.clone(),
                scraped: scraped.clone(),
            },
            AggregatorConfig::default(),
        );

        agg.refresh().await;

        assert_eq!(reference.calls(), 1);
        assert_eq!(market.calls(), 1);
        assert_eq!(cross.calls(), 1);
        assert_eq!(scraped.calls(), 1);
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent() {
        let agg = aggregator(Upstreams {
            reference: Some(reference(dec!(94.0))),
            market: Some(dec!(12.5)),
            cross: None,
            scraped: Some(dec!(98.45)),
        });

        let first = agg.refresh().await;
        let second = agg.refresh().await;

        assert!(first.same_rates(&second));
        assert_eq!(
            RateSnapshot {
                fetched_at: first.fetched_at,
                ..second.clone()
            },
            first
        );
        assert!(second.fetched_at >= first.fetched_at);
    }
}
