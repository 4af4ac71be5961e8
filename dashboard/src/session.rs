//! Per-process dashboard state.

use ratewatch_common::{age_label, RateSnapshot};
use ratewatch_fx::{RateAggregator, RateReport};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// The latest snapshot and the aggregator that produces new ones.
///
/// Readers never block each other; refreshes are serialised so at most one
/// refresh chain runs at a time.
pub struct Session {
    aggregator: RateAggregator,
    latest: RwLock<Option<RateSnapshot>>,
    refresh_lock: Mutex<()>,
}

impl Session {
    /// Create an empty session.
    pub fn new(aggregator: RateAggregator) -> Self {
        Self {
            aggregator,
            latest: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Run a full refresh and store the result.
    pub async fn refresh(&self) -> RateSnapshot {
        let _guard = self.refresh_lock.lock().await;
        self.store_fresh().await
    }

    /// Latest stored snapshot, if any refresh has completed.
    pub async fn latest(&self) -> Option<RateSnapshot> {
        self.latest.read().await.clone()
    }

    /// Latest snapshot, refreshing first when the session is still empty.
    pub async fn latest_or_refresh(&self) -> RateSnapshot {
        if let Some(snapshot) = self.latest().await {
            debug!(age = %age_label(snapshot.fetched_at), "Serving stored snapshot");
            return snapshot;
        }

        let _guard = self.refresh_lock.lock().await;
        // A concurrent first request may have filled it while we waited.
        if let Some(snapshot) = self.latest().await {
            return snapshot;
        }
        self.store_fresh().await
    }

    /// Latest snapshot with primary rate and forecast.
    pub async fn report(&self) -> RateReport {
        let snapshot = self.latest_or_refresh().await;
        self.aggregator.report(snapshot)
    }

    async fn store_fresh(&self) -> RateSnapshot {
        let snapshot = self.aggregator.refresh().await;
        *self.latest.write().await = Some(snapshot.clone());
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratewatch_common::{CurrencyPair, ReferenceRates};
    use ratewatch_fx::{AggregatorConfig, RateSources, StaticSource};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn session(scraped: Arc<StaticSource<Decimal>>) -> Session {
        let sources = RateSources {
            reference: Arc::new(StaticSource::<ReferenceRates>::unavailable(
                "reference",
                CurrencyPair::eur_rub(),
            )),
            market: Arc::new(StaticSource::available("market", CurrencyPair::cny_rub(), dec!(12.5))),
            cross: Arc::new(StaticSource::available("cross", CurrencyPair::eur_cny(), dec!(7.8))),
            scraped,
        };
        Session::new(RateAggregator::new(sources, AggregatorConfig::default()))
    }

    #[tokio::test]
    async fn test_first_read_refreshes_once() {
        let scraped = Arc::new(StaticSource::available("scraped", CurrencyPair::eur_rub(), dec!(98.45)));
        let session = session(scraped.clone());

        assert!(session.latest().await.is_none());

        let first = session.latest_or_refresh().await;
        let second = session.latest_or_refresh().await;

        assert_eq!(first, second);
        assert_eq!(first.scraped, Some(dec!(98.45)));
        assert_eq!(scraped.calls(), 1);
    }

    #[tokio::test]
    async fn test_explicit_refresh_always_fetches() {
        let scraped = Arc::new(StaticSource::unavailable("scraped", CurrencyPair::eur_rub()));
        let session = session(scraped.clone());

        session.refresh().await;
        session.refresh().await;

        assert_eq!(scraped.calls(), 2);
        assert!(session.latest().await.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_first_reads_share_one_refresh() {
        let scraped = Arc::new(StaticSource::available("scraped", CurrencyPair::eur_rub(), dec!(98.45)));
        let session = Arc::new(session(scraped.clone()));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let session = Arc::clone(&session);
                tokio::spawn(async move { session.latest_or_refresh().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(scraped.calls(), 1);
    }

    #[tokio::test]
    async fn test_report_uses_cross_fallback() {
        let scraped = Arc::new(StaticSource::unavailable("scraped", CurrencyPair::eur_rub()));
        let report = session(scraped).report().await;

        let primary = report.primary.unwrap();
        assert_eq!(primary.value, dec!(96.0));
        assert_eq!(report.forecast, None);
    }
}
