//! RateWatch FX
//!
//! EUR/RUB rate sources and their reconciliation.
//!
//! # Features
//!
//! - Central bank reference rates, exchange market price and a two-tier
//!   conversion API source, all over one HTTP client
//! - Scraped rate from a headless-rendered page with plausibility bounds
//! - Sequential aggregation into a [`RateSnapshot`](ratewatch_common::RateSnapshot)
//!   where every source may independently be unavailable
//! - Primary rate fallback hierarchy and next official rate forecast
//!
//! # Example
//!
//! ```rust,ignore
//! use ratewatch_fx::{AggregatorConfig, RateAggregator};
//!
//! let aggregator = RateAggregator::from_config(AggregatorConfig::from_env())?;
//!
//! let snapshot = aggregator.refresh().await;
//! if let Some(forecast) = aggregator.forecast(&snapshot) {
//!     println!("next official EUR/RUB: {} .. {}", forecast.low, forecast.high);
//! }
//! ```

pub mod aggregator;
pub mod browser;
pub mod config;
pub mod cross;
pub mod error;
pub mod forecast;
pub mod market;
pub mod provider;
pub mod reference;
pub mod scraped;

pub use aggregator::{RateAggregator, RateReport, RateSources};
pub use browser::{ChromeLauncher, RenderSession, SessionLauncher};
pub use config::{AggregatorConfig, ForecastConfig, PlausibleRange, ScrapeConfig, SourceConfig};
pub use cross::CrossRateSource;
pub use error::{FxError, FxResult};
pub use market::MarketRateSource;
pub use provider::{FeedClient, RateSource};
pub use reference::ReferenceRateSource;
pub use scraped::{RatePatterns, ScrapedRateSource};

#[cfg(any(test, feature = "test-utils"))]
pub use browser::StaticPageLauncher;
#[cfg(any(test, feature = "test-utils"))]
pub use provider::StaticSource;
