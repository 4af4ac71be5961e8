//! Source, scraping, forecast and aggregation configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::error::{FxError, FxResult};

/// User agent sent by every outbound request and by the rendering session.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Language header sent with every outbound request.
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "ru-RU,ru;q=0.9,en;q=0.8";

/// Upper bound for any duration read from the environment.
const MAX_SECS: f64 = 3600.0;

/// Open interval a scraped value must fall into to be believed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlausibleRange {
    pub lower: Decimal,
    pub upper: Decimal,
}

impl PlausibleRange {
    pub fn new(lower: Decimal, upper: Decimal) -> Self {
        Self { lower, upper }
    }

    /// Strict on both ends.
    pub fn contains(&self, value: Decimal) -> bool {
        self.lower < value && value < self.upper
    }
}

impl Default for PlausibleRange {
    fn default() -> Self {
        Self {
            lower: Decimal::from(80),
            upper: Decimal::from(200),
        }
    }
}

/// JSON feed endpoints and HTTP client settings.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Central bank daily rates feed.
    pub reference_url: String,
    /// Exchange market data for CNY/RUB.
    pub market_url: String,
    /// Primary EUR/CNY conversion API.
    pub cross_primary_url: String,
    /// Fallback EUR/CNY conversion API.
    pub cross_fallback_url: String,
    /// User agent header.
    pub user_agent: String,
    /// Accept-Language header.
    pub accept_language: String,
    /// Timeout for each JSON request.
    pub http_timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            reference_url: "https://www.cbr-xml-daily.ru/daily_json.js".to_string(),
            market_url: "https://iss.moex.com/iss/engines/currency/markets/selt/boards/CETS/securities/CNYRUB_TOM.json?iss.meta=off&iss.only=marketdata&marketdata.columns=SECID,LAST".to_string(),
            cross_primary_url: "https://api.exchangerate-api.com/v4/latest/EUR".to_string(),
            cross_fallback_url: "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api@latest/v1/currencies/eur.json".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            http_timeout: Duration::from_secs(5),
        }
    }
}

/// Rendering session and extraction settings for the scraped rate.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Page to render.
    pub url: String,
    /// User agent the browser presents.
    pub user_agent: String,
    /// Maximum time for the page load.
    pub page_load_timeout: Duration,
    /// Pause after load for client-side rendering.
    pub settle: Duration,
    /// Sanity bound against mis-parsed numbers.
    pub plausible_range: PlausibleRange,
    /// Browser binary; autodetected when `None`.
    pub chrome_path: Option<PathBuf>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            url: "https://www.profinance.ru/currency_eur.asp".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_load_timeout: Duration::from_secs(30),
            settle: Duration::from_secs(5),
            plausible_range: PlausibleRange::default(),
            chrome_path: None,
        }
    }
}

/// Weights and band of the next-official-rate heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastConfig {
    /// Weight of the primary market rate.
    pub primary_weight: Decimal,
    /// Weight of the current official rate.
    pub reference_weight: Decimal,
    /// Half-width of the interval around the estimate.
    pub band: Decimal,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            primary_weight: Decimal::new(6, 1),
            reference_weight: Decimal::new(4, 1),
            band: Decimal::new(2, 1),
        }
    }
}

/// Full configuration of a refresh.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub sources: SourceConfig,
    pub scrape: ScrapeConfig,
    pub forecast: ForecastConfig,
    /// Subtracted from the cross rate when it stands in for the scraped
    /// rate; the cross rate reads high against the market page.
    pub calibration_offset: Decimal,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            sources: SourceConfig::default(),
            scrape: ScrapeConfig::default(),
            forecast: ForecastConfig::default(),
            calibration_offset: Decimal::new(15, 1),
        }
    }
}

impl AggregatorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let parsed = |name: &str| var(name).and_then(|v| Decimal::from_str(&v).ok());
        let secs = |name: &str| {
            var(name)
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|s| s.is_finite() && (0.0..=MAX_SECS).contains(s))
                .map(Duration::from_secs_f64)
        };

        if let Some(url) = var("RATEWATCH_REFERENCE_URL") {
            config.sources.reference_url = url;
        }
        if let Some(url) = var("RATEWATCH_MARKET_URL") {
            config.sources.market_url = url;
        }
        if let Some(url) = var("RATEWATCH_CROSS_PRIMARY_URL") {
            config.sources.cross_primary_url = url;
        }
        if let Some(url) = var("RATEWATCH_CROSS_FALLBACK_URL") {
            config.sources.cross_fallback_url = url;
        }
        if let Some(url) = var("RATEWATCH_SCRAPE_URL") {
            config.scrape.url = url;
        }
        if let Some(path) = var("RATEWATCH_CHROME_PATH") {
            config.scrape.chrome_path = Some(PathBuf::from(path));
        }
        if let Some(agent) = var("RATEWATCH_USER_AGENT") {
            config.sources.user_agent = agent.clone();
            config.scrape.user_agent = agent;
        }
        if let Some(timeout) = secs("RATEWATCH_HTTP_TIMEOUT_SECS") {
            config.sources.http_timeout = timeout;
        }
        if let Some(timeout) = secs("RATEWATCH_PAGE_LOAD_TIMEOUT_SECS") {
            config.scrape.page_load_timeout = timeout;
        }
        if let Some(settle) = secs("RATEWATCH_SETTLE_SECS") {
            config.scrape.settle = settle;
        }
        if let Some(lower) = parsed("RATEWATCH_PLAUSIBLE_MIN") {
            config.scrape.plausible_range.lower = lower;
        }
        if let Some(upper) = parsed("RATEWATCH_PLAUSIBLE_MAX") {
            config.scrape.plausible_range.upper = upper;
        }
        if let Some(offset) = parsed("RATEWATCH_CALIBRATION_OFFSET") {
            config.calibration_offset = offset;
        }
        if let Some(weight) = parsed("RATEWATCH_FORECAST_PRIMARY_WEIGHT") {
            config.forecast.primary_weight = weight;
        }
        if let Some(weight) = parsed("RATEWATCH_FORECAST_REFERENCE_WEIGHT") {
            config.forecast.reference_weight = weight;
        }
        if let Some(band) = parsed("RATEWATCH_FORECAST_BAND") {
            config.forecast.band = band;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> FxResult<()> {
        let urls = [
            ("reference", &self.sources.reference_url),
            ("market", &self.sources.market_url),
            ("cross primary", &self.sources.cross_primary_url),
            ("cross fallback", &self.sources.cross_fallback_url),
            ("scrape", &self.scrape.url),
        ];
        if let Some((name, _)) = urls.iter().find(|(_, url)| url.is_empty()) {
            return Err(FxError::Config(format!("{name} URL cannot be empty")));
        }

        if self.sources.http_timeout.is_zero() || self.scrape.page_load_timeout.is_zero() {
            return Err(FxError::Config("Timeouts must be positive".to_string()));
        }

        let range = self.scrape.plausible_range;
        if range.lower >= range.upper {
            return Err(FxError::Config(format!(
                "Plausible range is empty: ({}, {})",
                range.lower, range.upper
            )));
        }

        let forecast = &self.forecast;
        if forecast.primary_weight.is_sign_negative() || forecast.reference_weight.is_sign_negative()
        {
            return Err(FxError::Config("Forecast weights cannot be negative".to_string()));
        }
        if forecast.primary_weight + forecast.reference_weight != Decimal::ONE {
            return Err(FxError::Config(format!(
                "Forecast weights must sum to 1, got {} + {}",
                forecast.primary_weight, forecast.reference_weight
            )));
        }
        if forecast.band.is_sign_negative() {
            return Err(FxError::Config("Forecast band cannot be negative".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AggregatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.calibration_offset, dec!(1.5));
        assert_eq!(config.forecast.primary_weight, dec!(0.6));
        assert_eq!(config.forecast.reference_weight, dec!(0.4));
        assert_eq!(config.forecast.band, dec!(0.2));
        assert_eq!(config.sources.http_timeout, Duration::from_secs(5));
        assert_eq!(config.scrape.plausible_range, PlausibleRange::new(dec!(80), dec!(200)));
        assert_eq!(config.scrape.chrome_path, None);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = AggregatorConfig::from_lookup(lookup(&[
            ("RATEWATCH_CALIBRATION_OFFSET", "0"),
            ("RATEWATCH_PLAUSIBLE_MAX", "150"),
            ("RATEWATCH_SETTLE_SECS", "3"),
            ("RATEWATCH_USER_AGENT", "ratewatch-test"),
            ("RATEWATCH_CHROME_PATH", "/usr/bin/chromium"),
        ]));

        assert_eq!(config.calibration_offset, Decimal::ZERO);
        assert_eq!(config.scrape.plausible_range.upper, dec!(150));
        assert_eq!(config.scrape.settle, Duration::from_secs(3));
        assert_eq!(config.sources.user_agent, "ratewatch-test");
        assert_eq!(config.scrape.user_agent, "ratewatch-test");
        assert_eq!(config.scrape.chrome_path, Some(PathBuf::from("/usr/bin/chromium")));
    }

    #[test]
    fn test_from_lookup_ignores_garbage() {
        let config = AggregatorConfig::from_lookup(lookup(&[
            ("RATEWATCH_CALIBRATION_OFFSET", "one and a half"),
            ("RATEWATCH_HTTP_TIMEOUT_SECS", "-4"),
            ("RATEWATCH_SCRAPE_URL", "   "),
        ]));

        assert_eq!(config.calibration_offset, dec!(1.5));
        assert_eq!(config.sources.http_timeout, Duration::from_secs(5));
        assert_eq!(config.scrape.url, ScrapeConfig::default().url);
    }

    #[test]
    fn test_invalid_range() {
        let mut config = AggregatorConfig::default();
        config.scrape.plausible_range = PlausibleRange::new(dec!(150), dec!(80));
        assert!(matches!(config.validate(), Err(FxError::Config(_))));
    }

    #[test]
    fn test_invalid_weights() {
        let mut config = AggregatorConfig::default();
        config.forecast.primary_weight = dec!(0.7);
        assert!(config.validate().is_err());

        config.forecast.primary_weight = dec!(1.2);
        config.forecast.reference_weight = dec!(-0.2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_band_and_timeout() {
        let mut config = AggregatorConfig::default();
        config.forecast.band = dec!(-0.1);
        assert!(config.validate().is_err());

        let mut config = AggregatorConfig::default();
        config.sources.http_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_plausible_range_is_strict() {
        let range = PlausibleRange::default();
        assert!(!range.contains(dec!(80)));
        assert!(range.contains(dec!(80.01)));
        assert!(range.contains(dec!(199.99)));
        assert!(!range.contains(dec!(200)));
    }
}
