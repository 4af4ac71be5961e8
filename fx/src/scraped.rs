//! EUR/RUB scraped from a rendered financial page.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use ratewatch_common::CurrencyPair;
use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use tracing::debug;

use crate::browser::{render_page, SessionLauncher};
use crate::config::{PlausibleRange, ScrapeConfig};
use crate::error::{FxError, FxResult};
use crate::provider::RateSource;

/// Tried in order; each captures a two-digit-integer decimal with `.` or `,`.
pub const EUR_RUB_PATTERNS: [&str; 3] = [
    r"EUR/RUB[^\d]*(\d{2}[.,]\d{2,4})",
    r"EURRUB[^\d]*(\d{2}[.,]\d{2,4})",
    r#"bid["\s:=]+(\d{2}[.,]\d{2,4})"#,
];

/// Ordered, case-insensitive extraction patterns.
#[derive(Debug, Clone)]
pub struct RatePatterns {
    patterns: Vec<Regex>,
}

impl RatePatterns {
    /// Compile patterns; each must have one capture group holding the number.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> FxResult<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let regex = RegexBuilder::new(p.as_ref())
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| FxError::Config(format!("bad pattern {:?}: {e}", p.as_ref())))?;
                // group 0 is the whole match
                if regex.captures_len() < 2 {
                    return Err(FxError::Config(format!(
                        "pattern {:?} has no capture group",
                        p.as_ref()
                    )));
                }
                Ok(regex)
            })
            .collect::<FxResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// The EUR/RUB patterns.
    pub fn eur_rub() -> FxResult<Self> {
        Self::new(&EUR_RUB_PATTERNS)
    }

    /// First plausible value, pattern by pattern, match by match.
    pub fn extract(&self, text: &str, range: PlausibleRange) -> Option<Decimal> {
        for (index, pattern) in self.patterns.iter().enumerate() {
            for captures in pattern.captures_iter(text) {
                let Some(raw) = captures.get(1) else {
                    continue;
                };
                let Ok(value) = Decimal::from_str(&raw.as_str().replace(',', ".")) else {
                    continue;
                };
                if range.contains(value) {
                    debug!(pattern = index, value = %value, "Plausible rate matched");
                    return Some(value);
                }
                debug!(pattern = index, value = %value, "Match outside plausible range");
            }
        }
        None
    }
}

/// Scraped-rate extractor: rendering session plus pattern extraction.
pub struct ScrapedRateSource<L: SessionLauncher> {
    launcher: Arc<L>,
    config: ScrapeConfig,
    patterns: RatePatterns,
}

impl<L: SessionLauncher> ScrapedRateSource<L> {
    /// Create a source using the EUR/RUB patterns.
    pub fn new(launcher: L, config: ScrapeConfig) -> FxResult<Self> {
        Ok(Self::with_patterns(launcher, config, RatePatterns::eur_rub()?))
    }

    /// Create a source with custom patterns.
    pub fn with_patterns(launcher: L, config: ScrapeConfig, patterns: RatePatterns) -> Self {
        Self {
            launcher: Arc::new(launcher),
            config,
            patterns,
        }
    }

    /// The launcher sessions come from.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn launcher(&self) -> &L {
        &self.launcher
    }
}

#[async_trait]
impl<L: SessionLauncher> RateSource for ScrapedRateSource<L> {
    type Output = Decimal;

    fn name(&self) -> &str {
        "market-page"
    }

    fn pair(&self) -> CurrencyPair {
        CurrencyPair::eur_rub()
    }

    async fn try_fetch(&self) -> FxResult<Decimal> {
        let launcher = Arc::clone(&self.launcher);
        let config = self.config.clone();

        let page = tokio::task::spawn_blocking(move || render_page(launcher.as_ref(), &config))
            .await
            .map_err(|e| FxError::Render(format!("rendering task failed: {e}")))??;

        debug!(bytes = page.len(), url = %self.config.url, "Page rendered");

        self.patterns
            .extract(&page, self.config.plausible_range)
            .ok_or(FxError::NoPlausibleValue)
    }
}
