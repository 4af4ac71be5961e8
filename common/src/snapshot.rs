//! Rate snapshot, primary rate and forecast types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// Official daily rates published by the central bank, RUB per unit.
///
/// Either every field was read from the feed or the whole value is absent;
/// a partially parsed feed never produces one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRates {
    /// EUR rate for the publication date.
    pub eur: Decimal,
    /// EUR rate of the previous publication.
    pub eur_previous: Decimal,
    /// USD rate for the publication date.
    pub usd: Decimal,
    /// CNY rate for the publication date.
    pub cny: Decimal,
    /// Publication date.
    pub date: NaiveDate,
}

impl ReferenceRates {
    /// Change of the EUR rate against the previous publication.
    pub fn daily_change(&self) -> Option<Decimal> {
        self.eur.checked_sub(self.eur_previous)
    }
}

/// EUR/RUB derived from two independently sourced legs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossRate {
    /// CNY/RUB traded on the exchange.
    pub cny_rub: Option<Decimal>,
    /// EUR/CNY from a conversion API.
    pub eur_cny: Option<Decimal>,
    /// `cny_rub * eur_cny`, present only when both legs are and the product fits.
    pub value: Option<Decimal>,
}

impl CrossRate {
    /// Build a cross rate from its legs.
    ///
    /// A product outside the `Decimal` range leaves the value empty.
    pub fn new(cny_rub: Option<Decimal>, eur_cny: Option<Decimal>) -> Self {
        let value = match (cny_rub, eur_cny) {
            (Some(a), Some(b)) => a.checked_mul(b),
            _ => None,
        };
        Self {
            cny_rub,
            eur_cny,
            value,
        }
    }
}

/// Everything one refresh learned about EUR/RUB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSnapshot {
    /// Central bank reference rates.
    pub reference: Option<ReferenceRates>,
    /// Cross rate and its legs.
    pub cross: CrossRate,
    /// EUR/RUB scraped from the rendered market page.
    pub scraped: Option<Decimal>,
    /// When the refresh completed.
    pub fetched_at: Timestamp,
}

impl RateSnapshot {
    /// Current official EUR rate, if the reference feed answered.
    pub fn reference_rate(&self) -> Option<Decimal> {
        self.reference.as_ref().map(|r| r.eur)
    }

    /// Exchange-traded CNY/RUB price.
    pub fn market(&self) -> Option<Decimal> {
        self.cross.cny_rub
    }

    /// Number of upstream sources that produced a value.
    pub fn available_sources(&self) -> usize {
        [
            self.reference.is_some(),
            self.cross.cny_rub.is_some(),
            self.cross.eur_cny.is_some(),
            self.scraped.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }

    /// True when no source produced anything.
    pub fn is_empty(&self) -> bool {
        self.available_sources() == 0
    }

    /// Compare rate content, ignoring when it was fetched.
    pub fn same_rates(&self, other: &RateSnapshot) -> bool {
        self.reference == other.reference
            && self.cross == other.cross
            && self.scraped == other.scraped
    }
}

/// Where the primary rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrimarySource {
    /// Scraped market page.
    Scraped,
    /// Cross rate with the calibration offset applied.
    CrossAdjusted,
}

impl PrimarySource {
    /// Short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            PrimarySource::Scraped => "market page",
            PrimarySource::CrossAdjusted => "adjusted cross rate",
        }
    }
}

/// The single best market rate chosen for forecasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryRate {
    pub value: Decimal,
    pub source: PrimarySource,
}

/// Heuristic interval for the next official rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forecast {
    /// Weighted estimate.
    pub estimate: Decimal,
    /// Lower bound of the interval.
    pub low: Decimal,
    /// Upper bound of the interval.
    pub high: Decimal,
}

impl Forecast {
    /// Interval of `band` around `estimate`, if both ends are representable.
    pub fn around(estimate: Decimal, band: Decimal) -> Option<Self> {
        Some(Self {
            estimate,
            low: estimate.checked_sub(band)?,
            high: estimate.checked_add(band)?,
        })
    }
}
