//! Currency and currency pair types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Code in the lowercase form some conversion APIs key their payloads by.
    pub fn lowercase_code(&self) -> String {
        self.0.to_lowercase()
    }

    /// Common currencies
    pub fn rub() -> Self {
        Self::new("RUB")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn cny() -> Self {
        Self::new("CNY")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A currency pair quoted as units of `quote` per one unit of `base`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Base currency.
    pub base: Currency,
    /// Quote currency (pricing currency).
    pub quote: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(base: Currency, quote: Currency) -> Self {
        Self { base, quote }
    }

    /// The pair the whole system is about.
    pub fn eur_rub() -> Self {
        Self::new(Currency::eur(), Currency::rub())
    }

    /// Exchange-traded leg of the cross rate.
    pub fn cny_rub() -> Self {
        Self::new(Currency::cny(), Currency::rub())
    }

    /// Conversion-API leg of the cross rate.
    pub fn eur_cny() -> Self {
        Self::new(Currency::eur(), Currency::cny())
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}
