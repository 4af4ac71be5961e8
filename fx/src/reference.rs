//! Central bank daily reference rates.

use async_trait::async_trait;
use ratewatch_common::{calendar_date, Currency, CurrencyPair, ReferenceRates};
use rust_decimal::Decimal;

use crate::error::{FxError, FxResult};
use crate::provider::{FeedClient, RateSource};

/// Daily EUR, USD and CNY rates from the central bank JSON feed.
pub struct ReferenceRateSource {
    client: FeedClient,
    url: String,
}

impl ReferenceRateSource {
    /// Create a source reading from `url`.
    pub fn new(client: FeedClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RateSource for ReferenceRateSource {
    type Output = ReferenceRates;

    fn name(&self) -> &str {
        "central-bank"
    }

    fn pair(&self) -> CurrencyPair {
        CurrencyPair::eur_rub()
    }

    async fn try_fetch(&self) -> FxResult<ReferenceRates> {
        let body = self.client.get_text(&self.url).await?;
        parse_daily(&body)
    }
}

/// Parse the daily feed document.
///
/// All four rates and the date must be present; anything less is a shape
/// error rather than a partial result.
pub fn parse_daily(body: &str) -> FxResult<ReferenceRates> {
    let daily: api::Daily = serde_json::from_str(body)?;

    // EUR needs its previous value for the daily change; USD and CNY do not.
    let valute = |currency: Currency| {
        daily
            .valute
            .get(currency.code())
            .ok_or_else(|| FxError::Shape(format!("Valute.{currency} missing")))
    };
    let eur = valute(Currency::eur())?;
    let usd = valute(Currency::usd())?;
    let cny = valute(Currency::cny())?;

    let date = calendar_date(&daily.date)
        .ok_or_else(|| FxError::Shape(format!("unparseable Date {:?}", daily.date)))?;

    let eur_previous = eur
        .previous
        .ok_or_else(|| FxError::Shape("Valute.EUR.Previous missing".to_string()))?;

    Ok(ReferenceRates {
        eur: per_unit(eur.value, eur.nominal),
        eur_previous: per_unit(eur_previous, eur.nominal),
        usd: per_unit(usd.value, usd.nominal),
        cny: per_unit(cny.value, cny.nominal),
        date,
    })
}

/// Rate for one unit; the feed quotes some currencies per 10 or 100.
fn per_unit(value: Decimal, nominal: Option<u32>) -> Decimal {
    match nominal {
        Some(nominal) if nominal > 1 => value / Decimal::from(nominal),
        _ => value,
    }
}

mod api {
    use rust_decimal::Decimal;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "PascalCase")]
    pub struct Daily {
        pub date: String,
        pub valute: HashMap<String, Valute>,
    }

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "PascalCase")]
    pub struct Valute {
        pub nominal: Option<u32>,
        pub value: Decimal,
        pub previous: Option<Decimal>,
    }
}
