//! Exchange-traded CNY/RUB price.

use async_trait::async_trait;
use ratewatch_common::CurrencyPair;
use rust_decimal::Decimal;

use crate::error::{FxError, FxResult};
use crate::provider::{FeedClient, RateSource};

/// Column holding the last traded price.
const LAST_COLUMN: &str = "LAST";

/// Last traded price from the exchange market-data feed.
pub struct MarketRateSource {
    client: FeedClient,
    url: String,
}

impl MarketRateSource {
    /// Create a source reading from `url`.
    pub fn new(client: FeedClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RateSource for MarketRateSource {
    type Output = Decimal;

    fn name(&self) -> &str {
        "exchange"
    }

    fn pair(&self) -> CurrencyPair {
        CurrencyPair::cny_rub()
    }

    async fn try_fetch(&self) -> FxResult<Decimal> {
        let response: api::Response = self.client.get_json(&self.url).await?;
        last_price(&response.marketdata)
    }
}

/// Pull the `LAST` cell of the first row out of a columns/data table.
fn last_price(table: &api::Table) -> FxResult<Decimal> {
    let column = table
        .columns
        .iter()
        .position(|c| c == LAST_COLUMN)
        .ok_or_else(|| FxError::Shape(format!("column {LAST_COLUMN} missing")))?;

    let row = table
        .data
        .first()
        .ok_or_else(|| FxError::Shape("marketdata table is empty".to_string()))?;

    let cell = row
        .get(column)
        .ok_or_else(|| FxError::Shape(format!("row has no cell {column}")))?;

    if cell.is_null() {
        return Err(FxError::Shape("no trades yet, LAST is null".to_string()));
    }

    let price: Decimal = serde_json::from_value(cell.clone())?;
    if price <= Decimal::ZERO {
        return Err(FxError::Shape(format!("non-positive LAST {price}")));
    }
    Ok(price)
}

mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Response {
        pub marketdata: Table,
    }

    #[derive(Deserialize, Debug)]
    pub struct Table {
        pub columns: Vec<String>,
        pub data: Vec<Vec<serde_json::Value>>,
    }
}
