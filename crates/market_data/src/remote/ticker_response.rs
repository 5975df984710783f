use common::ExchangeError;
use common::models::Ticker24h;
use serde::Deserialize;

use crate::traits::RemoteResponse;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerResponse {
    pub symbol: String,
    pub volume: String,
    pub last_price: String,
    pub price_change_percent: String,
}

impl RemoteResponse<Ticker24h> for TickerResponse {
    fn to_model(&self) -> Result<Ticker24h, ExchangeError> {
        Ok(Ticker24h {
            symbol: self.symbol.clone(),
            volume: Self::parse_field("volume", &self.volume)?,
            last_price: Self::parse_field("lastPrice", &self.last_price)?,
            price_change_percent: Self::parse_field(
                "priceChangePercent",
                &self.price_change_percent,
            )?,
        })
    }
}
