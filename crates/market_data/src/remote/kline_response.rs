use common::ExchangeError;
use common::models::Candle;
use serde::Deserialize;

use crate::traits::RemoteResponse;

/// One row of `/fapi/v1/klines`:
/// `[openTime, open, high, low, close, volume, closeTime, quoteVolume, trades, takerBase, takerQuote, ignore]`
#[derive(Debug, Deserialize)]
pub struct KlineRow(
    pub i64,
    pub String,
    pub String,
    pub String,
    pub String,
    pub String,
    pub i64,
    pub String,
    pub i64,
    pub String,
    pub String,
    pub String,
);

impl RemoteResponse<Candle> for KlineRow {
    fn to_model(&self) -> Result<Candle, ExchangeError> {
        Ok(Candle {
            open_time: self.0,
            open: Self::parse_field("open", &self.1)?,
            high: Self::parse_field("high", &self.2)?,
            low: Self::parse_field("low", &self.3)?,
            close: Self::parse_field("close", &self.4)?,
            volume: Self::parse_field("volume", &self.5)?,
        })
    }
}
