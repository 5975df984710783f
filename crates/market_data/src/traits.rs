use async_trait::async_trait;
use common::ExchangeError;
use common::models::{Candle, IncomeEntry, Instrument, OrderSpec, PlacedOrder, Ticker24h};

/// Conversion from a raw REST payload into a domain model.
pub trait RemoteResponse<T> {
    fn to_model(&self) -> Result<T, ExchangeError>;

    fn parse_field(field: &str, raw: &str) -> Result<f64, ExchangeError> {
        raw.parse::<f64>()
            .map_err(|_| ExchangeError::Decode(format!("{field}: {raw:?} is not a number")))
    }
}

/// Everything the trading core needs from a derivatives exchange.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    async fn list_instruments(&self) -> Result<Vec<Instrument>, ExchangeError>;

    async fn get_24h_tickers(&self) -> Result<Vec<Ticker24h>, ExchangeError>;

    async fn get_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: u16,
    ) -> Result<Vec<Candle>, ExchangeError>;

    async fn get_mark_price(&self, symbol: &str) -> Result<f64, ExchangeError>;

    /// Validate-only submission; nothing reaches the matching engine.
    async fn simulate_order(&self, spec: &OrderSpec) -> Result<(), ExchangeError>;

    async fn place_order(&self, spec: &OrderSpec) -> Result<PlacedOrder, ExchangeError>;

    async fn change_leverage(&self, symbol: &str, leverage: u32) -> Result<(), ExchangeError>;

    async fn get_realized_pnl(
        &self,
        start_time_ms: i64,
        end_time_ms: i64,
    ) -> Result<Vec<IncomeEntry>, ExchangeError>;
}
