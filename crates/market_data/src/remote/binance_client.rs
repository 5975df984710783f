use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use common::ExchangeError;
use common::config::Config;
use common::models::{Candle, IncomeEntry, Instrument, OrderSpec, PlacedOrder, Ticker24h};
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use sha2::Sha256;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::remote::{
    ApiErrorResponse, ExchangeInfoResponse, IncomeResponse, KlineRow, OrderResponse,
    PremiumIndexResponse, TickerResponse,
};
use crate::traits::{ExchangeClient, RemoteResponse};

type HmacSha256 = Hmac<Sha256>;

const MAX_RETRIES: u32 = 3;
const RECV_WINDOW_MS: u64 = 6000;

/// Signed REST client for Binance USD-M futures.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    api_key: String,
    secret_key: String,
}

impl BinanceClient {
    pub fn new(config: &Config) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .user_agent("futures_signal_bot/0.1.0")
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ExchangeError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            secret_key: config.api_secret.clone(),
        })
    }

    fn sign(&self, query: &str) -> Result<String, ExchangeError> {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| ExchangeError::Http(format!("invalid secret key: {e}")))?;
        mac.update(query.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }

    async fn public<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, ExchangeError> {
        self.request(Method::GET, path, params, false).await
    }

    async fn signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, ExchangeError> {
        self.request(method, path, params, true).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&'static str, String)],
        signed: bool,
    ) -> Result<T, ExchangeError> {
        let mut retry_count = 0;

        loop {
            match self.request_once(method.clone(), path, params, signed).await {
                Err(ExchangeError::RateLimited(reason)) => {
                    retry_count += 1;
                    if retry_count > MAX_RETRIES {
                        return Err(ExchangeError::RateLimited(reason));
                    }

                    let backoff_seconds = 2_u64.pow(retry_count);
                    warn!(
                        "Rate limited on {}, backing off for {} seconds (attempt {}/{})",
                        path, backoff_seconds, retry_count, MAX_RETRIES
                    );
                    sleep(Duration::from_secs(backoff_seconds)).await;
                }
                other => return other,
            }
        }
    }

    async fn request_once<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&'static str, String)],
        signed: bool,
    ) -> Result<T, ExchangeError> {
        let mut query = encode_query(params);
        if signed {
            if !query.is_empty() {
                query.push('&');
            }
            query.push_str(&format!(
                "recvWindow={}&timestamp={}",
                RECV_WINDOW_MS,
                Self::timestamp()
            ));
            let signature = self.sign(&query)?;
            query.push_str(&format!("&signature={}", signature));
        }

        let url = if query.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, query)
        };

        let resp = self
            .client
            .request(method, &url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = resp.status();
        if let Some(used_weight) = resp
            .headers()
            .get("x-mbx-used-weight-1m")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u32>().ok())
        {
            if used_weight > 1000 {
                warn!("High API weight usage: {}", used_weight);
            } else {
                debug!("Used weights: {}/2400", used_weight);
            }
        }

        if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() == 418 {
            return Err(ExchangeError::RateLimited(format!("HTTP {}", status.as_u16())));
        }

        if !status.is_success() {
            let error_text = resp.text().await.map_err(map_transport_error)?;
            error!("Binance request {} failed: {}", path, error_text);
            return Err(match serde_json::from_str::<ApiErrorResponse>(&error_text) {
                Ok(body) => body.into(),
                Err(_) => ExchangeError::Http(format!("HTTP {}: {}", status.as_u16(), error_text)),
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| ExchangeError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    async fn list_instruments(&self) -> Result<Vec<Instrument>, ExchangeError> {
        let info: ExchangeInfoResponse = self.public("/fapi/v1/exchangeInfo", &[]).await?;
        Ok(info.symbols)
    }

    async fn get_24h_tickers(&self) -> Result<Vec<Ticker24h>, ExchangeError> {
        let tickers: Vec<TickerResponse> = self.public("/fapi/v1/ticker/24hr", &[]).await?;
        Ok(decode_tickers(&tickers))
    }

    async fn get_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: u16,
    ) -> Result<Vec<Candle>, ExchangeError> {
        let rows: Vec<KlineRow> = self
            .public(
                "/fapi/v1/klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        rows.iter().map(|row| row.to_model()).collect()
    }

    async fn get_mark_price(&self, symbol: &str) -> Result<f64, ExchangeError> {
        let index: PremiumIndexResponse = self
            .public("/fapi/v1/premiumIndex", &[("symbol", symbol.to_string())])
            .await?;
        index.to_model()
    }

    async fn simulate_order(&self, spec: &OrderSpec) -> Result<(), ExchangeError> {
        let _: serde_json::Value = self
            .signed(Method::POST, "/fapi/v1/order/test", &order_params(spec))
            .await?;
        Ok(())
    }

    async fn place_order(&self, spec: &OrderSpec) -> Result<PlacedOrder, ExchangeError> {
        info!(
            "Placing {} order: {} {} {}",
            spec.leg,
            spec.side.as_str(),
            spec.order_type.as_str(),
            spec.symbol
        );
        let order: OrderResponse = self
            .signed(Method::POST, "/fapi/v1/order", &order_params(spec))
            .await?;
        debug!("Order {} for {} is {}", order.order_id, order.symbol, order.status);
        order.to_model()
    }

    async fn change_leverage(&self, symbol: &str, leverage: u32) -> Result<(), ExchangeError> {
        let _: serde_json::Value = self
            .signed(
                Method::POST,
                "/fapi/v1/leverage",
                &[
                    ("symbol", symbol.to_string()),
                    ("leverage", leverage.to_string()),
                ],
            )
            .await?;
        Ok(())
    }

    async fn get_realized_pnl(
        &self,
        start_time_ms: i64,
        end_time_ms: i64,
    ) -> Result<Vec<IncomeEntry>, ExchangeError> {
        let rows: Vec<IncomeResponse> = self
            .signed(
                Method::GET,
                "/fapi/v1/income",
                &[
                    ("incomeType", "REALIZED_PNL".to_string()),
                    ("startTime", start_time_ms.to_string()),
                    ("endTime", end_time_ms.to_string()),
                    ("limit", "1000".to_string()),
                ],
            )
            .await?;
        rows.iter().map(|row| row.to_model()).collect()
    }
}

fn map_transport_error(e: reqwest::Error) -> ExchangeError {
    if e.is_timeout() {
        ExchangeError::Timeout
    } else {
        ExchangeError::Http(e.to_string())
    }
}

fn encode_query(params: &[(&'static str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Request parameters for `/fapi/v1/order` and `/fapi/v1/order/test`.
pub fn order_params(spec: &OrderSpec) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("symbol", spec.symbol.clone()),
        ("side", spec.side.as_str().to_string()),
        ("type", spec.order_type.as_str().to_string()),
    ];
    if let Some(quantity) = spec.quantity {
        params.push(("quantity", format_decimal(quantity)));
    }
    if let Some(stop_price) = spec.stop_price {
        params.push(("stopPrice", format_decimal(stop_price)));
    }
    if spec.close_position {
        params.push(("closePosition", "true".to_string()));
    }
    if spec.reduce_only {
        params.push(("reduceOnly", "true".to_string()));
    }
    if spec.working_type_mark_price {
        params.push(("workingType", "MARK_PRICE".to_string()));
    }
    if spec.time_in_force_gtc {
        params.push(("timeInForce", "GTC".to_string()));
    }
    params.push((
        "newClientOrderId",
        format!("bot-{}", Uuid::new_v4().simple()),
    ));
    params
}

/// Plain decimal without exponent or trailing zeros, as the API expects.
pub fn format_decimal(value: f64) -> String {
    let formatted = format!("{:.8}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Rows that fail to decode are skipped so one odd symbol cannot stall screening.
fn decode_tickers(rows: &[TickerResponse]) -> Vec<Ticker24h> {
    rows.iter()
        .filter_map(|row| match row.to_model() {
            Ok(ticker) => Some(ticker),
            Err(e) => {
                warn!("Skipping 24h ticker for {}: {}", row.symbol, e);
                None
            }
        })
        .collect()
}
