use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::ConfigError;

const LIVE_BASE_URL: &str = "https://fapi.binance.com";
const TESTNET_BASE_URL: &str = "https://testnet.binancefuture.com";

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: i64,
}

/// Risk knobs consumed by the sizer and the executor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskSettings {
    pub quantity_usdt: f64,
    pub risk_per_trade: f64,
    pub tp_usdt: f64,
    pub leverage: u32,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            quantity_usdt: 1.0,
            risk_per_trade: 0.5,
            tp_usdt: 0.5,
            leverage: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_secret: String,
    pub testnet: bool,
    pub base_url: String,
    pub interval: String,
    pub candle_limit: u16,
    pub risk: RiskSettings,
    pub max_trades_per_day: u32,
    pub telegram: Option<TelegramConfig>,
    pub request_timeout: Duration,
    pub trade_delay: Duration,
    pub scan_interval: Duration,
    pub report_utc_offset_hours: i32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let testnet = lookup("TESTNET")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "t"))
            .unwrap_or(false);

        let base_url = lookup("BINANCE_BASE_URL").unwrap_or_else(|| {
            if testnet {
                TESTNET_BASE_URL.to_string()
            } else {
                LIVE_BASE_URL.to_string()
            }
        });

        let telegram = match (lookup("TELEGRAM_BOT_TOKEN"), lookup("TELEGRAM_CHAT_ID")) {
            (Some(token), Some(chat_id)) => Some(TelegramConfig {
                token,
                chat_id: parse_value("TELEGRAM_CHAT_ID", chat_id)?,
            }),
            _ => None,
        };

        let defaults = RiskSettings::default();
        let risk = RiskSettings {
            quantity_usdt: parse_or(&lookup, "QUANTITY_USDT", defaults.quantity_usdt)?,
            risk_per_trade: parse_or(&lookup, "RISK_PER_TRADE", defaults.risk_per_trade)?,
            tp_usdt: parse_or(&lookup, "TP_USDT", defaults.tp_usdt)?,
            leverage: parse_or(&lookup, "LEVERAGE", defaults.leverage)?,
        };

        Ok(Self {
            api_key: required("API_KEY")?,
            api_secret: required("API_SECRET")?,
            testnet,
            base_url,
            interval: lookup("INTERVAL").unwrap_or_else(|| "5m".to_string()),
            candle_limit: parse_or(&lookup, "CANDLE_LIMIT", 210)?,
            risk,
            max_trades_per_day: parse_or(&lookup, "MAX_TRADES_PER_DAY", 6)?,
            telegram,
            request_timeout: Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 10)?),
            trade_delay: Duration::from_secs(parse_or(&lookup, "TRADE_DELAY_SECS", 5)?),
            scan_interval: Duration::from_secs(parse_or(&lookup, "SCAN_INTERVAL_SECS", 60)?),
            report_utc_offset_hours: parse_or(&lookup, "REPORT_UTC_OFFSET_HOURS", 7)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => parse_value(name, raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ConfigError::Invalid { name, value: raw })
}
