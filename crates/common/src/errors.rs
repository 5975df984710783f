use thiserror::Error;

use crate::models::OrderLeg;

/// Failure reported by the exchange or by the transport underneath it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExchangeError {
    #[error("exchange rejected request (code {code}): {message}")]
    Api { code: i64, message: String },

    #[error("http error: {0}")]
    Http(String),

    #[error("request timed out")]
    Timeout,

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ExchangeError {
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// The exchange says the order went through even though the call errored.
    pub fn is_already_executed(&self) -> bool {
        self.message().to_lowercase().contains("executed")
    }

    pub fn is_already_exists(&self) -> bool {
        self.message().to_lowercase().contains("already exists")
    }

    /// The request may have reached the matching engine without an answer
    /// coming back, so an order could be live.
    pub fn outcome_unknown(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Timeout | Self::Decode(_))
    }
}

/// Per-symbol failure inside the scan/trade pipeline.
///
/// None of these end the session. The orchestrator consults
/// [`TradeError::excludes_symbol`] to decide whether the symbol is
/// dropped for the rest of the day.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TradeError {
    #[error("insufficient history: have {have} bars, need {need}")]
    InsufficientHistory { have: usize, need: usize },

    #[error("invalid exchange constraint for {symbol}: {reason}")]
    InvalidConstraint { symbol: String, reason: String },

    #[error("sizing rejected for {symbol}: {reason}")]
    SizingRejected { symbol: String, reason: String },

    #[error("price validation failed for {symbol}: {reason}")]
    PriceValidationFailed { symbol: String, reason: String },

    #[error("leverage change rejected for {symbol}: {message}")]
    LeverageRejected { symbol: String, message: String },

    #[error("{leg} simulation failed for {symbol}: {message}")]
    SimulationFailed {
        symbol: String,
        leg: OrderLeg,
        message: String,
    },

    #[error("entry placement failed for {symbol}: {message}")]
    EntryPlacementFailed { symbol: String, message: String },

    #[error("{leg} placement failed for {symbol} (flattened: {flattened}): {message}")]
    ProtectiveOrderFailed {
        symbol: String,
        leg: OrderLeg,
        message: String,
        flattened: bool,
    },

    #[error("stale price for {symbol}: evaluated {evaluated}, now {current} ({moved_pct:.3}%)")]
    StalePrice {
        symbol: String,
        evaluated: f64,
        current: f64,
        moved_pct: f64,
    },

    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

impl TradeError {
    pub fn excludes_symbol(&self) -> bool {
        !matches!(self, Self::InsufficientHistory { .. })
    }

    /// Failures the executor has already sent a notification for.
    pub fn already_notified(&self) -> bool {
        matches!(
            self,
            Self::SimulationFailed { .. }
                | Self::EntryPlacementFailed { .. }
                | Self::ProtectiveOrderFailed { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idempotency_markers_are_case_insensitive() {
        let executed = ExchangeError::Api {
            code: -2010,
            message: "Order has been Executed".to_string(),
        };
        assert!(executed.is_already_executed());
        assert!(!executed.is_already_exists());

        let exists = ExchangeError::Api {
            code: -4130,
            message: "An open stop order ALREADY EXISTS in this direction".to_string(),
        };
        assert!(exists.is_already_exists());
    }

    #[test]
    fn test_only_transport_failures_leave_outcome_unknown() {
        assert!(ExchangeError::Timeout.outcome_unknown());
        assert!(ExchangeError::Http("connection reset".to_string()).outcome_unknown());
        assert!(ExchangeError::Decode("truncated body".to_string()).outcome_unknown());
        assert!(!ExchangeError::RateLimited("429".to_string()).outcome_unknown());
        assert!(
            !ExchangeError::Api {
                code: -2019,
                message: "Margin is insufficient.".to_string()
            }
            .outcome_unknown()
        );
    }

    #[test]
    fn test_executor_failures_are_already_notified() {
        let entry = TradeError::EntryPlacementFailed {
            symbol: "ABCUSDT".to_string(),
            message: "rejected".to_string(),
        };
        assert!(entry.already_notified());

        let leverage = TradeError::LeverageRejected {
            symbol: "ABCUSDT".to_string(),
            message: "rejected".to_string(),
        };
        assert!(!leverage.already_notified());
        assert!(!TradeError::from(ExchangeError::Timeout).already_notified());
    }

    #[test]
    fn test_only_short_history_keeps_symbol_eligible() {
        let short = TradeError::InsufficientHistory { have: 120, need: 200 };
        assert!(!short.excludes_symbol());

        let stale = TradeError::StalePrice {
            symbol: "ABCUSDT".to_string(),
            evaluated: 100.0,
            current: 101.0,
            moved_pct: 1.0,
        };
        assert!(stale.excludes_symbol());
        assert!(TradeError::from(ExchangeError::Timeout).excludes_symbol());
    }
}
