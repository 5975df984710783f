pub mod config;
pub mod errors;
pub mod logger;
pub mod models;
pub mod notifier;

pub use errors::{ConfigError, ExchangeError, TradeError};
pub use notifier::Notifier;
