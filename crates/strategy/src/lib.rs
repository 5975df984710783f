pub mod indicators;
pub mod services;

pub use indicators::{IndicatorSnapshot, MIN_HISTORY};
pub use services::signal_classifier::{Classification, classify, signal_for};
