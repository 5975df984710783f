use crate::errors::TradeError;

use super::Instrument;

/// Absorbs float noise when a band edge already sits on the tick grid.
const TICK_EPSILON: f64 = 1e-9;

/// Exchange constraints for one symbol, parsed once and cached for the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolMeta {
    pub symbol: String,
    pub quantity_precision: u32,
    pub tick_size: f64,
    pub min_notional: f64,
    pub price_band_multiplier_down: f64,
    pub price_band_multiplier_up: f64,
}

impl SymbolMeta {
    pub fn from_instrument(instrument: &Instrument) -> Result<Self, TradeError> {
        let symbol = instrument.symbol.as_str();
        let missing = |filter: &str| TradeError::InvalidConstraint {
            symbol: symbol.to_string(),
            reason: format!("missing {filter} filter"),
        };

        let step_size = instrument.step_size().ok_or_else(|| missing("LOT_SIZE"))?;
        let tick_size = instrument.tick_size().ok_or_else(|| missing("PRICE_FILTER"))?;
        let min_notional = instrument
            .min_notional()
            .ok_or_else(|| missing("MIN_NOTIONAL"))?;
        let (down, up) = instrument
            .percent_price()
            .ok_or_else(|| missing("PERCENT_PRICE"))?;

        let meta = Self {
            symbol: symbol.to_string(),
            quantity_precision: step_precision(symbol, step_size)?,
            tick_size: parse_decimal(symbol, "tickSize", tick_size)?,
            min_notional: parse_decimal(symbol, "notional", min_notional)?,
            price_band_multiplier_down: parse_decimal(symbol, "multiplierDown", down)?,
            price_band_multiplier_up: parse_decimal(symbol, "multiplierUp", up)?,
        };

        if meta.tick_size <= 0.0 {
            return Err(meta.invalid("tickSize must be positive"));
        }
        if !(meta.price_band_multiplier_down > 0.0
            && meta.price_band_multiplier_down < 1.0
            && meta.price_band_multiplier_up > 1.0)
        {
            return Err(meta.invalid("percent price band does not straddle the entry price"));
        }

        Ok(meta)
    }

    /// `[entry * multiplier_down, entry * multiplier_up]`
    pub fn price_band(&self, entry_price: f64) -> (f64, f64) {
        (
            entry_price * self.price_band_multiplier_down,
            entry_price * self.price_band_multiplier_up,
        )
    }

    /// Tick-aligned prices inside the band: the lower edge rounded up, the
    /// upper edge rounded down. `None` when no tick fits.
    pub fn tick_band(&self, entry_price: f64) -> Option<(f64, f64)> {
        let (lo, hi) = self.price_band(entry_price);
        let decimals = decimals_of(self.tick_size);
        let lo = round_to_precision(
            (lo / self.tick_size - TICK_EPSILON).ceil() * self.tick_size,
            decimals,
        );
        let hi = round_to_precision(
            (hi / self.tick_size + TICK_EPSILON).floor() * self.tick_size,
            decimals,
        );
        (lo <= hi).then_some((lo, hi))
    }

    pub fn round_quantity(&self, quantity: f64) -> f64 {
        round_to_precision(quantity, self.quantity_precision)
    }

    pub fn round_price(&self, price: f64) -> f64 {
        let ticks = (price / self.tick_size).round();
        round_to_precision(ticks * self.tick_size, decimals_of(self.tick_size))
    }

    fn invalid(&self, reason: &str) -> TradeError {
        TradeError::InvalidConstraint {
            symbol: self.symbol.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Number of significant decimal digits in a lot-size step, e.g. `"0.00100"` -> 3.
pub fn step_precision(symbol: &str, step_size: &str) -> Result<u32, TradeError> {
    let step = parse_decimal(symbol, "stepSize", step_size)?;
    if step <= 0.0 {
        return Err(TradeError::InvalidConstraint {
            symbol: symbol.to_string(),
            reason: format!("stepSize {step_size} must be positive"),
        });
    }
    let digits = step_size
        .trim()
        .split_once('.')
        .map(|(_, fraction)| fraction.trim_end_matches('0').len())
        .unwrap_or(0);
    Ok(digits as u32)
}

pub fn round_to_precision(value: f64, precision: u32) -> f64 {
    let factor = 10_f64.powi(precision as i32);
    (value * factor).round() / factor
}

fn decimals_of(value: f64) -> u32 {
    let formatted = format!("{value:.10}");
    formatted
        .split_once('.')
        .map(|(_, fraction)| fraction.trim_end_matches('0').len() as u32)
        .unwrap_or(0)
}

fn parse_decimal(symbol: &str, field: &str, raw: &str) -> Result<f64, TradeError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| TradeError::InvalidConstraint {
            symbol: symbol.to_string(),
            reason: format!("{field} {raw:?} is not a number"),
        })
}
