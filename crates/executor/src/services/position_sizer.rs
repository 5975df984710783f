use common::TradeError;
use common::config::RiskSettings;
use common::models::{Direction, OrderPlan, SymbolMeta, symbol_meta::round_to_precision};
use tracing::debug;

pub const DEFAULT_BUFFER_PCT: f64 = 0.01;

/// Fixed sanity-gate distances used by [`validate_prices`].
const VALIDATION_STOP_PCT: f64 = 0.01;
const VALIDATION_TARGET_PCT: f64 = 0.02;

/// `(usdt_amount * leverage) / entry_price`, rounded to the symbol's lot precision.
pub fn calculate_order_quantity(
    meta: &SymbolMeta,
    entry_price: f64,
    leverage: f64,
    usdt_amount: f64,
) -> Result<f64, TradeError> {
    let reject = |reason: String| TradeError::SizingRejected {
        symbol: meta.symbol.clone(),
        reason,
    };

    if entry_price <= 0.0 || leverage <= 0.0 {
        return Err(reject(format!(
            "invalid entry price {entry_price} or leverage {leverage}"
        )));
    }

    let raw_qty = (usdt_amount * leverage) / entry_price;
    let notional = raw_qty * entry_price;
    if notional < meta.min_notional {
        return Err(reject(format!(
            "notional {notional:.4} below minimum {}",
            meta.min_notional
        )));
    }

    let quantity = meta.round_quantity(raw_qty);
    if quantity <= 0.0 {
        return Err(reject(format!(
            "quantity {raw_qty} rounds to zero at precision {}",
            meta.quantity_precision
        )));
    }

    Ok(quantity)
}

/// Pulls stop-loss and take-profit into the exchange's percent-price band
/// and keeps them at least `buffer_pct * entry_price` away from the entry on
/// the losing and winning side respectively. The band always has the last
/// word, so the result never leaves `[entry * down, entry * up]`.
pub fn apply_buffer(
    meta: &SymbolMeta,
    entry_price: f64,
    stop_price: f64,
    take_profit_price: f64,
    direction: Direction,
    buffer_pct: f64,
) -> (f64, f64) {
    let (min_allowed, max_allowed) = meta.price_band(entry_price);
    let clamp = |price: f64| price.clamp(min_allowed, max_allowed);
    let buffer = buffer_pct * entry_price;

    let (sl, tp) = match direction {
        Direction::Long => (
            clamp(stop_price).min(entry_price - buffer),
            clamp(take_profit_price).max(entry_price + buffer),
        ),
        Direction::Short => (
            clamp(stop_price).max(entry_price + buffer),
            clamp(take_profit_price).min(entry_price - buffer),
        ),
    };

    (clamp(sl), clamp(tp))
}

/// Recomputes a simplified bracket (at most 1% loss, 2% gain) on the tick
/// grid and rejects the symbol when either leg is not a positive price.
pub fn validate_prices(
    meta: &SymbolMeta,
    entry_price: f64,
    quantity: f64,
    direction: Direction,
    risk_per_trade: f64,
) -> Result<(), TradeError> {
    if quantity <= 0.0 {
        return Err(TradeError::PriceValidationFailed {
            symbol: meta.symbol.clone(),
            reason: format!("non-positive quantity {quantity}"),
        });
    }

    let (sl, tp) = match direction {
        Direction::Long => (
            (entry_price * (1.0 - VALIDATION_STOP_PCT)).max(entry_price - risk_per_trade / quantity),
            entry_price * (1.0 + VALIDATION_TARGET_PCT),
        ),
        Direction::Short => (
            (entry_price * (1.0 + VALIDATION_STOP_PCT)).min(entry_price + risk_per_trade / quantity),
            entry_price * (1.0 - VALIDATION_TARGET_PCT),
        ),
    };

    let (sl, tp) = (meta.round_price(sl), meta.round_price(tp));
    if sl <= 0.0 || tp <= 0.0 {
        return Err(TradeError::PriceValidationFailed {
            symbol: meta.symbol.clone(),
            reason: format!("sanity bracket SL={sl} TP={tp} is not positive"),
        });
    }

    Ok(())
}

/// Turns a sized signal into a bracket whose stop and target sit on the
/// correct side of `entry_price`, inside the price band, on the tick grid.
pub fn build_plan(
    meta: &SymbolMeta,
    direction: Direction,
    entry_price: f64,
    quantity: f64,
    risk: &RiskSettings,
) -> Result<OrderPlan, TradeError> {
    let invalid = |reason: String| TradeError::PriceValidationFailed {
        symbol: meta.symbol.clone(),
        reason,
    };

    if quantity <= 0.0 || entry_price <= 0.0 {
        return Err(invalid(format!(
            "cannot plan quantity {quantity} at price {entry_price}"
        )));
    }

    let risk_distance = risk.risk_per_trade / quantity;
    let target_distance = risk.tp_usdt / quantity;
    let (raw_sl, raw_tp) = match direction {
        Direction::Long => (entry_price - risk_distance, entry_price + target_distance),
        Direction::Short => (entry_price + risk_distance, entry_price - target_distance),
    };

    let (sl, tp) = apply_buffer(meta, entry_price, raw_sl, raw_tp, direction, DEFAULT_BUFFER_PCT);
    if sl <= 0.0 || tp <= 0.0 {
        return Err(invalid(format!("non-positive bracket SL={sl} TP={tp}")));
    }

    validate_prices(meta, entry_price, quantity, direction, risk.risk_per_trade)?;

    // Rounding to the grid can step past a band edge when the entry is off-grid.
    let (band_lo, band_hi) = meta
        .tick_band(entry_price)
        .ok_or_else(|| invalid(format!("no tick fits the price band around {entry_price}")))?;
    let on_grid = |price: f64| meta.round_price(price).clamp(band_lo, band_hi);
    let (sl, tp) = (on_grid(sl), on_grid(tp));
    let min_distance = meta.tick_size;
    let sides_ok = match direction {
        Direction::Long => sl <= entry_price - min_distance && tp >= entry_price + min_distance,
        Direction::Short => sl >= entry_price + min_distance && tp <= entry_price - min_distance,
    };
    if !sides_ok {
        return Err(invalid(format!(
            "SL={sl} TP={tp} not at least one tick on the correct side of {entry_price}"
        )));
    }

    let plan = OrderPlan {
        symbol: meta.symbol.clone(),
        direction,
        entry_price,
        quantity,
        stop_price: sl,
        take_profit_price: tp,
        risk_reward_ratio: round_to_precision(risk.tp_usdt / risk.risk_per_trade, 2),
    };
    debug!("Planned bracket {:?}", plan);
    Ok(plan)
}
