use std::fmt;

use super::{Direction, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderType {
    Market,
    StopMarket,
    TakeProfitMarket,
}

impl OrderType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Market => "MARKET",
            Self::StopMarket => "STOP_MARKET",
            Self::TakeProfitMarket => "TAKE_PROFIT_MARKET",
        }
    }
}

/// Which part of a bracket an order belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderLeg {
    Entry,
    StopLoss,
    TakeProfit,
    Flatten,
}

impl fmt::Display for OrderLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry => write!(f, "market entry"),
            Self::StopLoss => write!(f, "stop-loss"),
            Self::TakeProfit => write!(f, "take-profit"),
            Self::Flatten => write!(f, "reduce-only flatten"),
        }
    }
}

/// Exchange-agnostic description of a single order request.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSpec {
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Option<f64>,
    pub stop_price: Option<f64>,
    pub close_position: bool,
    pub reduce_only: bool,
    /// Triggered orders are evaluated against the mark price, not last trade.
    pub working_type_mark_price: bool,
    /// Good-till-canceled.
    pub time_in_force_gtc: bool,
    pub leg: OrderLeg,
}

impl OrderSpec {
    pub fn market_entry(symbol: &str, direction: Direction, quantity: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            side: direction.entry_side(),
            order_type: OrderType::Market,
            quantity: Some(quantity),
            stop_price: None,
            close_position: false,
            reduce_only: false,
            working_type_mark_price: false,
            time_in_force_gtc: false,
            leg: OrderLeg::Entry,
        }
    }

    pub fn stop_loss(symbol: &str, direction: Direction, stop_price: f64) -> Self {
        Self::close_position_trigger(symbol, direction, OrderType::StopMarket, stop_price, OrderLeg::StopLoss)
    }

    pub fn take_profit(symbol: &str, direction: Direction, stop_price: f64) -> Self {
        Self::close_position_trigger(
            symbol,
            direction,
            OrderType::TakeProfitMarket,
            stop_price,
            OrderLeg::TakeProfit,
        )
    }

    /// Reduce-only market order that closes `quantity` of an open position.
    pub fn flatten(symbol: &str, direction: Direction, quantity: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            side: direction.exit_side(),
            order_type: OrderType::Market,
            quantity: Some(quantity),
            stop_price: None,
            close_position: false,
            reduce_only: true,
            working_type_mark_price: false,
            time_in_force_gtc: false,
            leg: OrderLeg::Flatten,
        }
    }

    fn close_position_trigger(
        symbol: &str,
        direction: Direction,
        order_type: OrderType,
        stop_price: f64,
        leg: OrderLeg,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            side: direction.exit_side(),
            order_type,
            quantity: None,
            stop_price: Some(stop_price),
            close_position: true,
            reduce_only: false,
            working_type_mark_price: true,
            time_in_force_gtc: true,
            leg,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    pub order_id: i64,
    pub client_order_id: String,
}

/// Executable bracket derived from a signal and the symbol's constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPlan {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub quantity: f64,
    pub stop_price: f64,
    pub take_profit_price: f64,
    pub risk_reward_ratio: f64,
}

impl OrderPlan {
    pub fn entry_order(&self) -> OrderSpec {
        OrderSpec::market_entry(&self.symbol, self.direction, self.quantity)
    }

    pub fn stop_order(&self) -> OrderSpec {
        OrderSpec::stop_loss(&self.symbol, self.direction, self.stop_price)
    }

    pub fn take_profit_order(&self) -> OrderSpec {
        OrderSpec::take_profit(&self.symbol, self.direction, self.take_profit_price)
    }

    pub fn flatten_order(&self) -> OrderSpec {
        OrderSpec::flatten(&self.symbol, self.direction, self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protective_orders_close_position_on_mark_price() {
        let plan = OrderPlan {
            symbol: "ABCUSDT".to_string(),
            direction: Direction::Long,
            entry_price: 100.0,
            quantity: 0.2,
            stop_price: 97.5,
            take_profit_price: 102.5,
            risk_reward_ratio: 1.0,
        };

        let entry = plan.entry_order();
        assert_eq!(entry.side, Side::Buy);
        assert_eq!(entry.order_type, OrderType::Market);
        assert_eq!(entry.quantity, Some(0.2));

        for (spec, order_type) in [
            (plan.stop_order(), OrderType::StopMarket),
            (plan.take_profit_order(), OrderType::TakeProfitMarket),
        ] {
            assert_eq!(spec.side, Side::Sell);
            assert_eq!(spec.order_type, order_type);
            assert!(spec.close_position);
            assert!(spec.working_type_mark_price);
            assert!(spec.time_in_force_gtc);
            assert_eq!(spec.quantity, None);
        }

        let flatten = plan.flatten_order();
        assert!(flatten.reduce_only);
        assert_eq!(flatten.side, Side::Sell);
        assert_eq!(flatten.quantity, Some(0.2));
    }
}
