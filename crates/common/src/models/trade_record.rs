use serde::Serialize;

use super::Direction;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    pub sequence_number: u32,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_price: f64,
    pub take_profit_price: f64,
    pub quantity: f64,
    pub risk_reward_ratio: f64,
    pub rationale: String,
}
