#[derive(Debug, Clone, PartialEq)]
pub struct Ticker24h {
    pub symbol: String,
    pub volume: f64,
    pub last_price: f64,
    pub price_change_percent: f64,
}

impl Ticker24h {
    /// 24h traded volume expressed in the quote asset.
    pub fn quote_volume(&self) -> f64 {
        self.volume * self.last_price
    }
}
