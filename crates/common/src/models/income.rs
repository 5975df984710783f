#[derive(Debug, Clone, PartialEq)]
pub struct IncomeEntry {
    pub symbol: String,
    pub income: f64,
    pub time_ms: i64,
}
