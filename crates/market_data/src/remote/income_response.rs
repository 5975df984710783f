use common::ExchangeError;
use common::models::IncomeEntry;
use serde::Deserialize;

use crate::traits::RemoteResponse;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeResponse {
    pub symbol: String,
    pub income_type: String,
    pub income: String,
    pub time: i64,
}

impl RemoteResponse<IncomeEntry> for IncomeResponse {
    fn to_model(&self) -> Result<IncomeEntry, ExchangeError> {
        Ok(IncomeEntry {
            symbol: self.symbol.clone(),
            income: Self::parse_field("income", &self.income)?,
            time_ms: self.time,
        })
    }
}
