use common::ExchangeError;
use serde::Deserialize;

use crate::traits::RemoteResponse;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PremiumIndexResponse {
    pub symbol: String,
    pub mark_price: String,
}

impl RemoteResponse<f64> for PremiumIndexResponse {
    fn to_model(&self) -> Result<f64, ExchangeError> {
        Self::parse_field("markPrice", &self.mark_price)
    }
}
