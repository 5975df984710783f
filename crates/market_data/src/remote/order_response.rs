use common::ExchangeError;
use common::models::PlacedOrder;
use serde::Deserialize;

use crate::traits::RemoteResponse;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: i64,
    pub symbol: String,
    pub status: String,
    #[serde(default)]
    pub client_order_id: String,
}

impl RemoteResponse<PlacedOrder> for OrderResponse {
    fn to_model(&self) -> Result<PlacedOrder, ExchangeError> {
        Ok(PlacedOrder {
            order_id: self.order_id,
            client_order_id: self.client_order_id.clone(),
        })
    }
}

/// Error body returned with non-2xx statuses: `{"code": -2019, "msg": "Margin is insufficient."}`
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub code: i64,
    pub msg: String,
}

impl From<ApiErrorResponse> for ExchangeError {
    fn from(body: ApiErrorResponse) -> Self {
        ExchangeError::Api {
            code: body.code,
            message: body.msg,
        }
    }
}
