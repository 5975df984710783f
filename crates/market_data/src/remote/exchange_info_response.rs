use common::models::Instrument;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ExchangeInfoResponse {
    pub symbols: Vec<Instrument>,
}
