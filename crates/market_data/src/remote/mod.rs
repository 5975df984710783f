pub mod binance_client;
pub mod exchange_info_response;
pub mod income_response;
pub mod kline_response;
pub mod markprice_response;
pub mod order_response;
pub mod ticker_response;

pub use binance_client::BinanceClient;
pub use exchange_info_response::ExchangeInfoResponse;
pub use income_response::IncomeResponse;
pub use kline_response::KlineRow;
pub use markprice_response::PremiumIndexResponse;
pub use order_response::{ApiErrorResponse, OrderResponse};
pub use ticker_response::TickerResponse;
