pub mod remote;
pub mod services;
pub mod traits;

pub use remote::BinanceClient;
pub use traits::ExchangeClient;

#[cfg(any(test, feature = "mocks"))]
pub use traits::MockExchangeClient;
