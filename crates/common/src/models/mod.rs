pub mod candle;
pub mod income;
pub mod instrument;
pub mod order;
pub mod signal;
pub mod symbol_meta;
pub mod ticker;
pub mod trade_record;

pub use candle::Candle;
pub use income::IncomeEntry;
pub use instrument::{Instrument, InstrumentFilter};
pub use order::{OrderLeg, OrderPlan, OrderSpec, OrderType, PlacedOrder};
pub use signal::{Candidate, Direction, Side, Signal};
pub use symbol_meta::SymbolMeta;
pub use ticker::Ticker24h;
pub use trade_record::TradeRecord;
