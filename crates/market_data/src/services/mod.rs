pub mod screener;
pub mod symbol_catalog;

pub use screener::{RankedSymbol, Screener};
pub use symbol_catalog::SymbolCatalog;
