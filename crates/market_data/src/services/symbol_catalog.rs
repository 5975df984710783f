use std::collections::HashMap;

use common::TradeError;
use common::models::{Instrument, SymbolMeta};

/// Session-wide reference data: the tradeable instruments and the
/// [`SymbolMeta`] parsed from their filters on first use.
#[derive(Debug, Default)]
pub struct SymbolCatalog {
    instruments: HashMap<String, Instrument>,
    cache: HashMap<String, SymbolMeta>,
}

impl SymbolCatalog {
    pub fn new(instruments: impl IntoIterator<Item = Instrument>) -> Self {
        Self {
            instruments: instruments
                .into_iter()
                .map(|i| (i.symbol.clone(), i))
                .collect(),
            cache: HashMap::new(),
        }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.instruments.contains_key(symbol)
    }

    pub fn instruments(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.values()
    }

    pub fn meta(&mut self, symbol: &str) -> Result<SymbolMeta, TradeError> {
        if let Some(meta) = self.cache.get(symbol) {
            return Ok(meta.clone());
        }

        let instrument = self
            .instruments
            .get(symbol)
            .ok_or_else(|| TradeError::InvalidConstraint {
                symbol: symbol.to_string(),
                reason: "symbol not listed in exchange info".to_string(),
            })?;
        let meta = SymbolMeta::from_instrument(instrument)?;

        self.cache.insert(symbol.to_string(), meta.clone());
        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::InstrumentFilter;

    fn listed(symbol: &str, filters: Vec<InstrumentFilter>) -> Instrument {
        Instrument {
            symbol: symbol.to_string(),
            contract_type: "PERPETUAL".to_string(),
            quote_asset: "USDT".to_string(),
            filters,
        }
    }

    #[test]
    fn test_meta_is_parsed_once_and_cached() {
        let mut catalog = SymbolCatalog::new([listed(
            "ABCUSDT",
            vec![
                InstrumentFilter::Price { tick_size: "0.01".to_string() },
                InstrumentFilter::LotSize { step_size: "0.001".to_string() },
                InstrumentFilter::MinNotional { notional: "5".to_string() },
                InstrumentFilter::PercentPrice {
                    multiplier_up: "1.05".to_string(),
                    multiplier_down: "0.95".to_string(),
                },
            ],
        )]);

        let first = catalog.meta("ABCUSDT").unwrap();
        let second = catalog.meta("ABCUSDT").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.quantity_precision, 3);
    }

    #[test]
    fn test_unknown_or_malformed_symbols_are_invalid_constraints() {
        let mut catalog = SymbolCatalog::new([listed("BADUSDT", vec![])]);

        assert!(matches!(
            catalog.meta("NOPEUSDT"),
            Err(TradeError::InvalidConstraint { .. })
        ));
        assert!(matches!(
            catalog.meta("BADUSDT"),
            Err(TradeError::InvalidConstraint { .. })
        ));
    }
}
