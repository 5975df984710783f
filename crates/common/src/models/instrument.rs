use serde::Deserialize;

/// One entry of the futures `exchangeInfo.symbols` array. Filter values stay
/// as the exchange sends them (decimal strings) until a [`super::SymbolMeta`]
/// is built from them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub symbol: String,
    pub contract_type: String,
    pub quote_asset: String,
    #[serde(default)]
    pub filters: Vec<InstrumentFilter>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "filterType")]
pub enum InstrumentFilter {
    #[serde(rename = "PRICE_FILTER")]
    Price {
        #[serde(rename = "tickSize")]
        tick_size: String,
    },
    #[serde(rename = "LOT_SIZE")]
    LotSize {
        #[serde(rename = "stepSize")]
        step_size: String,
    },
    #[serde(rename = "MIN_NOTIONAL")]
    MinNotional { notional: String },
    #[serde(rename = "PERCENT_PRICE")]
    PercentPrice {
        #[serde(rename = "multiplierUp")]
        multiplier_up: String,
        #[serde(rename = "multiplierDown")]
        multiplier_down: String,
    },
    #[serde(other)]
    Other,
}

impl Instrument {
    pub fn is_perpetual(&self) -> bool {
        self.contract_type == "PERPETUAL"
    }

    pub fn tick_size(&self) -> Option<&str> {
        self.filters.iter().find_map(|f| match f {
            InstrumentFilter::Price { tick_size } => Some(tick_size.as_str()),
            _ => None,
        })
    }

    pub fn step_size(&self) -> Option<&str> {
        self.filters.iter().find_map(|f| match f {
            InstrumentFilter::LotSize { step_size } => Some(step_size.as_str()),
            _ => None,
        })
    }

    pub fn min_notional(&self) -> Option<&str> {
        self.filters.iter().find_map(|f| match f {
            InstrumentFilter::MinNotional { notional } => Some(notional.as_str()),
            _ => None,
        })
    }

    /// `(multiplier_down, multiplier_up)`
    pub fn percent_price(&self) -> Option<(&str, &str)> {
        self.filters.iter().find_map(|f| match f {
            InstrumentFilter::PercentPrice {
                multiplier_up,
                multiplier_down,
            } => Some((multiplier_down.as_str(), multiplier_up.as_str())),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_exchange_info_symbol() {
        let raw = r#"{
            "symbol": "ABCUSDT",
            "pair": "ABCUSDT",
            "contractType": "PERPETUAL",
            "quoteAsset": "USDT",
            "filters": [
                {"filterType": "PRICE_FILTER", "minPrice": "0.0001", "maxPrice": "200", "tickSize": "0.0001"},
                {"filterType": "LOT_SIZE", "stepSize": "0.1", "minQty": "0.1", "maxQty": "100000"},
                {"filterType": "MARKET_LOT_SIZE", "stepSize": "1", "minQty": "1", "maxQty": "1000"},
                {"filterType": "MAX_NUM_ORDERS", "limit": 200},
                {"filterType": "MIN_NOTIONAL", "notional": "5"},
                {"filterType": "PERCENT_PRICE", "multiplierUp": "1.0500", "multiplierDown": "0.9500", "multiplierDecimal": "4"}
            ]
        }"#;

        let instrument: Instrument = serde_json::from_str(raw).expect("symbol should decode");

        assert!(instrument.is_perpetual());
        assert_eq!(instrument.tick_size(), Some("0.0001"));
        assert_eq!(instrument.step_size(), Some("0.1"));
        assert_eq!(instrument.min_notional(), Some("5"));
        assert_eq!(instrument.percent_price(), Some(("0.9500", "1.0500")));
    }
}
