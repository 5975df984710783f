use std::collections::HashSet;

use common::ExchangeError;
use common::models::{Instrument, Ticker24h};
use tracing::{debug, info};

use crate::services::SymbolCatalog;
use crate::traits::ExchangeClient;

/// Index and basket contracts that trade unlike single coins.
pub const PROBLEMATIC_PAIRS: &[&str] = &["BTCDOM", "DEFI"];

#[derive(Debug, Clone)]
struct ScreenerRules {
    contract_type: String,
    quote_asset: String,
    denylist: Vec<String>,
    min_quote_volume: f64,
    /// Exclusive bounds on the absolute 24h price change, in percent.
    min_abs_change_pct: f64,
    max_abs_change_pct: f64,
}

impl Default for ScreenerRules {
    fn default() -> Self {
        Self {
            contract_type: "PERPETUAL".to_string(),
            quote_asset: "USDT".to_string(),
            denylist: PROBLEMATIC_PAIRS.iter().map(|s| s.to_string()).collect(),
            min_quote_volume: 1_000_000.0,
            min_abs_change_pct: 1.0,
            max_abs_change_pct: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedSymbol {
    pub symbol: String,
    pub quote_volume: f64,
    pub price_change_percent: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Screener {
    rules: ScreenerRules,
}

impl Screener {
    pub fn is_tradeable(&self, instrument: &Instrument) -> bool {
        instrument.contract_type == self.rules.contract_type
            && instrument.quote_asset == self.rules.quote_asset
            && !self
                .rules
                .denylist
                .iter()
                .any(|bad| instrument.symbol.contains(bad.as_str()))
    }

    /// Keeps only the instruments this bot may ever trade.
    pub fn catalog(&self, instruments: Vec<Instrument>) -> SymbolCatalog {
        SymbolCatalog::new(instruments.into_iter().filter(|i| self.is_tradeable(i)))
    }

    /// Applies the liquidity and volatility filters and orders the survivors
    /// by 24h quote volume, highest first.
    pub fn rank(
        &self,
        catalog: &SymbolCatalog,
        tickers: &[Ticker24h],
        excluded: &HashSet<String>,
    ) -> Vec<RankedSymbol> {
        let mut ranked: Vec<RankedSymbol> = tickers
            .iter()
            .filter(|t| catalog.contains(&t.symbol))
            .filter(|t| !excluded.contains(&t.symbol))
            .filter_map(|t| {
                let quote_volume = t.quote_volume();
                let change = t.price_change_percent.abs();
                let passes = quote_volume > self.rules.min_quote_volume
                    && change > self.rules.min_abs_change_pct
                    && change < self.rules.max_abs_change_pct;
                if !passes {
                    debug!(
                        "Screened out {} (volume {:.0}, change {:.2}%)",
                        t.symbol, quote_volume, t.price_change_percent
                    );
                }
                passes.then(|| RankedSymbol {
                    symbol: t.symbol.clone(),
                    quote_volume,
                    price_change_percent: t.price_change_percent,
                })
            })
            .collect();

        ranked.sort_by(|a, b| b.quote_volume.total_cmp(&a.quote_volume));
        ranked
    }

    pub async fn screen(
        &self,
        client: &dyn ExchangeClient,
        catalog: &SymbolCatalog,
        excluded: &HashSet<String>,
    ) -> Result<Vec<RankedSymbol>, ExchangeError> {
        let tickers = client.get_24h_tickers().await?;
        let ranked = self.rank(catalog, &tickers, excluded);
        info!(
            "Screener kept {} of {} tickers",
            ranked.len(),
            tickers.len()
        );
        Ok(ranked)
    }
}
