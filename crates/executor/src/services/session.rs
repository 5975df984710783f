use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use common::config::{Config, RiskSettings};
use common::models::{Candidate, TradeRecord};
use common::{ExchangeError, Notifier, TradeError};
use market_data::ExchangeClient;
use market_data::services::{Screener, SymbolCatalog};
use strategy::indicators::snapshot_from_candles;
use strategy::signal_for;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::services::execution_service::ExecutionService;
use crate::services::position_sizer::{calculate_order_quantity, validate_prices};

/// Candidates attempted per trading cycle.
pub const MAX_CANDIDATES_PER_CYCLE: usize = 6;

/// Everything the bot remembers during one run. Owned by the orchestrator
/// and lent to the executor for the duration of a single trade.
#[derive(Debug, Default)]
pub struct SessionState {
    pub trades_today: u32,
    pub daily_trade_cap: u32,
    pub excluded: HashSet<String>,
    pub candidate_pool: Vec<Candidate>,
    pub trade_log: Vec<TradeRecord>,
    /// Last batch handed to the executor, kept for the final report.
    pub top_signals: Vec<Candidate>,
}

impl SessionState {
    pub fn new(daily_trade_cap: u32) -> Self {
        Self {
            daily_trade_cap,
            ..Default::default()
        }
    }

    pub fn cap_reached(&self) -> bool {
        self.trades_today >= self.daily_trade_cap
    }

    pub fn exclude(&mut self, symbol: &str, reason: impl Display) {
        if self.excluded.insert(symbol.to_string()) {
            warn!("Excluding {} for the rest of the session: {}", symbol, reason);
        }
        self.candidate_pool.retain(|c| c.symbol() != symbol);
    }

    /// Drops excluded symbols from the pool and returns the `n` best-scored
    /// candidates, highest first. Ties keep discovery order.
    pub fn select_top_candidates(&mut self, n: usize) -> Vec<Candidate> {
        let excluded = &self.excluded;
        self.candidate_pool.retain(|c| !excluded.contains(c.symbol()));
        self.candidate_pool.sort_by_key(|c| Reverse(c.score()));

        self.top_signals = self.candidate_pool.iter().take(n).cloned().collect();
        self.top_signals.clone()
    }
}

/// Screen, evaluate, and trade until the daily cap is hit or shutdown is requested.
pub struct Session {
    client: Arc<dyn ExchangeClient>,
    notifier: Arc<dyn Notifier>,
    screener: Screener,
    catalog: SymbolCatalog,
    executor: ExecutionService,
    interval: String,
    candle_limit: u16,
    risk: RiskSettings,
    trade_delay: Duration,
    scan_interval: Duration,
}

impl Session {
    pub fn new(
        client: Arc<dyn ExchangeClient>,
        notifier: Arc<dyn Notifier>,
        screener: Screener,
        catalog: SymbolCatalog,
        config: &Config,
    ) -> Self {
        Self {
            executor: ExecutionService::new(client.clone(), notifier.clone(), config.risk),
            client,
            notifier,
            screener,
            catalog,
            interval: config.interval.clone(),
            candle_limit: config.candle_limit,
            risk: config.risk,
            trade_delay: config.trade_delay,
            scan_interval: config.scan_interval,
        }
    }

    pub async fn run(
        &mut self,
        state: &mut SessionState,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), ExchangeError> {
        loop {
            if state.cap_reached() {
                info!(
                    "Max trades reached today ({}/{}). Stopping.",
                    state.trades_today, state.daily_trade_cap
                );
                return Ok(());
            }
            if *shutdown.borrow() {
                info!("Shutdown requested. Leaving trading loop.");
                return Ok(());
            }

            if state.candidate_pool.is_empty() {
                if let Err(e) = self.scan(state, &shutdown).await {
                    error!("[FATAL] Screening failed: {}", e);
                    self.notifier
                        .send(&format!("❌ Screening failed: {}", e.message()))
                        .await;
                    return Err(e);
                }
            } else {
                info!(
                    "Reusing {} remaining candidates for this cycle.",
                    state.candidate_pool.len()
                );
            }

            let traded = self.trade(state, &mut shutdown).await;
            if traded == 0 {
                info!("No valid pairs found or trades placed in this cycle.");
                if state.candidate_pool.is_empty()
                    && !state.cap_reached()
                    && pause(self.scan_interval, &mut shutdown).await
                {
                    return Ok(());
                }
            }
        }
    }

    async fn scan(
        &mut self,
        state: &mut SessionState,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<usize, ExchangeError> {
        info!("Scanning for signals...");
        let ranked = self
            .screener
            .screen(self.client.as_ref(), &self.catalog, &state.excluded)
            .await?;

        let mut found = 0;
        for entry in ranked {
            if state.cap_reached() || *shutdown.borrow() {
                break;
            }

            debug!("Scanning {}", entry.symbol);
            match self.evaluate(&entry.symbol).await {
                Ok(Some(candidate)) => {
                    info!(
                        "[SIGNAL FOUND] {} | Signal: {} | Price: {} | Score: {} | Notes: {} | Qty: {}",
                        candidate.symbol(),
                        candidate.signal.direction,
                        candidate.entry_price,
                        candidate.score(),
                        candidate.signal.rationale,
                        candidate.quantity
                    );
                    state.candidate_pool.push(candidate);
                    found += 1;
                }
                Ok(None) => debug!("No signal for {}", entry.symbol),
                Err(e) if e.excludes_symbol() => self.drop_symbol(state, &entry.symbol, e).await,
                Err(e) => debug!("Skipping {} this scan: {}", entry.symbol, e),
            }
        }

        info!("Scan finished with {} candidates", found);
        Ok(found)
    }

    async fn evaluate(&mut self, symbol: &str) -> Result<Option<Candidate>, TradeError> {
        let candles = self
            .client
            .get_candles(symbol, &self.interval, self.candle_limit)
            .await?;
        let snapshot = snapshot_from_candles(&candles)?;
        let Some(signal) = signal_for(symbol, &snapshot) else {
            return Ok(None);
        };

        let entry_price = self.client.get_mark_price(symbol).await?;
        let meta = self.catalog.meta(symbol)?;
        let quantity = calculate_order_quantity(
            &meta,
            entry_price,
            f64::from(self.risk.leverage),
            self.risk.quantity_usdt,
        )?;
        validate_prices(
            &meta,
            entry_price,
            quantity,
            signal.direction,
            self.risk.risk_per_trade,
        )?;

        Ok(Some(Candidate {
            signal,
            entry_price,
            quantity,
        }))
    }

    /// Returns the number of trades committed in this cycle.
    async fn trade(&mut self, state: &mut SessionState, shutdown: &mut watch::Receiver<bool>) -> usize {
        let top = state.select_top_candidates(MAX_CANDIDATES_PER_CYCLE);
        if top.is_empty() {
            return 0;
        }
        info!("Processing {} top signals...", top.len());

        let mut executed = 0;
        for candidate in top {
            if state.cap_reached() {
                info!("Max trades reached. Stopping further trades.");
                break;
            }
            if *shutdown.borrow() {
                break;
            }

            let symbol = candidate.symbol().to_string();
            let result = match self.catalog.meta(&symbol) {
                Ok(meta) => self.executor.execute(state, &candidate, &meta).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(_) => {
                    executed += 1;
                    state.exclude(&symbol, "traded");
                    if pause(self.trade_delay, shutdown).await {
                        break;
                    }
                }
                Err(e) => self.drop_symbol(state, &symbol, e).await,
            }
        }
        executed
    }

    async fn drop_symbol(&self, state: &mut SessionState, symbol: &str, error: TradeError) {
        if !error.already_notified() {
            self.notifier
                .send(&format!("❌ Trade Error for {symbol}: {error}"))
                .await;
        }
        state.exclude(symbol, &error);
    }
}

/// Sleeps for `duration`. Returns `true` when shutdown was requested meanwhile.
/// A closed channel carries no request, so the full pause is served.
async fn pause(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if duration.is_zero() {
        return *shutdown.borrow();
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => {}
        Ok(()) = shutdown.changed() => {}
    }
    *shutdown.borrow()
}

pub fn top_signals_message(state: &SessionState) -> String {
    if state.top_signals.is_empty() {
        return "❌ No top signals found at the end of the bot execution.".to_string();
    }
    let mut lines = vec!["<b>📊 Final Top Signals</b>".to_string()];
    lines.extend(state.top_signals.iter().enumerate().map(|(i, c)| {
        format!(
            "| {}. <code>{}</code> | Signal: <b>{}</b> |",
            i + 1,
            c.symbol(),
            c.signal.direction.to_string().to_uppercase()
        )
    }));
    lines.join("\n")
}

pub fn trade_summary_message(state: &SessionState) -> String {
    if state.trade_log.is_empty() {
        return "❌ No trades executed".to_string();
    }
    let mut lines = vec!["<b>📊 Trade Summary</b>".to_string()];
    lines.extend(state.trade_log.iter().enumerate().map(|(i, t)| {
        format!(
            "{}. <code>{}</code> | <b>{}</b>",
            i + 1,
            t.symbol,
            t.direction.to_string().to_uppercase()
        )
    }));
    lines.join("\n")
}

pub async fn send_final_summary(notifier: &dyn Notifier, state: &SessionState) {
    for record in &state.trade_log {
        info!(
            "{}. {} | Signal: {} | Entry: {} | SL: {} | TP: {} | RR: {} | Notes: {}",
            record.sequence_number,
            record.symbol,
            record.direction,
            record.entry_price,
            record.stop_price,
            record.take_profit_price,
            record.risk_reward_ratio,
            record.rationale
        );
    }

    notifier.send("Bot execution completed.").await;
    notifier.send(&top_signals_message(state)).await;
    notifier.send(&trade_summary_message(state)).await;
}
