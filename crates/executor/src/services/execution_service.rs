use std::sync::Arc;

use common::config::RiskSettings;
use common::models::{Candidate, OrderLeg, OrderPlan, OrderSpec, SymbolMeta, TradeRecord};
use common::{ExchangeError, Notifier, TradeError};
use market_data::ExchangeClient;
use tracing::{debug, error, info, warn};

use crate::services::position_sizer::build_plan;
use crate::services::session::SessionState;

/// Largest mark-price move, in percent of the evaluated entry, tolerated
/// between signal evaluation and the live entry.
pub const MAX_PRICE_DRIFT_PCT: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Idle,
    TestingEntry,
    TestingStop,
    TestingTakeProfit,
    PlacingEntry,
    PlacingStop,
    PlacingTakeProfit,
    Committed,
    RolledBack,
    Failed,
}

impl ExecutionState {
    pub fn can_advance_to(self, next: Self) -> bool {
        use ExecutionState::*;
        matches!(
            (self, next),
            (Idle, TestingEntry)
                | (TestingEntry, TestingStop)
                | (TestingStop, TestingTakeProfit)
                | (TestingTakeProfit, PlacingEntry)
                | (PlacingEntry, PlacingStop)
                | (PlacingStop, PlacingTakeProfit)
                | (PlacingTakeProfit, Committed)
                | (Idle | TestingEntry | TestingStop | TestingTakeProfit | PlacingEntry, Failed)
                | (PlacingEntry | PlacingStop | PlacingTakeProfit, RolledBack)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack | Self::Failed)
    }
}

struct Attempt {
    symbol: String,
    state: ExecutionState,
}

impl Attempt {
    fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            state: ExecutionState::Idle,
        }
    }

    fn advance(&mut self, next: ExecutionState) {
        if !self.state.can_advance_to(next) {
            error!("{}: illegal transition {:?} -> {:?}", self.symbol, self.state, next);
        }
        debug!("{}: {:?} -> {:?}", self.symbol, self.state, next);
        self.state = next;
    }
}

/// Drives one candidate through dry run, live entry and protective orders.
pub struct ExecutionService {
    client: Arc<dyn ExchangeClient>,
    notifier: Arc<dyn Notifier>,
    risk: RiskSettings,
}

impl ExecutionService {
    pub fn new(
        client: Arc<dyn ExchangeClient>,
        notifier: Arc<dyn Notifier>,
        risk: RiskSettings,
    ) -> Self {
        Self {
            client,
            notifier,
            risk,
        }
    }

    /// Either commits a fully protected position and returns its record, or
    /// leaves no position behind. Once the entry is live, any protective
    /// order failure is followed by a single reduce-only flatten.
    pub async fn execute(
        &self,
        session: &mut SessionState,
        candidate: &Candidate,
        meta: &SymbolMeta,
    ) -> Result<TradeRecord, TradeError> {
        let mut attempt = Attempt::new(candidate.symbol());
        let result = self.run(&mut attempt, session, candidate, meta).await;

        if let Err(e) = &result {
            if !attempt.state.is_terminal() {
                attempt.advance(ExecutionState::Failed);
            }
            warn!("Trade for {} ended in {:?}: {}", candidate.symbol(), attempt.state, e);
        }
        result
    }

    async fn run(
        &self,
        attempt: &mut Attempt,
        session: &mut SessionState,
        candidate: &Candidate,
        meta: &SymbolMeta,
    ) -> Result<TradeRecord, TradeError> {
        let symbol = candidate.symbol();
        let direction = candidate.signal.direction;
        let plan = build_plan(meta, direction, candidate.entry_price, candidate.quantity, &self.risk)?;

        if let Err(e) = self.client.change_leverage(symbol, self.risk.leverage).await {
            return Err(TradeError::LeverageRejected {
                symbol: symbol.to_string(),
                message: e.message(),
            });
        }

        self.dry_run(attempt, &plan).await?;
        info!("All simulations passed for {}. Proceeding with real orders.", symbol);

        attempt.advance(ExecutionState::PlacingEntry);
        let fill_price = self.place_entry(attempt, &plan, candidate.entry_price).await?;
        session.trades_today += 1;

        let live = match build_plan(meta, direction, fill_price, plan.quantity, &self.risk) {
            Ok(live) => live,
            Err(e) => {
                return Err(self
                    .rollback(attempt, session, &plan, OrderLeg::StopLoss, e.to_string())
                    .await);
            }
        };

        attempt.advance(ExecutionState::PlacingStop);
        if let Err(e) = self.place_protective(&live.stop_order()).await {
            return Err(self
                .rollback(attempt, session, &live, OrderLeg::StopLoss, e.message())
                .await);
        }

        attempt.advance(ExecutionState::PlacingTakeProfit);
        if let Err(e) = self.place_protective(&live.take_profit_order()).await {
            return Err(self
                .rollback(attempt, session, &live, OrderLeg::TakeProfit, e.message())
                .await);
        }

        attempt.advance(ExecutionState::Committed);
        let record = TradeRecord {
            sequence_number: session.trades_today,
            symbol: symbol.to_string(),
            direction,
            entry_price: fill_price,
            stop_price: live.stop_price,
            take_profit_price: live.take_profit_price,
            quantity: live.quantity,
            risk_reward_ratio: live.risk_reward_ratio,
            rationale: candidate.signal.rationale.clone(),
        };
        info!(
            "[TRADE] Placed {} | {} | Entry: {} | SL: {} | TP: {} | Qty: {}",
            record.symbol,
            record.direction.to_string().to_uppercase(),
            record.entry_price,
            record.stop_price,
            record.take_profit_price,
            record.quantity
        );
        session.trade_log.push(record.clone());
        self.notifier.send(&trade_card(&record)).await;

        Ok(record)
    }

    async fn dry_run(&self, attempt: &mut Attempt, plan: &OrderPlan) -> Result<(), TradeError> {
        let steps = [
            (ExecutionState::TestingEntry, plan.entry_order()),
            (ExecutionState::TestingStop, plan.stop_order()),
            (ExecutionState::TestingTakeProfit, plan.take_profit_order()),
        ];

        for (state, spec) in steps {
            attempt.advance(state);
            if let Err(e) = self.client.simulate_order(&spec).await {
                let message = e.message();
                error!("Failed to validate {} order for {}: {}", spec.leg, plan.symbol, message);
                self.notifier
                    .send(&format!(
                        "❌ Failed to validate {} order for {}: {}",
                        spec.leg, plan.symbol, message
                    ))
                    .await;
                return Err(TradeError::SimulationFailed {
                    symbol: plan.symbol.clone(),
                    leg: spec.leg,
                    message,
                });
            }
        }
        Ok(())
    }

    /// Returns the fill price used to rebuild the protective legs.
    async fn place_entry(
        &self,
        attempt: &mut Attempt,
        plan: &OrderPlan,
        evaluated_price: f64,
    ) -> Result<f64, TradeError> {
        let symbol = plan.symbol.as_str();
        let mark = self.client.get_mark_price(symbol).await?;
        let moved_pct = (mark - evaluated_price).abs() / evaluated_price * 100.0;
        if moved_pct > MAX_PRICE_DRIFT_PCT {
            warn!(
                "Price moved significantly for {}. Evaluated: {}, Current: {}",
                symbol, evaluated_price, mark
            );
            return Err(TradeError::StalePrice {
                symbol: symbol.to_string(),
                evaluated: evaluated_price,
                current: mark,
                moved_pct,
            });
        }

        match self.client.place_order(&plan.entry_order()).await {
            Ok(order) => {
                info!("Market order placed for {} with orderId: {}", symbol, order.order_id);
                match self.client.get_mark_price(symbol).await {
                    Ok(fill) => Ok(fill),
                    Err(e) => {
                        warn!("Could not refresh fill price for {}: {}. Using {}", symbol, e, mark);
                        Ok(mark)
                    }
                }
            }
            Err(e) if e.is_already_executed() => {
                info!("Order already executed for {} (Market)", symbol);
                Ok(mark)
            }
            Err(e) if e.outcome_unknown() => {
                let message = e.message();
                error!(
                    "Entry for {} got no answer ({}). Flattening in case it filled",
                    symbol, message
                );
                let flattened = self.flatten(plan).await;
                attempt.advance(ExecutionState::RolledBack);

                let outcome = if flattened {
                    "Reduce-only close sent."
                } else {
                    "Reduce-only close rejected, check for an open position."
                };
                self.notifier
                    .send(&format!(
                        "❌ Real order failed for {}: {}\n{}",
                        symbol, message, outcome
                    ))
                    .await;
                Err(TradeError::EntryPlacementFailed {
                    symbol: symbol.to_string(),
                    message,
                })
            }
            Err(e) => {
                let message = e.message();
                error!("Real order failed for {}: {}", symbol, message);
                self.notifier
                    .send(&format!("❌ Real order failed for {}: {}", symbol, message))
                    .await;
                Err(TradeError::EntryPlacementFailed {
                    symbol: symbol.to_string(),
                    message,
                })
            }
        }
    }

    async fn place_protective(&self, spec: &OrderSpec) -> Result<(), ExchangeError> {
        match self.client.place_order(spec).await {
            Ok(order) => {
                info!(
                    "{} order placed for {} at {:?} (orderId {})",
                    spec.leg, spec.symbol, spec.stop_price, order.order_id
                );
                Ok(())
            }
            Err(e) if e.is_already_exists() => {
                info!("{} order already exists for {}", spec.leg, spec.symbol);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn rollback(
        &self,
        attempt: &mut Attempt,
        session: &mut SessionState,
        plan: &OrderPlan,
        leg: OrderLeg,
        message: String,
    ) -> TradeError {
        error!("Failed to place {} order for {}: {}", leg, plan.symbol, message);

        let flattened = self.flatten(plan).await;
        session.trades_today = session.trades_today.saturating_sub(1);
        attempt.advance(ExecutionState::RolledBack);

        let outcome = if flattened {
            "Position closed."
        } else {
            "Flatten FAILED, check the position manually."
        };
        self.notifier
            .send(&format!(
                "❌ {} failed for {}: {}\n{}",
                leg, plan.symbol, message, outcome
            ))
            .await;

        TradeError::ProtectiveOrderFailed {
            symbol: plan.symbol.clone(),
            leg,
            message,
            flattened,
        }
    }

    /// One reduce-only market order for the planned quantity. Never retried.
    async fn flatten(&self, plan: &OrderPlan) -> bool {
        match self.client.place_order(&plan.flatten_order()).await {
            Ok(_) => {
                info!("Position flattened for {}", plan.symbol);
                true
            }
            Err(e) => {
                error!(
                    "Flatten of {} {} failed: {}. Position may be unprotected",
                    plan.quantity, plan.symbol, e
                );
                false
            }
        }
    }
}

pub fn trade_card(record: &TradeRecord) -> String {
    format!(
        "📈 <b>TRADE EXECUTED</b>\n\
         Pair: <code>{}</code>\n\
         Signal: <b>{}</b>\n\
         Entry: ${:.2}\n\
         SL: ${:.2}\n\
         TP: ${:.2}\n\
         Qty: {}\n\
         RR: {}\n\
         Notes: {}",
        record.symbol,
        record.direction.to_string().to_uppercase(),
        record.entry_price,
        record.stop_price,
        record.take_profit_price,
        record.quantity,
        record.risk_reward_ratio,
        record.rationale
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::{Direction, PlacedOrder, Signal};
    use common::notifier::MockNotifier;
    use market_data::MockExchangeClient;

    fn meta() -> SymbolMeta {
        SymbolMeta {
            symbol: "ABCUSDT".to_string(),
            quantity_precision: 3,
            tick_size: 0.01,
            min_notional: 5.0,
            price_band_multiplier_down: 0.95,
            price_band_multiplier_up: 1.05,
        }
    }

    fn candidate() -> Candidate {
        Candidate {
            signal: Signal {
                symbol: "ABCUSDT".to_string(),
                direction: Direction::Long,
                confidence_score: 100,
                rationale: "[Attempt 1] Perfect match for LONG | Confirmed by EMA200".to_string(),
            },
            entry_price: 100.0,
            quantity: 0.2,
        }
    }

    fn placed() -> Result<PlacedOrder, ExchangeError> {
        Ok(PlacedOrder {
            order_id: 42,
            client_order_id: "bot-test".to_string(),
        })
    }

    fn rejected(message: &str) -> ExchangeError {
        ExchangeError::Api {
            code: -2021,
            message: message.to_string(),
        }
    }

    fn ready_client(mark: f64) -> MockExchangeClient {
        let mut client = MockExchangeClient::new();
        client.expect_change_leverage().returning(|_, _| Ok(()));
        client.expect_get_mark_price().returning(move |_| Ok(mark));
        client
    }

    fn quiet_notifier() -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier.expect_send().returning(|_| ());
        notifier
    }

    fn service(client: MockExchangeClient, notifier: MockNotifier) -> ExecutionService {
        ExecutionService::new(Arc::new(client), Arc::new(notifier), RiskSettings::default())
    }

    #[test]
    fn test_transition_table() {
        use ExecutionState::*;
        assert!(Idle.can_advance_to(TestingEntry));
        assert!(TestingStop.can_advance_to(Failed));
        assert!(PlacingStop.can_advance_to(RolledBack));
        assert!(!TestingStop.can_advance_to(RolledBack));
        assert!(!Idle.can_advance_to(PlacingEntry));
        assert!(!Committed.can_advance_to(RolledBack));
        assert!(RolledBack.is_terminal() && !PlacingEntry.is_terminal());
    }

    #[tokio::test]
    async fn test_stop_simulation_failure_places_no_live_order() {
        let mut client = ready_client(100.0);
        client
            .expect_simulate_order()
            .withf(|spec| spec.leg == OrderLeg::StopLoss)
            .returning(|_| Err(rejected("Order would immediately trigger.")));
        client
            .expect_simulate_order()
            .withf(|spec| spec.leg != OrderLeg::StopLoss)
            .returning(|_| Ok(()));
        client.expect_place_order().times(0);

        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .withf(|text| text.contains("Failed to validate stop-loss order for ABCUSDT"))
            .times(1)
            .returning(|_| ());

        let mut session = SessionState::new(6);
        let err = service(client, notifier)
            .execute(&mut session, &candidate(), &meta())
            .await
            .unwrap_err();

        assert!(matches!(err, TradeError::SimulationFailed { leg: OrderLeg::StopLoss, .. }));
        assert_eq!(session.trades_today, 0);
        assert!(session.trade_log.is_empty());
    }

    #[tokio::test]
    async fn test_live_stop_failure_flattens_exactly_once() {
        let mut client = ready_client(100.0);
        client.expect_simulate_order().returning(|_| Ok(()));
        client
            .expect_place_order()
            .withf(|spec| spec.leg == OrderLeg::Entry)
            .times(1)
            .returning(|_| placed());
        client
            .expect_place_order()
            .withf(|spec| spec.leg == OrderLeg::StopLoss)
            .times(1)
            .returning(|_| Err(rejected("Order would immediately trigger.")));
        client
            .expect_place_order()
            .withf(|spec| {
                spec.leg == OrderLeg::Flatten && spec.reduce_only && spec.quantity == Some(0.2)
            })
            .times(1)
            .returning(|_| placed());
        client
            .expect_place_order()
            .withf(|spec| spec.leg == OrderLeg::TakeProfit)
            .times(0);

        let mut session = SessionState::new(6);
        session.trades_today = 2;
        let err = service(client, quiet_notifier())
            .execute(&mut session, &candidate(), &meta())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            TradeError::ProtectiveOrderFailed {
                symbol: "ABCUSDT".to_string(),
                leg: OrderLeg::StopLoss,
                message: "Order would immediately trigger.".to_string(),
                flattened: true,
            }
        );
        assert_eq!(session.trades_today, 2);
    }

    #[tokio::test]
    async fn test_take_profit_failure_reports_failed_flatten() {
        let mut client = ready_client(100.0);
        client.expect_simulate_order().returning(|_| Ok(()));
        client
            .expect_place_order()
            .withf(|spec| matches!(spec.leg, OrderLeg::Entry | OrderLeg::StopLoss))
            .times(2)
            .returning(|_| placed());
        client
            .expect_place_order()
            .withf(|spec| spec.leg == OrderLeg::TakeProfit)
            .returning(|_| Err(rejected("Margin is insufficient.")));
        client
            .expect_place_order()
            .withf(|spec| spec.leg == OrderLeg::Flatten)
            .times(1)
            .returning(|_| Err(ExchangeError::Timeout));

        let mut session = SessionState::new(6);
        let err = service(client, quiet_notifier())
            .execute(&mut session, &candidate(), &meta())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TradeError::ProtectiveOrderFailed { leg: OrderLeg::TakeProfit, flattened: false, .. }
        ));
        assert_eq!(session.trades_today, 0);
    }

    #[tokio::test]
    async fn test_successful_bracket_is_committed_and_recorded() {
        let mut client = ready_client(100.0);
        client.expect_simulate_order().times(3).returning(|_| Ok(()));
        client
            .expect_place_order()
            .withf(|spec| spec.leg != OrderLeg::Flatten)
            .times(3)
            .returning(|_| placed());

        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .withf(|text| text.starts_with("📈 <b>TRADE EXECUTED</b>") && text.contains("<code>ABCUSDT</code>"))
            .times(1)
            .returning(|_| ());

        let mut session = SessionState::new(6);
        let record = service(client, notifier)
            .execute(&mut session, &candidate(), &meta())
            .await
            .unwrap();

        assert_eq!(session.trades_today, 1);
        assert_eq!(record.sequence_number, 1);
        assert_eq!(record.stop_price, 97.5);
        assert_eq!(record.take_profit_price, 102.5);
        assert_eq!(session.trade_log, vec![record]);
    }

    #[tokio::test]
    async fn test_stale_price_aborts_before_entry() {
        let mut client = ready_client(100.6);
        client.expect_simulate_order().returning(|_| Ok(()));
        client.expect_place_order().times(0);

        let mut session = SessionState::new(6);
        let err = service(client, quiet_notifier())
            .execute(&mut session, &candidate(), &meta())
            .await
            .unwrap_err();

        assert!(matches!(err, TradeError::StalePrice { .. }));
        assert_eq!(session.trades_today, 0);
    }

    #[tokio::test]
    async fn test_already_executed_entry_and_existing_stop_are_benign() {
        let mut client = ready_client(100.0);
        client.expect_simulate_order().returning(|_| Ok(()));
        client
            .expect_place_order()
            .withf(|spec| spec.leg == OrderLeg::Entry)
            .returning(|_| Err(rejected("Order has been executed")));
        client
            .expect_place_order()
            .withf(|spec| spec.leg == OrderLeg::StopLoss)
            .returning(|_| Err(rejected("Stop order already exists.")));
        client
            .expect_place_order()
            .withf(|spec| spec.leg == OrderLeg::TakeProfit)
            .returning(|_| placed());
        client
            .expect_place_order()
            .withf(|spec| spec.leg == OrderLeg::Flatten)
            .times(0);

        let mut session = SessionState::new(6);
        let record = service(client, quiet_notifier())
            .execute(&mut session, &candidate(), &meta())
            .await
            .unwrap();

        assert_eq!(record.entry_price, 100.0);
        assert_eq!(session.trades_today, 1);
    }

    #[tokio::test]
    async fn test_rejected_entry_is_not_counted() {
        let mut client = ready_client(100.0);
        client.expect_simulate_order().returning(|_| Ok(()));
        client
            .expect_place_order()
            .withf(|spec| spec.leg == OrderLeg::Entry)
            .times(1)
            .returning(|_| Err(rejected("Margin is insufficient.")));
        client
            .expect_place_order()
            .withf(|spec| spec.leg == OrderLeg::Flatten)
            .times(0);

        let mut session = SessionState::new(6);
        let err = service(client, quiet_notifier())
            .execute(&mut session, &candidate(), &meta())
            .await
            .unwrap_err();

        assert!(matches!(err, TradeError::EntryPlacementFailed { .. }));
        assert_eq!(session.trades_today, 0);
    }

    #[tokio::test]
    async fn test_unanswered_entry_is_flattened_once() {
        let mut client = ready_client(100.0);
        client.expect_simulate_order().returning(|_| Ok(()));
        client
            .expect_place_order()
            .withf(|spec| spec.leg == OrderLeg::Entry)
            .times(1)
            .returning(|_| Err(ExchangeError::Timeout));
        client
            .expect_place_order()
            .withf(|spec| {
                spec.leg == OrderLeg::Flatten && spec.reduce_only && spec.quantity == Some(0.2)
            })
            .times(1)
            .returning(|_| Err(rejected("ReduceOnly Order is rejected.")));
        client
            .expect_place_order()
            .withf(|spec| matches!(spec.leg, OrderLeg::StopLoss | OrderLeg::TakeProfit))
            .times(0);

        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .withf(|text| text.contains("Real order failed for ABCUSDT") && text.contains("Reduce-only"))
            .times(1)
            .returning(|_| ());

        let mut session = SessionState::new(6);
        let err = service(client, notifier)
            .execute(&mut session, &candidate(), &meta())
            .await
            .unwrap_err();

        assert!(matches!(err, TradeError::EntryPlacementFailed { .. }));
        assert_eq!(session.trades_today, 0);
        assert!(session.trade_log.is_empty());
    }

    #[tokio::test]
    async fn test_unplannable_fill_price_is_rolled_back() {
        let mut client = MockExchangeClient::new();
        client.expect_change_leverage().returning(|_, _| Ok(()));
        client.expect_simulate_order().returning(|_| Ok(()));
        // mark before the entry, then a fill no bracket fits around
        let mut marks = vec![0.001, 100.0];
        client
            .expect_get_mark_price()
            .times(2)
            .returning(move |_| Ok(marks.pop().unwrap_or(0.001)));
        client
            .expect_place_order()
            .withf(|spec| spec.leg == OrderLeg::Entry)
            .times(1)
            .returning(|_| placed());
        client
            .expect_place_order()
            .withf(|spec| spec.leg == OrderLeg::Flatten && spec.quantity == Some(0.2))
            .times(1)
            .returning(|_| placed());
        client
            .expect_place_order()
            .withf(|spec| matches!(spec.leg, OrderLeg::StopLoss | OrderLeg::TakeProfit))
            .times(0);

        let mut session = SessionState::new(6);
        session.trades_today = 3;
        let err = service(client, quiet_notifier())
            .execute(&mut session, &candidate(), &meta())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TradeError::ProtectiveOrderFailed { leg: OrderLeg::StopLoss, flattened: true, .. }
        ));
        assert_eq!(session.trades_today, 3);
        assert!(session.trade_log.is_empty());
    }

    #[tokio::test]
    async fn test_existing_take_profit_counts_as_placed() {
        let mut client = ready_client(100.0);
        client.expect_simulate_order().returning(|_| Ok(()));
        client
            .expect_place_order()
            .withf(|spec| matches!(spec.leg, OrderLeg::Entry | OrderLeg::StopLoss))
            .times(2)
            .returning(|_| placed());
        client
            .expect_place_order()
            .withf(|spec| spec.leg == OrderLeg::TakeProfit)
            .times(1)
            .returning(|_| Err(rejected("Take profit order already exists.")));
        client
            .expect_place_order()
            .withf(|spec| spec.leg == OrderLeg::Flatten)
            .times(0);

        let mut session = SessionState::new(6);
        let record = service(client, quiet_notifier())
            .execute(&mut session, &candidate(), &meta())
            .await
            .unwrap();

        assert_eq!(record.take_profit_price, 102.5);
        assert_eq!(session.trades_today, 1);
        assert_eq!(session.trade_log.len(), 1);
    }

    #[tokio::test]
    async fn test_leverage_rejection_stops_before_simulation() {
        let mut client = MockExchangeClient::new();
        client
            .expect_change_leverage()
            .returning(|_, _| Err(rejected("Leverage 20 is not valid")));
        client.expect_simulate_order().times(0);
        client.expect_place_order().times(0);

        let mut session = SessionState::new(6);
        let err = service(client, MockNotifier::new())
            .execute(&mut session, &candidate(), &meta())
            .await
            .unwrap_err();

        assert!(matches!(err, TradeError::LeverageRejected { .. }));
    }
}
