use dotenvy::dotenv;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use chrono::Utc;
use common::config::Config;
use common::{Notifier, logger};
use market_data::services::Screener;
use market_data::{BinanceClient, ExchangeClient};

use crate::services::pnl_report::{local_date, report_yesterday_pnl};
use crate::services::session::{Session, SessionState, send_final_summary};
use crate::services::telegram_service::notifier_from_config;

mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logger::setup_logger();
    debug!("System starting up...");

    let config = Config::from_env()?;
    info!(
        "Starting bot against {} ({})",
        config.base_url,
        if config.testnet { "testnet" } else { "live" }
    );

    let client: Arc<dyn ExchangeClient> = Arc::new(BinanceClient::new(&config)?);
    let notifier = notifier_from_config(&config);

    report_yesterday_pnl(
        client.as_ref(),
        notifier.as_ref(),
        config.report_utc_offset_hours,
        Utc::now(),
    )
    .await;

    let today = local_date(Utc::now(), config.report_utc_offset_hours);
    notifier
        .send(&format!("Bot started on {today}. Monitoring market..."))
        .await;
    info!("Bot initialized successfully on {}. Monitoring market...", today);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Ctrl-C received, stopping after the current step");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => error!("Cannot listen for Ctrl-C, running until the daily cap: {}", e),
        }
    });

    let mut state = SessionState::new(config.max_trades_per_day);
    let outcome = run_session(&config, client, notifier.clone(), &mut state, shutdown_rx).await;
    if let Err(e) = &outcome {
        error!("[FATAL] {}", e);
    }

    info!("Bot execution completed.");
    send_final_summary(notifier.as_ref(), &state).await;
    outcome
}

async fn run_session(
    config: &Config,
    client: Arc<dyn ExchangeClient>,
    notifier: Arc<dyn Notifier>,
    state: &mut SessionState,
    shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let screener = Screener::default();
    let catalog = screener.catalog(client.list_instruments().await?);
    info!("{} tradeable instruments", catalog.instruments().count());

    let mut session = Session::new(client, notifier, screener, catalog, config);
    session.run(state, shutdown).await?;
    Ok(())
}
