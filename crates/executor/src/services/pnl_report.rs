use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use common::Notifier;
use common::models::IncomeEntry;
use market_data::ExchangeClient;
use tracing::{error, info, warn};

/// Previous calendar day in a fixed UTC offset, as millisecond bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub day: NaiveDate,
    pub start_ms: i64,
    pub end_ms: i64,
    pub offset: FixedOffset,
}

impl ReportWindow {
    pub fn yesterday(now: DateTime<Utc>, utc_offset_hours: i32) -> Option<Self> {
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600)?;
        let today = now.with_timezone(&offset).date_naive();
        let day = today.pred_opt()?;

        let midnight = |date: NaiveDate| {
            offset
                .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
                .single()
                .map(|dt| dt.timestamp_millis())
        };

        Some(Self {
            day,
            start_ms: midnight(day)?,
            end_ms: midnight(today)?,
            offset,
        })
    }

    fn local_time(&self, time_ms: i64, pattern: &str) -> String {
        DateTime::<Utc>::from_timestamp_millis(time_ms)
            .map(|t| t.with_timezone(&self.offset).format(pattern).to_string())
            .unwrap_or_else(|| time_ms.to_string())
    }
}

fn status(income: f64) -> &'static str {
    if income > 0.0 { "Profit" } else { "Loss" }
}

/// Telegram card for the non-zero rows of `entries`, plus their total.
pub fn render_report(window: &ReportWindow, entries: &[IncomeEntry]) -> (String, f64) {
    let mut lines = vec![format!("<b>📊 PNL - {}</b>", window.day)];
    let mut total = 0.0;

    for entry in entries.iter().filter(|e| e.income != 0.0) {
        total += entry.income;
        lines.push(format!(
            "[{}] <code>{}</code> | {}: <code>{:.2} USDT</code>",
            window.local_time(entry.time_ms, "%H:%M"),
            entry.symbol,
            status(entry.income),
            entry.income
        ));
    }

    lines.push(format!("\n<b>Total:</b> <code>{:.2} USDT</code>", total));
    (lines.join("\n"), total)
}

/// Logs and sends yesterday's realized PnL. Never fails the caller.
pub async fn report_yesterday_pnl(
    client: &dyn ExchangeClient,
    notifier: &dyn Notifier,
    utc_offset_hours: i32,
    now: DateTime<Utc>,
) -> Option<f64> {
    let Some(window) = ReportWindow::yesterday(now, utc_offset_hours) else {
        warn!("Cannot build PnL window for UTC offset {}", utc_offset_hours);
        return None;
    };

    let entries = match client.get_realized_pnl(window.start_ms, window.end_ms).await {
        Ok(entries) => entries,
        Err(e) => {
            error!("Failed to fetch realized PnL: {}", e);
            notifier
                .send(&format!("❌ Error fetching PnL data: {}", e.message()))
                .await;
            return None;
        }
    };

    if entries.is_empty() {
        info!("No Realized PnL records found for yesterday.");
        notifier
            .send("❌ No Realized PnL records found for yesterday.")
            .await;
        return Some(0.0);
    }

    info!("== YESTERDAY'S REALIZED PNL - {} ==", window.day);
    for entry in entries.iter().filter(|e| e.income != 0.0) {
        info!(
            "[{}] {} | {}: {:.2} USDT",
            window.local_time(entry.time_ms, "%Y-%m-%d %H:%M:%S"),
            entry.symbol,
            status(entry.income),
            entry.income
        );
    }

    let (message, total) = render_report(&window, &entries);
    info!("Total Realized PnL for Yesterday: {:.2} USDT", total);
    notifier.send(&message).await;
    Some(total)
}

/// Calendar date used in the startup message.
pub fn local_date(now: DateTime<Utc>, utc_offset_hours: i32) -> String {
    FixedOffset::east_opt(utc_offset_hours * 3600)
        .map(|offset| now.with_timezone(&offset).date_naive())
        .unwrap_or_else(|| now.date_naive())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ExchangeError;
    use common::notifier::MockNotifier;
    use market_data::MockExchangeClient;

    fn now() -> DateTime<Utc> {
        // 03:00 on 2024-03-11 in UTC+7
        Utc.with_ymd_and_hms(2024, 3, 10, 20, 0, 0).unwrap()
    }

    fn entry(symbol: &str, income: f64, time_ms: i64) -> IncomeEntry {
        IncomeEntry {
            symbol: symbol.to_string(),
            income,
            time_ms,
        }
    }

    #[test]
    fn test_window_covers_previous_local_day() {
        let window = ReportWindow::yesterday(now(), 7).unwrap();

        assert_eq!(window.day, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(
            window.start_ms,
            Utc.with_ymd_and_hms(2024, 3, 9, 17, 0, 0).unwrap().timestamp_millis()
        );
        assert_eq!(window.end_ms - window.start_ms, 24 * 3600 * 1000);
    }

    #[test]
    fn test_report_skips_zero_rows_and_totals() {
        let window = ReportWindow::yesterday(now(), 7).unwrap();
        // 2024-03-10 05:30 UTC = 12:30 UTC+7
        let t = Utc.with_ymd_and_hms(2024, 3, 10, 5, 30, 0).unwrap().timestamp_millis();
        let (message, total) = render_report(
            &window,
            &[entry("AAAUSDT", 1.5, t), entry("BBBUSDT", 0.0, t), entry("CCCUSDT", -0.25, t)],
        );

        assert!((total - 1.25).abs() < 1e-12);
        assert!(message.starts_with("<b>📊 PNL - 2024-03-10</b>"));
        assert!(message.contains("[12:30] <code>AAAUSDT</code> | Profit: <code>1.50 USDT</code>"));
        assert!(message.contains("<code>CCCUSDT</code> | Loss: <code>-0.25 USDT</code>"));
        assert!(!message.contains("BBBUSDT"));
        assert!(message.ends_with("<b>Total:</b> <code>1.25 USDT</code>"));
    }

    #[tokio::test]
    async fn test_fetch_error_is_reported_not_raised() {
        let mut client = MockExchangeClient::new();
        client
            .expect_get_realized_pnl()
            .times(1)
            .returning(|_, _| Err(ExchangeError::Http("connection reset".to_string())));
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .withf(|text| text.starts_with("❌ Error fetching PnL data"))
            .times(1)
            .returning(|_| ());

        assert_eq!(report_yesterday_pnl(&client, &notifier, 7, now()).await, None);
    }

    #[tokio::test]
    async fn test_empty_history_sends_notice() {
        let mut client = MockExchangeClient::new();
        client.expect_get_realized_pnl().returning(|_, _| Ok(vec![]));
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .withf(|text| text.contains("No Realized PnL records found"))
            .times(1)
            .returning(|_| ());

        assert_eq!(report_yesterday_pnl(&client, &notifier, 7, now()).await, Some(0.0));
    }

    #[test]
    fn test_local_date_uses_offset() {
        assert_eq!(local_date(now(), 7), "2024-03-11");
        assert_eq!(local_date(now(), 0), "2024-03-10");
    }
}
