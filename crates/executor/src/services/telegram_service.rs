use std::sync::Arc;

use async_trait::async_trait;
use common::Notifier;
use common::config::{Config, TelegramConfig};
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{error, info};

pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            bot: Bot::new(&config.token),
            chat_id: ChatId(config.chat_id),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) {
        // Send message and log error if it fails, but don't crash
        if let Err(e) = self
            .bot
            .send_message(self.chat_id, text)
            .parse_mode(ParseMode::Html)
            .await
        {
            error!("Failed to send Telegram message: {}", e);
        }
    }
}

/// Stand-in when no bot token is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) {
        info!(target: "notifier", "{}", text);
    }
}

pub fn notifier_from_config(config: &Config) -> Arc<dyn Notifier> {
    match &config.telegram {
        Some(telegram) => {
            info!("Starting Telegram Notification Service");
            Arc::new(TelegramNotifier::new(telegram))
        }
        None => {
            info!("Telegram not configured, notifications go to the log only");
            Arc::new(LogNotifier)
        }
    }
}
