// src/services/notifier.rs

//! Announcement delivery.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Measure;
use crate::telegram::TelegramBot;

/// Destination for one-time measure announcements.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announce a newly seen measure. No internal retry; failures are
    /// the caller's to handle.
    async fn notify(&self, measure: &Measure) -> Result<()>;
}

/// Sends announcements to one fixed Telegram chat.
pub struct TelegramNotifier {
    bot: Arc<TelegramBot>,
    chat_id: i64,
}

impl TelegramNotifier {
    pub fn new(bot: Arc<TelegramBot>, chat_id: i64) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, measure: &Measure) -> Result<()> {
        self.bot
            .send_message(self.chat_id, &measure.announcement())
            .await?;
        log::info!("Announced new measure: {}", measure.url);
        Ok(())
    }
}
