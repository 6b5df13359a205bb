// src/pipeline/respond.rs

//! Liveness responder for inbound messages.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::telegram::TelegramBot;

/// Fixed reply sent for any inbound user message.
pub const LIVENESS_REPLY: &str = "Bot is active.";

/// Answer every inbound user message with the liveness reply.
///
/// Long-polls the Bot API until `shutdown` flips. Stateless apart from the
/// update offset; never touches the measure store.
pub async fn run_responder(bot: Arc<TelegramBot>, mut shutdown: watch::Receiver<bool>) {
    let mut offset = 0i64;

    loop {
        let updates = tokio::select! {
            result = bot.get_updates(offset) => result,
            _ = shutdown.changed() => {
                log::info!("Responder stopping");
                return;
            }
        };

        match updates {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    let Some((chat_id, text)) = update.user_text() else {
                        continue;
                    };
                    log::debug!("Inbound message from chat {chat_id}: {text}");
                    if let Err(e) = bot.send_message(chat_id, LIVENESS_REPLY).await {
                        log::warn!("Failed to answer chat {chat_id}: {e}");
                    }
                }
            }
            Err(e) => {
                log::warn!("getUpdates failed: {e}");
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(5)) => {}
                    _ = shutdown.changed() => {
                        log::info!("Responder stopping");
                        return;
                    }
                }
            }
        }
    }
}
