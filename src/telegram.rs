// src/telegram.rs

//! Telegram Bot API client — long polling and message sending.

use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};

/// Minimal Bot API client for one bot token.
///
/// Owns its own HTTP client: long polling holds requests open for up to
/// 30s, which rules out sharing a client configured with a short
/// per-request timeout.
pub struct TelegramBot {
    token: String,
    client: Client,
}

impl TelegramBot {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.token, method)
    }

    /// Get the bot's own identity.
    pub async fn get_me(&self) -> Result<User> {
        let response = self.client.get(self.api_url("getMe")).send().await?;
        let body: ApiResponse<User> = response.json().await?;
        body.into_result()
    }

    /// Fetch updates at or past `offset` using long polling.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let response = self
            .client
            .get(self.api_url("getUpdates"))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", "30".into()),
                ("allowed_updates", "[\"message\"]".into()),
            ])
            .send()
            .await?;
        let body: ApiResponse<Vec<Update>> = response.json().await?;
        body.into_result()
    }

    /// Send a plain-text message to a chat.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await?;
        let result: ApiResponse<serde_json::Value> = response.json().await?;
        result.into_result().map(|_| ())
    }
}

// --- Bot API types ---

/// Standard Bot API response envelope.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T> {
        if !self.ok {
            return Err(AppError::telegram(
                self.description
                    .unwrap_or_else(|| "unknown API error".into()),
            ));
        }
        self.result
            .ok_or_else(|| AppError::telegram("response carried no result"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

impl Update {
    /// The chat id and text of a human-sent text message, if this update
    /// carries one. Bot-sent and non-text messages yield `None`.
    pub fn user_text(&self) -> Option<(i64, &str)> {
        let message = self.message.as_ref()?;
        let text = message.text.as_deref()?;
        if message.from.as_ref().is_some_and(|u| u.is_bot) {
            return None;
        }
        Some((message.chat.id, text))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub date: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const UPDATE_JSON: &str = r#"{
        "update_id": 10001,
        "message": {
            "message_id": 55,
            "from": {"id": 7, "is_bot": false, "first_name": "Ann", "username": "ann"},
            "chat": {"id": -100200300, "type": "group", "title": "Grants"},
            "text": "status?",
            "date": 1700000000
        }
    }"#;

    #[test]
    fn test_update_deserializes() {
        let update: Update = serde_json::from_str(UPDATE_JSON).unwrap();
        assert_eq!(update.update_id, 10001);
        assert_eq!(update.user_text(), Some((-100200300, "status?")));
    }

    #[test]
    fn test_bot_messages_are_ignored() {
        let mut update: Update = serde_json::from_str(UPDATE_JSON).unwrap();
        update.message.as_mut().unwrap().from.as_mut().unwrap().is_bot = true;
        assert_eq!(update.user_text(), None);
    }

    #[test]
    fn test_non_text_update_is_ignored() {
        let mut update: Update = serde_json::from_str(UPDATE_JSON).unwrap();
        update.message.as_mut().unwrap().text = None;
        assert_eq!(update.user_text(), None);
    }

    #[test]
    fn test_error_envelope_surfaces_description() {
        let body = r#"{"ok": false, "description": "Unauthorized"}"#;
        let response: ApiResponse<Vec<Update>> = serde_json::from_str(body).unwrap();
        let err = response.into_result().unwrap_err();
        assert!(err.to_string().contains("Unauthorized"));
    }
}
