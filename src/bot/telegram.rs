//! Minimal Telegram Bot API client.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_BASE: &str = "https://api.telegram.org";
/// Long-poll duration passed to `getUpdates`
pub const POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Api(String),
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Serialize)]
struct GetUpdates {
    offset: i64,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Serialize)]
struct CommandEntry<'a> {
    command: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct SetMyCommands<'a> {
    commands: Vec<CommandEntry<'a>>,
}

#[derive(Clone)]
pub struct TelegramApi {
    http: Client,
    bot_token: String,
}

impl TelegramApi {
    pub fn new(bot_token: String) -> Result<Self, TelegramError> {
        // Must outlive the long poll
        let http = Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .build()?;
        Ok(Self { http, bot_token })
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, TelegramError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/bot{}/{}", API_BASE, self.bot_token, method);
        let response: ApiResponse<T> = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        unwrap_response(response)
    }

    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: POLL_TIMEOUT_SECS,
                allowed_updates: ["message"],
            },
        )
        .await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let _: serde_json::Value = self
            .call("sendMessage", &SendMessage { chat_id, text })
            .await?;
        Ok(())
    }

    pub async fn set_my_commands(
        &self,
        commands: &[(&str, &str)],
    ) -> Result<(), TelegramError> {
        let commands = commands
            .iter()
            .map(|&(command, description)| CommandEntry {
                command,
                description,
            })
            .collect();
        let _: bool = self
            .call("setMyCommands", &SetMyCommands { commands })
            .await?;
        Ok(())
    }
}

fn unwrap_response<T>(response: ApiResponse<T>) -> Result<T, TelegramError> {
    match (response.ok, response.result) {
        (true, Some(result)) => Ok(result),
        _ => Err(TelegramError::Api(
            response
                .description
                .unwrap_or_else(|| "request failed".to_string()),
        )),
    }
}

/// Destination for outbound chat messages.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), TelegramError>;
}

/// Sends to the single configured chat.
#[derive(Clone)]
pub struct ChatSender {
    api: TelegramApi,
    chat_id: i64,
}

impl ChatSender {
    pub fn new(api: TelegramApi, chat_id: i64) -> Self {
        Self { api, chat_id }
    }
}

#[async_trait]
impl MessageSink for ChatSender {
    async fn send(&self, text: &str) -> Result<(), TelegramError> {
        self.api.send_message(self.chat_id, text).await
    }
}
