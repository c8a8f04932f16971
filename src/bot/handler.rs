use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::bot::command::{command_help, parse_command, BotCommand, CommandError};
use crate::bot::telegram::{TelegramApi, Update};
use crate::data::types::MarketId;
use crate::reporting::format::header;
use crate::reporting::service::ReportService;
use crate::storage::persistence::{JsonFile, TrackingState};

pub type SharedTracking = Arc<Mutex<JsonFile<TrackingState>>>;

/// Turns chat commands into reply text.
#[derive(Clone)]
pub struct CommandHandler {
    service: Arc<ReportService>,
    tracking: SharedTracking,
    tracker_interval: Option<Duration>,
}

impl CommandHandler {
    /// `tracker_interval` is `None` when periodic reports are switched off.
    pub fn new(
        service: Arc<ReportService>,
        tracking: SharedTracking,
        tracker_interval: Option<Duration>,
    ) -> Self {
        Self {
            service,
            tracking,
            tracker_interval,
        }
    }

    /// Reply for `text`, or `None` for messages that are not commands.
    pub async fn respond(&self, text: &str, now: DateTime<Utc>) -> Option<String> {
        let command = match parse_command(text) {
            Ok(command) => command,
            Err(CommandError::NotACommand) => return None,
            Err(e) => {
                info!("Rejected command `{}`: {}", text, e);
                return Some(e.to_string());
            }
        };

        info!("Received command: {:?}", command);

        let reply = match command {
            BotCommand::Start => format!("{}: Use /current london", header(now)),
            BotCommand::Help => command_help().to_string(),
            BotCommand::Current(market) => match self.service.report_at(market, now).await {
                Ok(report) => report,
                Err(e) => {
                    warn!("Report for {} failed: {}", market, e);
                    format!("Error: {}", e)
                }
            },
            BotCommand::Track(market) => self.set_tracked(market, true).await,
            BotCommand::Untrack(market) => self.set_tracked(market, false).await,
        };
        Some(reply)
    }

    async fn set_tracked(&self, market: MarketId, tracked: bool) -> String {
        let name = market.as_str().to_uppercase();
        let changed = match self
            .tracking
            .lock()
            .await
            .update(|state| state.set_tracked(market, tracked))
        {
            Ok(changed) => changed,
            Err(e) => {
                error!("Failed to save tracking state: {}", e);
                return format!("Error: {}", e);
            }
        };

        match (tracked, changed) {
            (true, true) => match self.tracker_interval {
                Some(every) => format!("✅ Tracking {} every {} min", name, every.as_secs() / 60),
                None => format!("✅ Tracking {} (periodic reports are disabled in config)", name),
            },
            (true, false) => format!("{} is already tracked", name),
            (false, true) => format!("⏹ Stopped tracking {}", name),
            (false, false) => format!("{} was not tracked", name),
        }
    }
}

/// Text of `update` if it is a message from `allowed_chat`.
fn message_text(update: &Update, allowed_chat: i64) -> Option<&str> {
    let message = update.message.as_ref()?;
    if message.chat.id != allowed_chat {
        warn!("Ignoring message from chat {}", message.chat.id);
        return None;
    }
    message.text.as_deref()
}

/// Long-poll for updates and answer commands one at a time.
pub async fn listen(api: TelegramApi, chat_id: i64, handler: CommandHandler) {
    info!("Telegram command listener started for chat {}", chat_id);
    let mut offset = 0;

    loop {
        let updates = match api.get_updates(offset).await {
            Ok(updates) => updates,
            Err(e) => {
                error!("Failed to poll Telegram updates: {}", e);
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some(text) = message_text(&update, chat_id) else {
                continue;
            };
            if let Some(reply) = handler.respond(text, Utc::now()).await {
                if let Err(e) = api.send_message(chat_id, &reply).await {
                    error!("Failed to send Telegram reply: {}", e);
                }
            }
        }
    }
}
