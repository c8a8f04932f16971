mod bot;
mod config;
mod data;
mod monitoring;
mod reporting;
mod storage;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use bot::command::bot_commands;
use bot::handler::CommandHandler;
use bot::telegram::{ChatSender, TelegramApi};
use config::{Config, EnvConfig};
use data::browser::ChromeReader;
use data::extractor::SnapshotExtractor;
use reporting::service::{ReportService, TrendHistory};
use storage::baseline::JsonBaselineStore;
use storage::persistence::{JsonFile, TrackingState, TRACKING_FILE, TRENDS_FILE, VOLUME_FILE};

#[tokio::main]
async fn main() -> Result<()> {
    let env_config = EnvConfig::load().context("Add BOT_TOKEN and CHAT_ID to the environment")?;
    let loaded = Config::load_optional(&env_config.config_path)?;
    let found_config = loaded.is_some();
    let config = loaded.unwrap_or_default();

    monitoring::logger::init(&config.monitoring);

    tracing::info!("🌡️ Celsius Watch starting...");
    if !found_config {
        tracing::info!(
            "No config file at {}, using defaults",
            env_config.config_path.display()
        );
    }

    // Persisted state
    let data_dir = &config.system.data_dir;
    tracing::info!("Data directory: {}", data_dir.display());
    let baselines = Arc::new(JsonBaselineStore::open(data_dir.join(VOLUME_FILE))?);
    let tracking = Arc::new(Mutex::new(JsonFile::open(
        data_dir.join(TRACKING_FILE),
        TrackingState::default(),
    )?));
    let history = TrendHistory::new(
        JsonFile::open(data_dir.join(TRENDS_FILE), Vec::new())?,
        config.history.max_entries,
    );

    // Scraping pipeline
    let reader = Arc::new(ChromeReader::new(
        config.scraper.headless,
        config.scraper.chrome_executable.clone(),
    ));
    let extractor = SnapshotExtractor::new(
        reader,
        config.markets.urls(),
        config.selectors.clone(),
        &config.scraper,
    );
    let service = Arc::new(ReportService::new(extractor, baselines, Some(history)));

    // Telegram
    let api = TelegramApi::new(env_config.bot_token.clone())?;
    if let Err(e) = api.set_my_commands(&bot_commands()).await {
        tracing::warn!("Failed to register bot commands: {}", e);
    }

    let tracker_interval = config
        .tracking
        .enabled
        .then(|| Duration::from_secs(config.tracking.interval_secs.max(60)));

    if let Some(every) = tracker_interval {
        let sink = Arc::new(ChatSender::new(api.clone(), env_config.chat_id));
        tokio::spawn(bot::tracker::run(
            service.clone(),
            tracking.clone(),
            sink,
            every,
        ));
    } else {
        tracing::info!("Periodic tracking disabled");
    }

    let handler = CommandHandler::new(service, tracking, tracker_interval);

    tracing::info!("✅ Bot started, chat {}", env_config.chat_id);

    tokio::select! {
        _ = bot::handler::listen(api, env_config.chat_id, handler) => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Shutting down...");
        }
    }

    Ok(())
}
