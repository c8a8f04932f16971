use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::data::extractor::SnapshotExtractor;
use crate::data::reader::ScrapeError;
use crate::data::types::MarketId;
use crate::reporting::format::format_report;
use crate::reporting::trend::compute_trend;
use crate::storage::baseline::BaselineStore;
use crate::storage::persistence::{push_trend, JsonFile, StoreError, TrendRecord};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error("failed to save baseline: {0}")]
    Store(#[from] StoreError),
}

pub struct TrendHistory {
    file: JsonFile<Vec<TrendRecord>>,
    max_entries: usize,
}

impl TrendHistory {
    pub fn new(file: JsonFile<Vec<TrendRecord>>, max_entries: usize) -> Self {
        Self { file, max_entries }
    }
}

/// Scrape, compare against the baseline, and render the chat message.
pub struct ReportService {
    extractor: SnapshotExtractor,
    baselines: Arc<dyn BaselineStore>,
    // Held across the whole scrape so baseline updates never interleave.
    history: Mutex<Option<TrendHistory>>,
}

impl ReportService {
    pub fn new(
        extractor: SnapshotExtractor,
        baselines: Arc<dyn BaselineStore>,
        history: Option<TrendHistory>,
    ) -> Self {
        Self {
            extractor,
            baselines,
            history: Mutex::new(history),
        }
    }

    pub async fn report(&self, market: MarketId) -> Result<String, ReportError> {
        self.report_at(market, Utc::now()).await
    }

    pub async fn report_at(
        &self,
        market: MarketId,
        now: DateTime<Utc>,
    ) -> Result<String, ReportError> {
        let mut history = self.history.lock().await;

        let snapshot = self.extractor.extract(market).await?;
        let trend = compute_trend(market, snapshot.total_volume, self.baselines.as_ref())?;

        info!(
            "Report for {}: total=${} ({})",
            market, snapshot.total_volume, trend
        );

        if let Some(history) = history.as_mut() {
            let record = TrendRecord {
                market,
                observed_at: now,
                total_volume: snapshot.total_volume,
                change_pct: trend.percent(),
            };
            let max_entries = history.max_entries;
            if let Err(e) = history
                .file
                .update(|records| push_trend(records, record, max_entries))
            {
                error!("Failed to append trend history: {}", e);
            }
        }

        Ok(format_report(market, &snapshot, trend, now))
    }

    #[cfg(test)]
    async fn history_len(&self) -> usize {
        self.history
            .lock()
            .await
            .as_ref()
            .map_or(0, |h| h.file.get().len())
    }
}
