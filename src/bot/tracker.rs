use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::bot::handler::SharedTracking;
use crate::bot::telegram::MessageSink;
use crate::reporting::service::ReportService;

/// Report every tracked market once, in a fixed order.
///
/// Returns how many reports were delivered.
pub async fn run_once(
    service: &ReportService,
    tracking: &SharedTracking,
    sink: &dyn MessageSink,
    now: DateTime<Utc>,
) -> usize {
    let markets = tracking.lock().await.get().tracked();
    let mut delivered = 0;

    for market in markets {
        let text = match service.report_at(market, now).await {
            Ok(report) => report,
            Err(e) => {
                warn!("Tracked report for {} failed: {}", market, e);
                format!("Error: {}", e)
            }
        };

        match sink.send(&text).await {
            Ok(()) => delivered += 1,
            Err(e) => {
                error!("Failed to deliver tracked report for {}: {}", market, e);
                continue;
            }
        }

        if let Err(e) = tracking
            .lock()
            .await
            .update(|state| state.mark_reported(market, now))
        {
            error!("Failed to save tracking state: {}", e);
        }
    }

    delivered
}

/// Periodic reporter for markets switched on with `/track`.
pub async fn run(
    service: Arc<ReportService>,
    tracking: SharedTracking,
    sink: Arc<dyn MessageSink>,
    every: Duration,
) {
    info!("Tracker started, interval {:?}", every);

    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let delivered = run_once(&service, &tracking, sink.as_ref(), Utc::now()).await;
        if delivered > 0 {
            info!("Tracker delivered {} report(s)", delivered);
        }
    }
}
