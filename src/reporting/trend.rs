use std::fmt;
use tracing::debug;

use crate::data::types::MarketId;
use crate::storage::baseline::BaselineStore;
use crate::storage::persistence::StoreError;

/// Change in total volume relative to the previous check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trend {
    /// Percent change, rounded to one decimal
    Change(f64),
    /// Previous volume was zero and current is not
    Unavailable,
}

impl Trend {
    pub fn percent(&self) -> Option<f64> {
        match self {
            Trend::Change(pct) => Some(*pct),
            Trend::Unavailable => None,
        }
    }

    /// Text appended to the total-volume line
    pub fn narrative(&self) -> String {
        format!("{} vs last check", self)
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Change(pct) => write!(f, "{:+.1}%", pct),
            Trend::Unavailable => f.write_str("n/a"),
        }
    }
}

/// `(current - previous) / previous * 100`, rounded to one decimal.
pub fn percent_change(previous: u64, current: u64) -> Trend {
    if previous == 0 {
        return if current == 0 {
            Trend::Change(0.0)
        } else {
            Trend::Unavailable
        };
    }

    let raw = (current as f64 - previous as f64) / previous as f64 * 100.0;
    let rounded = (raw * 10.0).round() / 10.0;
    // -0.0 would print as "-0.0%"
    Trend::Change(if rounded == 0.0 { 0.0 } else { rounded })
}

/// Compare `current` against the stored baseline and replace the baseline.
///
/// With no stored baseline the change is 0%.
pub fn compute_trend(
    market: MarketId,
    current: u64,
    store: &dyn BaselineStore,
) -> Result<Trend, StoreError> {
    let previous = store.get(market).unwrap_or(current);
    let trend = percent_change(previous, current);

    store.set(market, current)?;
    debug!(
        "Volume trend for {}: {} -> {} ({})",
        market, previous, current, trend
    );

    Ok(trend)
}
