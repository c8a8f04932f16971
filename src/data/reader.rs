use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// What to read from a rendered page.
///
/// `rows` selects the repeated container elements, `fields` are resolved
/// relative to each row, and `labels` are resolved against the whole document.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub url: String,
    pub rows: String,
    pub row_limit: usize,
    pub fields: Vec<String>,
    pub labels: Vec<String>,
    /// Bound on page load
    pub navigation_timeout: Duration,
    /// How long to wait for `rows` to appear before reading anyway
    pub settle_timeout: Duration,
    pub poll_interval: Duration,
}

/// Inner text captured from a page, `None` where a selector matched nothing.
///
/// `rows[i][j]` is field `j` of row `i`; `labels[k]` is label `k`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageText {
    #[serde(default)]
    pub rows: Vec<Vec<Option<String>>>,
    #[serde(default)]
    pub labels: Vec<Option<String>>,
}

/// Renders a page and reads text out of it.
#[async_trait]
pub trait PageReader: Send + Sync {
    async fn read(&self, request: &PageRequest) -> Result<PageText, ScrapeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("failed to load {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("timed out after {0:?} loading page")]
    Timeout(Duration),

    #[error("page script failed: {0}")]
    Script(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_error_messages() {
        let err = ScrapeError::Navigation {
            url: "https://polymarket.com/event/x".to_string(),
            reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to load https://polymarket.com/event/x: net::ERR_NAME_NOT_RESOLVED"
        );
        assert_eq!(
            ScrapeError::Timeout(Duration::from_secs(30)).to_string(),
            "timed out after 30s loading page"
        );
        assert_eq!(
            ScrapeError::Script("bad json".to_string()).to_string(),
            "page script failed: bad json"
        );
    }
}
