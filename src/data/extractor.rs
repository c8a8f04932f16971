use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{ScraperConfig, Selectors};
use crate::data::reader::{PageReader, PageRequest, PageText, ScrapeError};
use crate::data::types::{MarketId, MarketSnapshot, Outcome, MAX_OUTCOMES};

// Per-row field order in the page request.
const NAME: usize = 0;
const PROBABILITY: usize = 1;
const YES: usize = 2;
const NO: usize = 3;
const CHANGE: usize = 4;
const VOLUME: usize = 5;
const TAG: usize = 6;

/// Reads a [`MarketSnapshot`] off a market's event page.
pub struct SnapshotExtractor {
    reader: Arc<dyn PageReader>,
    urls: HashMap<MarketId, String>,
    selectors: Selectors,
    navigation_timeout: Duration,
    settle_timeout: Duration,
    poll_interval: Duration,
}

impl SnapshotExtractor {
    pub fn new(
        reader: Arc<dyn PageReader>,
        urls: HashMap<MarketId, String>,
        selectors: Selectors,
        scraper: &ScraperConfig,
    ) -> Self {
        Self {
            reader,
            urls,
            selectors,
            navigation_timeout: Duration::from_secs(scraper.navigation_timeout_secs),
            settle_timeout: Duration::from_secs(scraper.settle_timeout_secs),
            poll_interval: Duration::from_millis(scraper.poll_interval_ms),
        }
    }

    pub fn url(&self, market: MarketId) -> &str {
        self.urls
            .get(&market)
            .map(String::as_str)
            .unwrap_or_else(|| market.default_url())
    }

    fn request(&self, market: MarketId) -> PageRequest {
        let s = &self.selectors;
        PageRequest {
            url: self.url(market).to_string(),
            rows: s.row.clone(),
            row_limit: MAX_OUTCOMES,
            fields: vec![
                s.name.clone(),
                s.probability.clone(),
                s.yes_price.clone(),
                s.no_price.clone(),
                s.change.clone(),
                s.volume.clone(),
                s.tag.clone(),
            ],
            labels: vec![s.total_volume.clone()],
            navigation_timeout: self.navigation_timeout,
            settle_timeout: self.settle_timeout,
            poll_interval: self.poll_interval,
        }
    }

    /// Load the market page and read its snapshot.
    ///
    /// Only page loading can fail; every individual field falls back to
    /// its default when missing or unparseable.
    pub async fn extract(&self, market: MarketId) -> Result<MarketSnapshot, ScrapeError> {
        let request = self.request(market);
        info!("Scraping {} from {}", market, request.url);

        let text = self.reader.read(&request).await?;
        let snapshot = snapshot_from_text(&text);

        debug!(
            "Scraped {}: total=${}, {} outcomes",
            market,
            snapshot.total_volume,
            snapshot.outcomes.len()
        );
        Ok(snapshot)
    }
}

/// Build a snapshot from raw page text, truncating to [`MAX_OUTCOMES`] rows.
pub fn snapshot_from_text(text: &PageText) -> MarketSnapshot {
    let total_volume = parse_volume(label(&text.labels, 0));

    let outcomes = text
        .rows
        .iter()
        .take(MAX_OUTCOMES)
        .map(|row| outcome_from_row(row))
        .collect();

    MarketSnapshot {
        total_volume,
        outcomes,
    }
}

fn outcome_from_row(row: &[Option<String>]) -> Outcome {
    Outcome {
        name: trimmed(label(row, NAME)).unwrap_or_default(),
        probability: parse_leading_int(label(row, PROBABILITY)),
        yes_price: parse_leading_int(label(row, YES)),
        no_price: parse_leading_int(label(row, NO)),
        change: trimmed(label(row, CHANGE)).unwrap_or_default(),
        volume: parse_volume(label(row, VOLUME)),
        tag: trimmed(label(row, TAG))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "None".to_string()),
    }
}

fn label(values: &[Option<String>], index: usize) -> Option<&str> {
    values.get(index).and_then(|v| v.as_deref())
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

/// Parse an integer prefix (`"45%"` -> 45, `"-3¢"` -> -3).
///
/// Anything without leading digits parses to 0.
pub fn parse_leading_int(value: Option<&str>) -> i64 {
    static LEADING: OnceLock<Regex> = OnceLock::new();
    let re = LEADING.get_or_init(|| Regex::new(r"^[+-]?\d+").expect("valid regex"));

    value
        .and_then(|v| re.find(v.trim_start()))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .unwrap_or(0)
}

/// Parse a volume label by dropping every non-digit (`"$1,234 Vol."` -> 1234).
pub fn parse_volume(value: Option<&str>) -> u64 {
    value
        .map(|v| v.chars().filter(char::is_ascii_digit).collect::<String>())
        .and_then(|digits| digits.parse::<u64>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedReader;

    fn row(values: [&str; 7]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    fn extractor(reader: Arc<ScriptedReader>) -> SnapshotExtractor {
        SnapshotExtractor::new(
            reader,
            HashMap::new(),
            Selectors::default(),
            &ScraperConfig::default(),
        )
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int(Some("45%")), 45);
        assert_eq!(parse_leading_int(Some("  12¢")), 12);
        assert_eq!(parse_leading_int(Some("-3")), -3);
        assert_eq!(parse_leading_int(Some("<1%")), 0);
        assert_eq!(parse_leading_int(Some("abc")), 0);
        assert_eq!(parse_leading_int(Some("")), 0);
        assert_eq!(parse_leading_int(None), 0);
        assert_eq!(parse_leading_int(Some("99999999999999999999999")), 0);
    }

    #[test]
    fn test_parse_volume() {
        assert_eq!(parse_volume(Some("$1,234,567 Vol.")), 1_234_567);
        assert_eq!(parse_volume(Some("$12k")), 12);
        assert_eq!(parse_volume(Some("n/a")), 0);
        assert_eq!(parse_volume(Some("")), 0);
        assert_eq!(parse_volume(None), 0);
    }

    #[test]
    fn test_snapshot_truncates_to_three_outcomes() {
        let text = PageText {
            rows: (0..5)
                .map(|i| row([&format!("{i}°C"), "10%", "10¢", "90¢", "", "$5", "x"]))
                .collect(),
            labels: vec![Some("$100 Vol.".to_string())],
        };

        let snapshot = snapshot_from_text(&text);
        assert_eq!(snapshot.outcomes.len(), 3);
        assert_eq!(snapshot.outcomes[2].name, "2°C");
        assert_eq!(snapshot.total_volume, 100);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let text = PageText {
            rows: vec![vec![Some(" 15°C ".to_string())], vec![]],
            labels: vec![],
        };

        let snapshot = snapshot_from_text(&text);
        assert_eq!(snapshot.total_volume, 0);
        assert_eq!(snapshot.outcomes[0].name, "15°C");
        assert_eq!(snapshot.outcomes[0].probability, 0);
        assert_eq!(snapshot.outcomes[0].tag, "None");
        assert_eq!(snapshot.outcomes[1], Outcome::default());
    }

    #[test]
    fn test_full_row() {
        let text = PageText {
            rows: vec![row(["16°C", "45%", "46¢", "55¢", " ▲3% ", "$12,000 Vol.", "Hot"])],
            labels: vec![Some("$1,100".to_string())],
        };

        let outcome = &snapshot_from_text(&text).outcomes[0];
        assert_eq!(outcome.probability, 45);
        assert_eq!(outcome.yes_price, 46);
        assert_eq!(outcome.no_price, 55);
        assert_eq!(outcome.change, "▲3%");
        assert_eq!(outcome.volume, 12_000);
        assert_eq!(outcome.tag, "Hot");
    }

    #[tokio::test]
    async fn test_extract_requests_market_url() {
        let reader = Arc::new(ScriptedReader::with_total("$2,500"));
        let snapshot = extractor(reader.clone())
            .extract(MarketId::Nyc)
            .await
            .unwrap();

        assert_eq!(snapshot.total_volume, 2_500);
        let requests = reader.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, MarketId::Nyc.default_url());
        assert_eq!(requests[0].row_limit, 3);
        assert_eq!(requests[0].fields.len(), 7);
    }

    #[tokio::test]
    async fn test_extract_propagates_scrape_error() {
        let reader = Arc::new(ScriptedReader::failing());
        let result = extractor(reader).extract(MarketId::London).await;

        assert!(matches!(result, Err(ScrapeError::Timeout(_))));
    }
}
