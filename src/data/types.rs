use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of outcome rows kept from a market page.
pub const MAX_OUTCOMES: usize = 3;

/// Weather markets the bot knows how to scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketId {
    London,
    Nyc,
}

impl MarketId {
    pub const ALL: [MarketId; 2] = [MarketId::London, MarketId::Nyc];

    /// Key used in persisted state and in chat commands
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketId::London => "london",
            MarketId::Nyc => "nyc",
        }
    }

    /// Default event page for this market
    pub fn default_url(&self) -> &'static str {
        match self {
            MarketId::London => {
                "https://polymarket.com/event/highest-temperature-in-london-on-october-27"
            }
            MarketId::Nyc => {
                "https://polymarket.com/event/highest-temperature-in-new-york-city-on-october-27"
            }
        }
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown market `{0}`")]
pub struct UnknownMarket(pub String);

impl FromStr for MarketId {
    type Err = UnknownMarket;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "london" => Ok(MarketId::London),
            "nyc" => Ok(MarketId::Nyc),
            other => Err(UnknownMarket(other.to_string())),
        }
    }
}

/// One possible resolution of a market as shown on its page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub name: String,
    /// Implied probability in whole percent
    pub probability: i64,
    /// Yes price in cents
    pub yes_price: i64,
    /// No price in cents
    pub no_price: i64,
    /// Price change label, verbatim
    pub change: String,
    pub volume: u64,
    pub tag: String,
}

impl Default for Outcome {
    fn default() -> Self {
        Self {
            name: String::new(),
            probability: 0,
            yes_price: 0,
            no_price: 0,
            change: String::new(),
            volume: 0,
            tag: "None".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub total_volume: u64,
    pub outcomes: Vec<Outcome>,
}
