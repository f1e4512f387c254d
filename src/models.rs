//! Data models for cryptocurrency quotes.

use crate::format::slugify;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Base URL of the market-data pages linked from the detail pane.
const MARKET_PAGE_URL: &str = "https://coinmarketcap.com/currencies";

/// A single cryptocurrency's price and derived statistics at fetch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Ticker symbol as the source knows it (e.g., "BTCUSDT", "BTC")
    pub symbol: String,
    /// Display name
    pub name: String,
    /// Current price in the quote currency
    pub price: Decimal,
    /// Percent change over the last hour
    pub change_1h: Option<Decimal>,
    /// Percent change over the last 24 hours
    pub change_24h: Option<Decimal>,
    /// Percent change over the last 7 days
    pub change_7d: Option<Decimal>,
    /// Market capitalization
    pub market_cap: Option<Decimal>,
    /// Icon image URL
    pub icon_url: Option<String>,
}

impl Quote {
    /// Create a quote with only a symbol, name and price.
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            price,
            change_1h: None,
            change_24h: None,
            change_7d: None,
            market_cap: None,
            icon_url: None,
        }
    }

    /// Link to the market-data page for this asset, keyed by its slugified name.
    pub fn market_page_url(&self) -> String {
        format!("{}/{}/", MARKET_PAGE_URL, slugify(&self.name))
    }

    /// Case-insensitive substring match against symbol or name.
    pub fn matches(&self, search: &str) -> bool {
        let needle = search.to_lowercase();
        self.symbol.to_lowercase().contains(&needle) || self.name.to_lowercase().contains(&needle)
    }
}

/// Remote data source selectable through preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Binance spot ticker API
    #[default]
    Binance,
    /// CoinMarketCap aggregator API (requires an API key)
    CoinMarketCap,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Binance => write!(f, "Binance"),
            DataSource::CoinMarketCap => write!(f, "CoinMarketCap"),
        }
    }
}

/// Phase of the refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPhase {
    Loading,
    #[default]
    Idle,
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Non-blocking, dismissible notification shown over the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Popup title for this notice.
    pub fn title(&self) -> &'static str {
        match self.level {
            NoticeLevel::Info => " Info ",
            NoticeLevel::Warning => " Warning ",
            NoticeLevel::Error => " Error ",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_market_page_url_uses_slug() {
        let quote = Quote::new("SHIBUSDT", "Shiba Inu", dec!(0.00001));
        assert_eq!(
            quote.market_page_url(),
            "https://coinmarketcap.com/currencies/shiba-inu/"
        );
    }

    #[test]
    fn test_matches_symbol_or_name() {
        let quote = Quote::new("BTC", "Bitcoin", dec!(67000));
        assert!(quote.matches("bt"));
        assert!(quote.matches("COIN"));
        assert!(!quote.matches("eth"));
    }

    #[test]
    fn test_data_source_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            provider: DataSource,
        }

        let parsed: Wrapper = toml::from_str("provider = \"coinmarketcap\"").unwrap();
        assert_eq!(parsed.provider, DataSource::CoinMarketCap);
    }
}
