//! Ticker parsing, price lookup and search filtering.

use crate::api::PriceFetcher;
use crate::models::Quote;
use std::collections::HashSet;
use std::sync::Arc;

/// Looks up prices for a comma-separated ticker list through one fetcher.
#[derive(Clone)]
pub struct PricesCommand {
    fetcher: Arc<dyn PriceFetcher>,
}

impl PricesCommand {
    pub fn new(fetcher: Arc<dyn PriceFetcher>) -> Self {
        Self { fetcher }
    }

    /// The fetcher this command delegates to.
    pub fn fetcher(&self) -> &dyn PriceFetcher {
        self.fetcher.as_ref()
    }

    /// Fetch quotes for `ticker_csv`, in source order.
    ///
    /// A list with no usable tickers returns empty without touching the network.
    pub async fn get_prices(&self, ticker_csv: &str) -> Vec<Quote> {
        let symbols = parse_tickers(ticker_csv, self.fetcher.quote_suffix());
        if symbols.is_empty() {
            return Vec::new();
        }

        self.fetcher.fetch_quotes(&symbols).await
    }
}

/// Split a comma-separated ticker list into source symbols.
///
/// Entries are trimmed and uppercased, blanks dropped, `suffix` appended when
/// missing, and duplicates removed keeping the first occurrence.
pub fn parse_tickers(ticker_csv: &str, suffix: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    ticker_csv
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            let upper = t.to_uppercase();
            if upper.ends_with(suffix) {
                upper
            } else {
                format!("{}{}", upper, suffix)
            }
        })
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Quotes whose symbol or name contains `search`, case-insensitively.
/// Empty search text keeps everything.
pub fn filter_prices<'a>(quotes: &'a [Quote], search: &str) -> Vec<&'a Quote> {
    let search = search.trim();
    if search.is_empty() {
        return quotes.iter().collect();
    }

    quotes.iter().filter(|q| q.matches(search)).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::DataSource;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    /// Fetcher that records every call and answers from a fixed list.
    pub(crate) struct RecordingFetcher {
        pub calls: Mutex<Vec<Vec<String>>>,
        pub quotes: Vec<Quote>,
        pub suffix: &'static str,
    }

    impl RecordingFetcher {
        pub(crate) fn new(suffix: &'static str, quotes: Vec<Quote>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                quotes,
                suffix,
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PriceFetcher for RecordingFetcher {
        fn source(&self) -> DataSource {
            DataSource::Binance
        }

        fn quote_suffix(&self) -> &'static str {
            self.suffix
        }

        async fn fetch_quotes(&self, symbols: &[String]) -> Vec<Quote> {
            self.calls.lock().unwrap().push(symbols.to_vec());
            self.quotes
                .iter()
                .filter(|q| symbols.contains(&q.symbol))
                .cloned()
                .collect()
        }
    }

    fn sample_quotes() -> Vec<Quote> {
        vec![
            Quote::new("BTCUSDT", "BTC", dec!(67000)),
            Quote::new("ETHUSDT", "ETH", dec!(3100)),
            Quote::new("SOLUSDT", "SOL", dec!(150)),
        ]
    }

    #[test]
    fn test_parse_tickers_appends_suffix_once() {
        assert_eq!(
            parse_tickers("btc, ETHUSDT ,sol", "USDT"),
            vec!["BTCUSDT", "ETHUSDT", "SOLUSDT"]
        );
    }

    #[test]
    fn test_parse_tickers_dedupes_and_skips_blanks() {
        assert_eq!(
            parse_tickers("BTC,,btc, ,btcusdt,ETH,", "USDT"),
            vec!["BTCUSDT", "ETHUSDT"]
        );
    }

    #[test]
    fn test_parse_tickers_without_suffix() {
        assert_eq!(parse_tickers("btc,eth", ""), vec!["BTC", "ETH"]);
    }

    #[tokio::test]
    async fn test_get_prices_blank_input_skips_fetcher() {
        let fetcher = Arc::new(RecordingFetcher::new("USDT", sample_quotes()));
        let command = PricesCommand::new(fetcher.clone());

        for input in ["", "   ", " , ,"] {
            assert!(command.get_prices(input).await.is_empty());
        }
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_get_prices_delegates_normalized_symbols() {
        let fetcher = Arc::new(RecordingFetcher::new("USDT", sample_quotes()));
        let command = PricesCommand::new(fetcher.clone());

        let quotes = command.get_prices("sol,btc").await;

        assert_eq!(
            fetcher.calls.lock().unwrap().as_slice(),
            &[vec!["SOLUSDT".to_string(), "BTCUSDT".to_string()]]
        );
        // Order is whatever the source returned
        let symbols: Vec<&str> = quotes.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTCUSDT", "SOLUSDT"]);
    }

    #[tokio::test]
    async fn test_get_prices_empty_source_result_is_not_an_error() {
        let fetcher = Arc::new(RecordingFetcher::new("USDT", Vec::new()));
        let command = PricesCommand::new(fetcher.clone());

        assert!(command.get_prices("BTC,ETH").await.is_empty());
        assert_eq!(fetcher.call_count(), 1);
    }

    #[test]
    fn test_filter_prices_empty_search_returns_all() {
        let quotes = sample_quotes();
        let filtered = filter_prices(&quotes, "");
        assert_eq!(filtered, quotes.iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_filter_prices_case_insensitive() {
        let quotes = vec![
            Quote::new("BTC", "Bitcoin", dec!(67000)),
            Quote::new("ETH", "Ethereum", dec!(3100)),
        ];

        let filtered = filter_prices(&quotes, "bt");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].symbol, "BTC");

        let by_name = filter_prices(&quotes, "ETHER");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].symbol, "ETH");

        assert!(filter_prices(&quotes, "doge").is_empty());
    }
}
