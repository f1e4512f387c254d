//! Binance spot ticker client.
//!
//! Binance has no batched endpoint that tolerates unknown symbols, so each
//! symbol gets its own requests, run concurrently.

use super::{FetchError, PriceFetcher, error_message};
use crate::models::{DataSource, Quote};
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

const SOURCE_NAME: &str = "Binance";

/// Binance pairs are quoted in Tether.
const QUOTE_SUFFIX: &str = "USDT";

/// Binance REST client.
pub struct BinanceClient {
    client: Client,
    base_url: String,
}

impl BinanceClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch one symbol.
    ///
    /// The 24h ticker is required; the 1h and 7d rolling windows are optional
    /// and leave their change field empty when they fail.
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote, FetchError> {
        let day_url = format!(
            "{}/api/v3/ticker/24hr?symbol={}",
            self.base_url,
            urlencoding::encode(symbol)
        );

        let (day, hour, week) = tokio::join!(
            self.get_ticker(&day_url),
            self.get_window(symbol, "1h"),
            self.get_window(symbol, "7d"),
        );
        let day = day?;

        let name = symbol
            .strip_suffix(QUOTE_SUFFIX)
            .filter(|base| !base.is_empty())
            .unwrap_or(symbol);

        let mut quote = Quote::new(day.symbol, name, day.last_price);
        quote.change_1h = hour.ok().map(|t| t.price_change_percent);
        quote.change_24h = Some(day.price_change_percent);
        quote.change_7d = week.ok().map(|t| t.price_change_percent);
        Ok(quote)
    }

    async fn get_window(&self, symbol: &str, window: &str) -> Result<BinanceTicker, FetchError> {
        let url = format!(
            "{}/api/v3/ticker?symbol={}&windowSize={}",
            self.base_url,
            urlencoding::encode(symbol),
            window
        );

        let result = self.get_ticker(&url).await;
        if let Err(ref e) = result {
            tracing::debug!(symbol, window, error = %e, "rolling window ticker unavailable");
        }
        result
    }

    async fn get_ticker(&self, url: &str) -> Result<BinanceTicker, FetchError> {
        tracing::debug!(url, "requesting Binance ticker");

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                source_name: SOURCE_NAME,
                status,
                message: error_message(&body),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl PriceFetcher for BinanceClient {
    fn source(&self) -> DataSource {
        DataSource::Binance
    }

    fn quote_suffix(&self) -> &'static str {
        QUOTE_SUFFIX
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> Vec<Quote> {
        let results = join_all(symbols.iter().map(|s| self.get_quote(s))).await;

        symbols
            .iter()
            .zip(results)
            .filter_map(|(symbol, result)| match result {
                Ok(quote) => Some(quote),
                Err(e) => {
                    tracing::warn!(symbol = %symbol, error = %e, "dropping unresolved symbol");
                    None
                }
            })
            .collect()
    }
}

// Binance API response structures

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceTicker {
    symbol: String,
    price_change_percent: Decimal,
    last_price: Decimal,
}
