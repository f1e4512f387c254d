//! CoinMarketCap quotes client.

use super::{FetchError, PriceFetcher, error_message};
use crate::models::{DataSource, Quote};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

const SOURCE_NAME: &str = "CoinMarketCap";

const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";

/// Fiat currency every quote is converted into.
const CONVERT: &str = "USD";

const ICON_URL: &str = "https://s2.coinmarketcap.com/static/img/coins/64x64";

/// CoinMarketCap REST client. One request covers every symbol.
pub struct CoinMarketCapClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CoinMarketCapClient {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Fetch quotes for `symbols`, in request order.
    pub async fn get_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, FetchError> {
        let url = format!("{}/v1/cryptocurrency/quotes/latest", self.base_url);
        tracing::debug!(url, count = symbols.len(), "requesting CoinMarketCap quotes");

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("symbol", symbols.join(",").as_str()),
                ("convert", CONVERT),
                ("skip_invalid", "true"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                source_name: SOURCE_NAME,
                status,
                message: error_message(&body),
            });
        }

        let mut data: CmcResponse = response.json().await?;

        if data.status.error_code != 0 {
            return Err(FetchError::Api {
                source_name: SOURCE_NAME,
                message: data
                    .status
                    .error_message
                    .unwrap_or_else(|| format!("error code {}", data.status.error_code)),
            });
        }

        let quotes = symbols
            .iter()
            .filter_map(|symbol| data.data.remove(symbol))
            .filter_map(CmcCoin::into_quote)
            .collect();

        Ok(quotes)
    }
}

#[async_trait]
impl PriceFetcher for CoinMarketCapClient {
    fn source(&self) -> DataSource {
        DataSource::CoinMarketCap
    }

    fn quote_suffix(&self) -> &'static str {
        ""
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> Vec<Quote> {
        match self.get_quotes(symbols).await {
            Ok(quotes) => quotes,
            Err(e) => {
                tracing::warn!(error = %e, "CoinMarketCap fetch failed");
                Vec::new()
            }
        }
    }
}

// CoinMarketCap API response structures

#[derive(Debug, Deserialize)]
struct CmcResponse {
    status: CmcStatus,
    #[serde(default)]
    data: HashMap<String, CmcCoin>,
}

#[derive(Debug, Deserialize)]
struct CmcStatus {
    #[serde(default)]
    error_code: i64,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CmcCoin {
    id: u64,
    name: String,
    symbol: String,
    #[serde(default)]
    quote: HashMap<String, CmcQuote>,
}

#[derive(Debug, Deserialize)]
struct CmcQuote {
    #[serde(default)]
    price: Option<Decimal>,
    #[serde(default)]
    percent_change_1h: Option<Decimal>,
    #[serde(default)]
    percent_change_24h: Option<Decimal>,
    #[serde(default)]
    percent_change_7d: Option<Decimal>,
    #[serde(default)]
    market_cap: Option<Decimal>,
}

impl CmcCoin {
    /// Coins without a USD price can't be shown and are dropped.
    fn into_quote(mut self) -> Option<Quote> {
        let quote = self.quote.remove(CONVERT)?;

        Some(Quote {
            icon_url: Some(format!("{}/{}.png", ICON_URL, self.id)),
            symbol: self.symbol,
            name: self.name,
            price: quote.price?,
            change_1h: quote.percent_change_1h,
            change_24h: quote.percent_change_24h,
            change_7d: quote.percent_change_7d,
            market_cap: quote.market_cap,
        })
    }
}
