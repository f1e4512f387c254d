//! Price fetchers for the supported data sources.
//!
//! Every source maps its own JSON shape onto [`Quote`]. Failures never escape a
//! fetcher: they are logged and turned into an empty (or shorter) result list,
//! and the caller decides what zero quotes means.

mod binance;
mod coinmarketcap;

pub use binance::BinanceClient;
pub use coinmarketcap::CoinMarketCapClient;

use crate::models::{DataSource, Quote};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default Binance REST endpoint.
pub const DEFAULT_BINANCE_URL: &str = "https://api.binance.com";

/// Default CoinMarketCap REST endpoint.
pub const DEFAULT_COINMARKETCAP_URL: &str = "https://pro-api.coinmarketcap.com";

const USER_AGENT: &str = concat!("coinwatch/", env!("CARGO_PKG_VERSION"));

/// Errors raised inside a fetcher before they are swallowed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{source_name} returned HTTP {status}: {message}")]
    Status {
        source_name: &'static str,
        status: StatusCode,
        message: String,
    },

    #[error("{source_name} API error: {message}")]
    Api {
        source_name: &'static str,
        message: String,
    },
}

/// A data-source-specific adapter producing quotes from an upstream API.
#[async_trait]
pub trait PriceFetcher: Send + Sync {
    /// Which source this fetcher talks to.
    fn source(&self) -> DataSource;

    /// Quote-currency suffix the source expects on every symbol ("" for none).
    fn quote_suffix(&self) -> &'static str;

    /// Fetch quotes for `symbols`, omitting any the source cannot resolve.
    async fn fetch_quotes(&self, symbols: &[String]) -> Vec<Quote>;
}

/// Base URLs of the upstream APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub binance: String,
    pub coinmarketcap: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            binance: DEFAULT_BINANCE_URL.to_string(),
            coinmarketcap: DEFAULT_COINMARKETCAP_URL.to_string(),
        }
    }
}

/// Result of choosing a fetcher for one refresh cycle.
pub struct Selection {
    pub fetcher: Arc<dyn PriceFetcher>,
    /// Set when the requested source could not be used
    pub warning: Option<String>,
}

/// Maps preferences onto a concrete fetcher.
///
/// Holds a single HTTP client shared by every fetcher it hands out.
#[derive(Clone)]
pub struct SourceSelector {
    client: Client,
    endpoints: Endpoints,
}

impl SourceSelector {
    /// Create a selector whose requests time out after `timeout_secs`.
    pub fn new(timeout_secs: u64, endpoints: Endpoints) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, endpoints })
    }

    /// Pick the fetcher for `source`.
    ///
    /// CoinMarketCap without a usable key falls back to Binance and reports a
    /// warning. Called at the start of every cycle, so a fixed key is picked
    /// up on the next refresh.
    pub fn select(&self, source: DataSource, api_key: Option<&str>) -> Selection {
        match source {
            DataSource::Binance => Selection {
                fetcher: Arc::new(self.binance()),
                warning: None,
            },
            DataSource::CoinMarketCap => match api_key.map(str::trim) {
                Some(key) if is_valid_api_key(key) => Selection {
                    fetcher: Arc::new(CoinMarketCapClient::new(
                        self.client.clone(),
                        &self.endpoints.coinmarketcap,
                        key,
                    )),
                    warning: None,
                },
                _ => {
                    tracing::warn!("CoinMarketCap API key missing or invalid, using Binance");
                    Selection {
                        fetcher: Arc::new(self.binance()),
                        warning: Some(
                            "CoinMarketCap API key is missing or invalid; showing Binance prices"
                                .to_string(),
                        ),
                    }
                }
            },
        }
    }

    fn binance(&self) -> BinanceClient {
        BinanceClient::new(self.client.clone(), &self.endpoints.binance)
    }
}

/// Keys are opaque, but always non-empty ASCII alphanumerics and dashes.
fn is_valid_api_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Pull a human-readable message out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("msg")
                .or_else(|| v.pointer("/status/error_message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
