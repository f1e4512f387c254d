//! Configuration file handling with TOML support.

use crate::api::{DEFAULT_BINANCE_URL, DEFAULT_COINMARKETCAP_URL, Endpoints};
use crate::cli::Args;
use crate::models::DataSource;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Shortest refresh interval accepted, in seconds.
const MIN_REFRESH_INTERVAL: f64 = 1.0;

/// Upper bound on the refresh interval, one day.
const MAX_REFRESH_INTERVAL: f64 = 86_400.0;

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Data source selection
    #[serde(default)]
    pub source: SourceConfig,

    /// Watchlist tickers
    #[serde(default)]
    pub watchlist: WatchlistConfig,

    /// Upstream API base URLs
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Refresh interval in seconds
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: f64,

    /// API timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            timeout: default_timeout(),
        }
    }
}

fn default_refresh_interval() -> f64 {
    30.0
}
fn default_timeout() -> u64 {
    10
}

/// Which API prices come from.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SourceConfig {
    /// "binance" or "coinmarketcap"
    #[serde(default)]
    pub provider: DataSource,

    /// CoinMarketCap API key
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Watchlist configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WatchlistConfig {
    /// Comma-separated tickers, e.g. "BTC,ETH,SOL"
    #[serde(default)]
    pub tickers: String,
}

/// Base URLs, overridable for proxies and mirrors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_binance_url")]
    pub binance: String,

    #[serde(default = "default_coinmarketcap_url")]
    pub coinmarketcap: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            binance: default_binance_url(),
            coinmarketcap: default_coinmarketcap_url(),
        }
    }
}

fn default_binance_url() -> String {
    DEFAULT_BINANCE_URL.to_string()
}
fn default_coinmarketcap_url() -> String {
    DEFAULT_COINMARKETCAP_URL.to_string()
}

impl Config {
    /// Load configuration from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from default location or create default.
    pub fn load_or_default() -> Self {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                match Self::load(&path) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to load config: {:#}", e);
                    }
                }
            }
        }
        Config::default()
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("coinwatch").join("config.toml"))
    }
}

/// Effective settings after merging CLI, environment and config file.
///
/// Built once at startup and handed to the app by value; nothing reads the
/// config file or environment after this point.
#[derive(Debug, Clone, PartialEq)]
pub struct Preferences {
    /// Comma-separated ticker list as entered
    pub tickers: String,
    pub source: DataSource,
    pub api_key: Option<String>,
    pub refresh_interval: Duration,
    pub timeout: u64,
    /// Initial search text
    pub search: String,
    pub endpoints: Endpoints,
}

impl Preferences {
    /// Merge arguments over the config file; CLI and env values win.
    pub fn resolve(args: &Args, config: &Config) -> Self {
        let delay = args
            .delay
            .unwrap_or(config.general.refresh_interval)
            .max(MIN_REFRESH_INTERVAL)
            .min(MAX_REFRESH_INTERVAL);

        let api_key = args
            .api_key
            .clone()
            .or_else(|| config.source.api_key.clone())
            .filter(|k| !k.trim().is_empty());

        Self {
            tickers: args
                .tickers
                .clone()
                .unwrap_or_else(|| config.watchlist.tickers.clone()),
            source: args.source.map(Into::into).unwrap_or(config.source.provider),
            api_key,
            refresh_interval: Duration::from_secs_f64(delay),
            timeout: args.timeout.unwrap_or(config.general.timeout),
            search: args.filter.clone().unwrap_or_default(),
            endpoints: Endpoints {
                binance: args
                    .exchange_url
                    .clone()
                    .unwrap_or_else(|| config.endpoints.binance.clone()),
                coinmarketcap: args
                    .aggregator_url
                    .clone()
                    .unwrap_or_else(|| config.endpoints.coinmarketcap.clone()),
            },
        }
    }

    /// True when the ticker list has at least one non-blank entry.
    pub fn has_tickers(&self) -> bool {
        self.tickers.split(',').any(|t| !t.trim().is_empty())
    }
}

/// Generate a sample configuration file content.
pub fn sample_config() -> &'static str {
    r##"# coinwatch configuration file

[general]
# Refresh interval in seconds
refresh_interval = 30.0
# API timeout in seconds
timeout = 10

[source]
# "binance" or "coinmarketcap"
provider = "binance"
# Required for coinmarketcap; without it coinwatch falls back to binance
api_key = ""

[watchlist]
# Comma-separated tickers; the quote currency is added for you
tickers = "BTC,ETH,SOL,DOGE"

[endpoints]
binance = "https://api.binance.com"
coinmarketcap = "https://pro-api.coinmarketcap.com"
"##
}
