//! Command-line interface.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// A searchable, auto-refreshing terminal watchlist for cryptocurrency prices.
///
/// Prices come from the Binance spot ticker API or, with an API key, from
/// CoinMarketCap. The list refreshes every 30 seconds by default; press `/`
/// to search and `h` for the key bindings.
#[derive(Parser, Debug, Clone)]
#[command(name = "coinwatch")]
#[command(version)]
#[command(about = "A searchable terminal watchlist for cryptocurrency prices", long_about = None)]
pub struct Args {
    /// Tickers to watch (comma-separated)
    ///
    /// Examples: BTC,ETH,SOL or btcusdt,ethusdt
    /// The quote currency (USDT on Binance) is appended when missing.
    #[arg(short = 's', long, env = "COINWATCH_TICKERS")]
    pub tickers: Option<String>,

    /// Price data source
    #[arg(long, value_enum, env = "COINWATCH_SOURCE")]
    pub source: Option<SourceArg>,

    /// CoinMarketCap API key
    #[arg(long, env = "COINWATCH_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Refresh delay in seconds [default: 30]
    #[arg(short = 'd', long, env = "COINWATCH_DELAY")]
    pub delay: Option<f64>,

    /// Number of refresh cycles before exiting
    ///
    /// 0 means infinite
    #[arg(short = 'n', long, default_value = "0")]
    pub iterations: u64,

    /// Batch mode - print each refresh to stdout instead of the interactive view
    #[arg(short = 'b', long)]
    pub batch: bool,

    /// Initial search text (matches symbol or name)
    #[arg(short = 'f', long)]
    pub filter: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "COINWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Batch output format
    #[arg(long, value_enum)]
    pub export: Option<ExportFormat>,

    /// API timeout in seconds [default: 10]
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Override the Binance base URL
    #[arg(long, hide = true)]
    pub exchange_url: Option<String>,

    /// Override the CoinMarketCap base URL
    #[arg(long, hide = true)]
    pub aggregator_url: Option<String>,
}

/// Data source options.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SourceArg {
    /// Binance spot tickers (no key needed)
    Binance,
    /// CoinMarketCap quotes (needs --api-key)
    Coinmarketcap,
}

impl From<SourceArg> for crate::models::DataSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Binance => crate::models::DataSource::Binance,
            SourceArg::Coinmarketcap => crate::models::DataSource::CoinMarketCap,
        }
    }
}

/// Export format for batch output.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ExportFormat {
    /// Plain text format
    Text,
    /// Comma-separated values (CSV)
    Csv,
    /// JavaScript Object Notation (JSON)
    Json,
}

impl Args {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Args::parse()
    }
}
