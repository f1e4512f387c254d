//! Integration tests for the coinwatch CLI.

use std::process::{Command, Output};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get the path to the coinwatch binary.
fn coinwatch_bin() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_coinwatch"));
    command
        .env_remove("COINWATCH_TICKERS")
        .env_remove("COINWATCH_SOURCE")
        .env_remove("COINWATCH_API_KEY")
        .env_remove("COINWATCH_CONFIG")
        .env_remove("COINWATCH_DELAY")
        .env_remove("COINWATCH_LOG");
    command
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(args: Vec<String>) -> Output {
    tokio::task::spawn_blocking(move || {
        coinwatch_bin()
            .args(&args)
            .output()
            .expect("Failed to execute command")
    })
    .await
    .expect("Command task panicked")
}

fn ticker(symbol: &str, last: &str, change: &str) -> serde_json::Value {
    serde_json::json!({
        "symbol": symbol,
        "priceChangePercent": change,
        "lastPrice": last
    })
}

#[test]
fn test_help_flag() {
    let output = coinwatch_bin()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("coinwatch"));
    assert!(stdout.contains("--tickers"));
    assert!(stdout.contains("--source"));
    assert!(stdout.contains("--api-key"));
    assert!(stdout.contains("--delay"));
    assert!(!stdout.contains("--exchange-url"));
}

#[test]
fn test_version_flag() {
    let output = coinwatch_bin()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("coinwatch"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_tickers_error() {
    let output = coinwatch_bin()
        .args(["-s", " , "])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No tickers to watch"));
    assert!(stderr.contains("[watchlist]"));
}

#[test]
fn test_invalid_delay() {
    let output = coinwatch_bin()
        .args(["-s", "BTC", "-d", "invalid"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

#[test]
fn test_invalid_source() {
    let output = coinwatch_bin()
        .args(["-s", "BTC", "--source", "kraken"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_batch_json_from_exchange_stub() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/ticker/24hr"))
        .and(query_param("symbol", "BTCUSDT"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(ticker("BTCUSDT", "67000.5", "1.25")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/ticker"))
        .and(query_param("symbol", "BTCUSDT"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(ticker("BTCUSDT", "67000.5", "0.5")),
        )
        .mount(&server)
        .await;

    let output = run(
        [
            "-b",
            "-n",
            "1",
            "-s",
            "btc, nope",
            "--source",
            "binance",
            "--export",
            "json",
            "--exchange-url",
        ]
        .into_iter()
        .map(String::from)
        .chain([server.uri()])
        .collect(),
    )
    .await;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let quotes: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    let quotes = quotes.as_array().expect("JSON array");
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0]["symbol"], "BTCUSDT");
    assert_eq!(quotes[0]["name"], "BTC");
    assert_eq!(quotes[0]["price"], "67000.5");
    assert_eq!(quotes[0]["change_24h"], "1.25");
    assert!(quotes[0]["market_cap"].is_null());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_batch_empty_result_warns() {
    let server = MockServer::start().await;

    let output = run(
        ["-b", "-n", "1", "-s", "nope", "--source", "binance", "--exchange-url"]
            .into_iter()
            .map(String::from)
            .chain([server.uri()])
            .collect(),
    )
    .await;

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No prices found for nope"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_batch_coinmarketcap_without_key_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/ticker/24hr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ticker("ETHUSDT", "3100", "-2")))
        .mount(&server)
        .await;

    let output = run(
        [
            "-b",
            "-n",
            "1",
            "-s",
            "eth",
            "--source",
            "coinmarketcap",
            "--aggregator-url",
            "http://127.0.0.1:9",
            "--exchange-url",
        ]
        .into_iter()
        .map(String::from)
        .chain([server.uri()])
        .collect(),
    )
    .await;

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("API key is missing or invalid"));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ETHUSDT"));
    assert!(stdout.contains("(Binance)"));
}
