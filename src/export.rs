//! Batch output as plain text, CSV or JSON.

use crate::cli::ExportFormat;
use crate::format::{format_optional_change, format_price, market_cap_label};
use crate::models::Quote;
use anyhow::{Context, Result};

/// Export quotes in the specified format.
pub fn export_quotes(quotes: &[&Quote], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Text => Ok(export_text(quotes)),
        ExportFormat::Csv => Ok(export_csv(quotes)),
        ExportFormat::Json => export_json(quotes),
    }
}

/// Export as plain text, one block per quote.
fn export_text(quotes: &[&Quote]) -> String {
    let mut output = String::new();

    for quote in quotes {
        output.push_str(&format!("Symbol: {}\n", quote.symbol));
        output.push_str(&format!("Name: {}\n", quote.name));
        output.push_str(&format!("Price: {}\n", format_price(quote.price)));
        output.push_str(&format!("1h: {}\n", format_optional_change(quote.change_1h, false)));
        output.push_str(&format!("24h: {}\n", format_optional_change(quote.change_24h, false)));
        output.push_str(&format!("7d: {}\n", format_optional_change(quote.change_7d, false)));
        output.push_str(&format!("Market Cap: {}\n", market_cap_label(quote.market_cap)));
        output.push_str(&format!("Link: {}\n", quote.market_page_url()));
        output.push('\n');
    }

    output
}

/// Export as CSV with raw decimal values.
fn export_csv(quotes: &[&Quote]) -> String {
    let mut output = String::from("Symbol,Name,Price,Change1h,Change24h,Change7d,MarketCap\n");

    for quote in quotes {
        output.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            csv_field(&quote.symbol),
            csv_field(&quote.name),
            quote.price,
            optional(quote.change_1h),
            optional(quote.change_24h),
            optional(quote.change_7d),
            optional(quote.market_cap),
        ));
    }

    output
}

/// Export as a JSON array; decimals are written as strings.
fn export_json(quotes: &[&Quote]) -> Result<String> {
    let mut output =
        serde_json::to_string_pretty(quotes).context("Failed to serialize quotes as JSON")?;
    output.push('\n');
    Ok(output)
}

fn optional(value: Option<rust_decimal::Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Quote a CSV field, doubling embedded quotes.
fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
