//! Application state and refresh cycle.
//!
//! `App` is the only owner of the quote list. Refreshes run elsewhere and come
//! back as [`RefreshOutcome`]s tagged with a sequence number; only the outcome
//! of the most recently issued cycle is applied.

use crate::actions;
use crate::api::SourceSelector;
use crate::cli::{Args, ExportFormat};
use crate::command::{PricesCommand, filter_prices};
use crate::config::Preferences;
use crate::models::{DataSource, Notice, Quote, RefreshPhase};
use anyhow::Result;
use chrono::{DateTime, Local};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

/// Application state.
pub struct App {
    /// Effective preferences
    pub prefs: Preferences,
    /// Fetcher factory, consulted every cycle
    selector: SourceSelector,
    /// Quotes from the latest applied cycle
    pub quotes: Vec<Quote>,
    /// Current refresh phase
    pub phase: RefreshPhase,
    /// Source that produced the current quotes
    pub active_source: DataSource,
    /// Search text
    pub search: String,
    /// Typing into the search box
    pub search_mode: bool,
    /// Symbol shown in the detail pane
    selected_symbol: Option<String>,
    /// Notification to display
    pub notice: Option<Notice>,
    /// Sequence number of the latest issued cycle
    issued_seq: u64,
    /// Fallback warning from the latest source selection
    pub source_warning: Option<String>,
    /// Whether the fallback warning has been shown and dismissed
    fallback_warned: bool,
    /// Last applied refresh
    pub last_refresh: Option<Instant>,
    /// Wall-clock time of the last applied refresh
    pub updated_at: Option<DateTime<Local>>,
    /// Start of the latest cycle; drives the timer
    last_cycle_started: Option<Instant>,
    /// Completed cycles
    pub iteration: u64,
    /// Maximum iterations (0 = infinite)
    pub max_iterations: u64,
    /// Is the app running
    pub running: bool,
    /// Show help overlay
    pub show_help: bool,
    /// Batch mode (non-interactive)
    pub batch_mode: bool,
    /// Batch output format
    pub export: Option<ExportFormat>,
}

/// One issued refresh cycle, ready to run off the main loop.
pub struct RefreshRequest {
    seq: u64,
    command: PricesCommand,
    tickers: String,
}

/// Result of a refresh cycle.
#[derive(Debug)]
pub struct RefreshOutcome {
    pub seq: u64,
    pub source: DataSource,
    /// Quotes, or the message of whatever blew up while fetching them
    pub result: Result<Vec<Quote>, String>,
}

impl RefreshRequest {
    pub fn new(seq: u64, command: PricesCommand, tickers: String) -> Self {
        Self {
            seq,
            command,
            tickers,
        }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Run the cycle. A panic inside the fetcher becomes an error outcome.
    ///
    /// The fetch runs inside the caller's task, so aborting that task cancels
    /// the requests too.
    pub async fn run(self) -> RefreshOutcome {
        let Self {
            seq,
            command,
            tickers,
        } = self;
        let source = command.fetcher().source();

        let result = AssertUnwindSafe(async move { command.get_prices(&tickers).await })
            .catch_unwind()
            .await
            .map_err(describe_panic);

        RefreshOutcome {
            seq,
            source,
            result,
        }
    }
}

fn describe_panic(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "refresh failed with an unknown error".to_string()
    }
}

impl App {
    /// Create a new application from CLI args and merged preferences.
    pub fn new(args: &Args, prefs: Preferences) -> Result<Self> {
        let selector = SourceSelector::new(prefs.timeout, prefs.endpoints.clone())?;

        Ok(Self {
            selector,
            quotes: Vec::new(),
            phase: RefreshPhase::Idle,
            active_source: prefs.source,
            search: prefs.search.clone(),
            search_mode: false,
            selected_symbol: None,
            notice: None,
            source_warning: None,
            issued_seq: 0,
            fallback_warned: false,
            last_refresh: None,
            updated_at: None,
            last_cycle_started: None,
            iteration: 0,
            max_iterations: args.iterations,
            running: true,
            show_help: false,
            batch_mode: args.batch,
            export: args.export,
            prefs,
        })
    }

    /// The periodic timer: a new cycle is due once the interval has passed
    /// since the previous one started, finished or not.
    pub fn needs_refresh(&self) -> bool {
        match self.last_cycle_started {
            None => true,
            Some(started) => started.elapsed() >= self.prefs.refresh_interval,
        }
    }

    /// Make the next tick start a cycle.
    pub fn force_refresh(&mut self) {
        self.last_cycle_started = None;
    }

    /// Issue a new cycle: pick the fetcher, bump the sequence, enter `Loading`.
    pub fn begin_refresh(&mut self) -> RefreshRequest {
        let selection = self
            .selector
            .select(self.prefs.source, self.prefs.api_key.as_deref());

        match selection.warning {
            Some(ref warning) if self.batch_mode || !self.fallback_warned => {
                self.notice = Some(Notice::warning(warning.clone()));
            }
            Some(_) => {}
            None => self.fallback_warned = false,
        }
        self.source_warning = selection.warning;

        self.issued_seq += 1;
        self.phase = RefreshPhase::Loading;
        self.last_cycle_started = Some(Instant::now());

        tracing::debug!(seq = self.issued_seq, source = %selection.fetcher.source(), "refresh issued");

        RefreshRequest::new(
            self.issued_seq,
            PricesCommand::new(selection.fetcher),
            self.prefs.tickers.clone(),
        )
    }

    /// Apply a finished cycle. Returns false when it was superseded and dropped.
    pub fn apply_refresh(&mut self, outcome: RefreshOutcome) -> bool {
        if outcome.seq != self.issued_seq {
            tracing::debug!(seq = outcome.seq, latest = self.issued_seq, "discarding stale refresh");
            return false;
        }

        self.phase = RefreshPhase::Idle;
        self.iteration += 1;

        match outcome.result {
            Ok(quotes) => {
                tracing::info!(seq = outcome.seq, count = quotes.len(), "refresh complete");
                if quotes.is_empty() {
                    let message = format!("No prices found for {}", self.prefs.tickers.trim());
                    self.raise(Notice::warning(message));
                }
                self.quotes = quotes;
                self.active_source = outcome.source;
                self.last_refresh = Some(Instant::now());
                self.updated_at = Some(Local::now());
            }
            Err(message) => {
                tracing::error!(seq = outcome.seq, error = %message, "refresh failed");
                self.raise(Notice::error(format!("Failed to refresh prices: {}", message)));
            }
        }

        self.resolve_selection();
        true
    }

    /// Run one full cycle in place (batch mode).
    pub async fn refresh(&mut self) {
        let request = self.begin_refresh();
        let outcome = request.run().await;
        self.apply_refresh(outcome);
    }

    /// Quotes matching the current search text, in source order.
    pub fn visible_quotes(&self) -> Vec<&Quote> {
        filter_prices(&self.quotes, &self.search)
    }

    /// Row of the selected quote among the visible ones.
    ///
    /// The selection is held by symbol; if that symbol is no longer visible the
    /// first row is selected instead.
    pub fn selected_index(&self) -> Option<usize> {
        let visible = self.visible_quotes();
        if visible.is_empty() {
            return None;
        }

        let index = self
            .selected_symbol
            .as_deref()
            .and_then(|symbol| visible.iter().position(|q| q.symbol == symbol))
            .unwrap_or(0);
        Some(index)
    }

    /// The quote shown in the detail pane.
    pub fn selected_quote(&self) -> Option<&Quote> {
        let index = self.selected_index()?;
        self.visible_quotes().get(index).copied()
    }

    fn resolve_selection(&mut self) {
        self.selected_symbol = self.selected_quote().map(|q| q.symbol.clone());
    }

    fn select_index(&mut self, index: usize) {
        self.selected_symbol = self.visible_quotes().get(index).map(|q| q.symbol.clone());
    }

    /// Move selection up.
    pub fn select_up(&mut self) {
        if let Some(index) = self.selected_index() {
            self.select_index(index.saturating_sub(1));
        }
    }

    /// Move selection down.
    pub fn select_down(&mut self) {
        if let Some(index) = self.selected_index() {
            let last = self.visible_quotes().len().saturating_sub(1);
            self.select_index((index + 1).min(last));
        }
    }

    /// Move selection to top.
    pub fn select_top(&mut self) {
        self.select_index(0);
    }

    /// Move selection to bottom.
    pub fn select_bottom(&mut self) {
        let last = self.visible_quotes().len().saturating_sub(1);
        self.select_index(last);
    }

    /// Start typing into the search box.
    pub fn start_search(&mut self) {
        self.search_mode = true;
    }

    /// Leave the search box, keeping the filter.
    pub fn finish_search(&mut self) {
        self.search_mode = false;
    }

    /// Leave the search box and drop the filter.
    pub fn cancel_search(&mut self) {
        self.search_mode = false;
        self.search.clear();
        self.resolve_selection();
    }

    pub fn push_search(&mut self, c: char) {
        self.search.push(c);
        self.resolve_selection();
    }

    pub fn pop_search(&mut self) {
        self.search.pop();
        self.resolve_selection();
    }

    /// Open the selected quote's market page.
    pub fn open_selected(&mut self) {
        let Some(url) = self.selected_quote().map(Quote::market_page_url) else {
            return;
        };

        self.notice = Some(match actions::open_url(&url) {
            Ok(()) => Notice::info(format!("Opened {}", url)),
            Err(e) => Notice::error(format!("{:#}", e)),
        });
    }

    /// Copy the selected quote's price.
    pub fn copy_selected_price(&mut self) {
        if let Some(price) = self.selected_quote().map(|q| q.price.to_string()) {
            self.copy(&price, "price");
        }
    }

    /// Copy the selected quote's symbol.
    pub fn copy_selected_symbol(&mut self) {
        if let Some(symbol) = self.selected_quote().map(|q| q.symbol.clone()) {
            self.copy(&symbol, "symbol");
        }
    }

    fn copy(&mut self, text: &str, what: &str) {
        self.notice = Some(match actions::copy_to_clipboard(text) {
            Ok(()) => Notice::info(format!("Copied {} {} to clipboard", what, text)),
            Err(e) => Notice::error(format!("{:#}", e)),
        });
    }

    /// Dismiss the current notice.
    pub fn dismiss_notice(&mut self) {
        if let Some(notice) = self.notice.take() {
            if self.is_fallback_notice(&notice) {
                self.fallback_warned = true;
            }
        }
    }

    /// Replace the current notice, folding in a fallback warning that is
    /// still waiting to be seen.
    fn raise(&mut self, mut notice: Notice) {
        if let Some(pending) = self.notice.take() {
            if self.is_fallback_notice(&pending) {
                notice.message = format!("{}. {}", pending.message, notice.message);
            }
        }
        self.notice = Some(notice);
    }

    fn is_fallback_notice(&self, notice: &Notice) -> bool {
        self.source_warning
            .as_deref()
            .is_some_and(|warning| notice.message.starts_with(warning))
    }

    /// Toggle help display.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Check if max iterations reached.
    pub fn should_quit(&self) -> bool {
        !self.running || (self.max_iterations > 0 && self.iteration >= self.max_iterations)
    }

    /// Get time since last refresh as human readable string.
    pub fn time_since_refresh(&self) -> String {
        match self.last_refresh {
            Some(t) => {
                let elapsed = t.elapsed().as_secs();
                if elapsed < 60 {
                    format!("{}s ago", elapsed)
                } else {
                    format!("{}m ago", elapsed / 60)
                }
            }
            None => "never".to_string(),
        }
    }
}
