//! Terminal user interface with ratatui.

use crate::app::App;
use crate::export::export_quotes;
use crate::format::{format_optional_change, format_price, market_cap_label, symbol_color};
use crate::models::{NoticeLevel, Quote, RefreshPhase};
use anyhow::Result;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};
use rust_decimal::Decimal;

/// Colors for the UI.
pub struct UiColors {
    pub gain: Color,
    pub loss: Color,
    pub neutral: Color,
    pub header_bg: Color,
    pub selected_bg: Color,
    pub border: Color,
    pub info: Color,
    pub warning: Color,
}

impl Default for UiColors {
    fn default() -> Self {
        Self {
            gain: Color::Green,
            loss: Color::Red,
            neutral: Color::White,
            header_bg: Color::DarkGray,
            selected_bg: Color::Rgb(40, 40, 60),
            border: Color::DarkGray,
            info: Color::Cyan,
            warning: Color::Yellow,
        }
    }
}

impl UiColors {
    fn change(&self, value: Option<Decimal>) -> Color {
        match value {
            Some(v) if v.is_sign_positive() && !v.is_zero() => self.gain,
            Some(v) if v.is_sign_negative() && !v.is_zero() => self.loss,
            _ => self.neutral,
        }
    }

    fn notice(&self, level: NoticeLevel) -> Color {
        match level {
            NoticeLevel::Info => self.info,
            NoticeLevel::Warning => self.warning,
            NoticeLevel::Error => self.loss,
        }
    }
}

/// Render the main UI.
pub fn render(frame: &mut Frame, app: &App) {
    let colors = UiColors::default();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(8),    // List + detail
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0], &colors);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);

    let visible = app.visible_quotes();
    if visible.is_empty() {
        render_empty_state(frame, app, chunks[1], &colors);
    } else {
        render_list(frame, app, &visible, panes[0], &colors);
        if let Some(quote) = app.selected_quote() {
            render_detail(frame, app, quote, panes[1], &colors);
        }
    }

    render_footer(frame, app, chunks[2], &colors);

    if app.show_help {
        render_help_overlay(frame, &colors);
    }

    if let Some(ref notice) = app.notice {
        render_notice(frame, notice.title(), &notice.message, colors.notice(notice.level), &colors);
    }
}

/// Render the header with status and the search box.
fn render_header(frame: &mut Frame, app: &App, area: Rect, colors: &UiColors) {
    let status = match app.phase {
        RefreshPhase::Loading => Span::styled("Refreshing...", Style::default().fg(colors.warning)),
        RefreshPhase::Idle => Span::raw(format!("Updated: {}", app.time_since_refresh())),
    };

    let search_style = if app.search_mode {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(colors.neutral)
    };
    let cursor = if app.search_mode { "_" } else { "" };

    let header_text = vec![
        Line::from(vec![
            Span::styled(
                "COINWATCH ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                "- {} prices from {}  ",
                app.quotes.len(),
                app.active_source
            )),
            status,
        ]),
        Line::from(vec![
            Span::raw("Search: "),
            Span::styled(format!("{}{}", app.search, cursor), search_style),
        ]),
    ];

    let header = Paragraph::new(header_text).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(colors.border)),
    );

    frame.render_widget(header, area);
}

/// Render the searchable list of quotes.
fn render_list(frame: &mut Frame, app: &App, visible: &[&Quote], area: Rect, colors: &UiColors) {
    let header = Row::new(["SYMBOL", "PRICE", "1H"].map(Cell::from))
        .style(Style::default().bg(colors.header_bg).fg(Color::White))
        .height(1);

    let selected = app.selected_index();

    let rows = visible.iter().enumerate().map(|(i, quote)| {
        let row_style = if Some(i) == selected {
            Style::default().bg(colors.selected_bg)
        } else {
            Style::default()
        };

        Row::new(vec![
            Cell::from(quote.symbol.clone()).style(
                Style::default()
                    .fg(symbol_color(&quote.symbol))
                    .add_modifier(Modifier::BOLD),
            ),
            Cell::from(format_price(quote.price)),
            Cell::from(format_optional_change(quote.change_1h, true))
                .style(Style::default().fg(colors.change(quote.change_1h))),
        ])
        .style(row_style)
    });

    let widths = [
        Constraint::Length(12),
        Constraint::Min(14),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::RIGHT)
                .border_style(Style::default().fg(colors.border)),
        )
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = TableState::default();
    state.select(selected);

    frame.render_stateful_widget(table, area, &mut state);
}

/// Render the detail pane for the selected quote.
fn render_detail(frame: &mut Frame, app: &App, quote: &Quote, area: Rect, colors: &UiColors) {
    let label = Style::default().fg(Color::Gray);
    let change_line = |name: &'static str, value: Option<Decimal>| {
        Line::from(vec![
            Span::styled(format!("{:<12}", name), label),
            Span::styled(
                format_optional_change(value, false),
                Style::default().fg(colors.change(value)),
            ),
        ])
    };

    let market_cap = market_cap_label(quote.market_cap);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                quote.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                quote.symbol.clone(),
                Style::default().fg(symbol_color(&quote.symbol)),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("{:<12}", "Price"), label),
            Span::raw(format_price(quote.price)),
        ]),
        change_line("1h", quote.change_1h),
        change_line("24h", quote.change_24h),
        change_line("7d", quote.change_7d),
        Line::from(vec![
            Span::styled(format!("{:<12}", "Market Cap"), label),
            Span::raw(market_cap),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("{:<12}", "Link"), label),
            Span::styled(
                quote.market_page_url(),
                Style::default().add_modifier(Modifier::UNDERLINED),
            ),
        ]),
    ];

    if let Some(ref icon) = quote.icon_url {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<12}", "Icon"), label),
            Span::raw(icon.clone()),
        ]));
    }

    if let Some(updated) = app.updated_at {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("As of {}", updated.format("%H:%M:%S")),
            label,
        )));
    }

    let detail = Paragraph::new(lines)
        .block(Block::default().borders(Borders::NONE).title(" Detail "))
        .wrap(Wrap { trim: false });

    frame.render_widget(detail, area);
}

/// Placeholder shown when there is nothing to list.
fn render_empty_state(frame: &mut Frame, app: &App, area: Rect, colors: &UiColors) {
    let message = if app.phase == RefreshPhase::Loading && app.last_refresh.is_none() {
        "Loading prices...".to_string()
    } else if !app.search.is_empty() && !app.quotes.is_empty() {
        format!("No tickers match \"{}\"", app.search)
    } else {
        "No prices to show. Check your tickers and data source.".to_string()
    };

    let placeholder = Paragraph::new(vec![Line::from(""), Line::from(message)])
        .alignment(Alignment::Center)
        .style(Style::default().fg(colors.neutral));

    frame.render_widget(placeholder, area);
}

/// Render the footer with keybindings.
fn render_footer(frame: &mut Frame, app: &App, area: Rect, colors: &UiColors) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    let footer = Line::from(vec![
        key(" q"),
        Span::raw(":quit "),
        key("/"),
        Span::raw(":search "),
        key("o"),
        Span::raw(":open "),
        key("c"),
        Span::raw(":copy price "),
        key("y"),
        Span::raw(":copy symbol "),
        key("h"),
        Span::raw(":help "),
        Span::raw(format!(
            "| every {}s | Iter: {}",
            app.prefs.refresh_interval.as_secs(),
            app.iteration
        )),
    ]);

    let footer_widget = Paragraph::new(footer).style(Style::default().bg(colors.header_bg));

    frame.render_widget(footer_widget, area);
}

/// Render help overlay.
fn render_help_overlay(frame: &mut Frame, colors: &UiColors) {
    let area = centered_rect(60, 70, frame.area());

    let help_text = vec![
        Line::from(Span::styled(
            "COINWATCH HELP",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  ↑/k       Move up"),
        Line::from("  ↓/j       Move down"),
        Line::from("  g/Home    Go to top"),
        Line::from("  G/End     Go to bottom"),
        Line::from(""),
        Line::from("Search:"),
        Line::from("  /         Start typing a filter"),
        Line::from("  Enter     Keep filter"),
        Line::from("  Esc       Clear filter"),
        Line::from(""),
        Line::from("Actions:"),
        Line::from("  o/Enter   Open market page"),
        Line::from("  c         Copy price"),
        Line::from("  y         Copy symbol"),
        Line::from("  Space/R   Force refresh"),
        Line::from("  q/Esc     Quit"),
        Line::from("  h/?       Toggle help"),
        Line::from(""),
        Line::from("Press any key to close"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors.border)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(Clear, area);
    frame.render_widget(help, area);
}

/// Render a dismissible notice.
fn render_notice(frame: &mut Frame, title: &str, message: &str, color: Color, colors: &UiColors) {
    let area = centered_rect(50, 20, frame.area());

    let notice = Paragraph::new(vec![
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to dismiss",
            Style::default().fg(colors.border),
        )),
    ])
    .block(
        Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color)),
    )
    .style(Style::default().fg(color))
    .wrap(Wrap { trim: true });

    frame.render_widget(Clear, area);
    frame.render_widget(notice, area);
}

/// Create a centered rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Truncate string to max length.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        ".".repeat(max_len)
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

/// Render batch mode output (non-interactive).
pub fn render_batch(app: &App) -> Result<()> {
    if let Some(ref notice) = app.notice {
        eprintln!("{}: {}", notice.title().trim(), notice.message);
    }

    let visible = app.visible_quotes();

    if let Some(format) = app.export {
        print!("{}", export_quotes(&visible, format)?);
        return Ok(());
    }

    println!(
        "\n=== COINWATCH {} ({}) ===",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        app.active_source
    );
    println!(
        "{:<12} {:<18} {:>14} {:>9} {:>9} {:>9} {:>10}",
        "SYMBOL", "NAME", "PRICE", "1H", "24H", "7D", "MKT CAP"
    );
    println!("{}", "-".repeat(87));

    for quote in visible {
        println!(
            "{:<12} {:<18} {:>14} {:>9} {:>9} {:>9} {:>10}",
            quote.symbol,
            truncate_string(&quote.name, 18),
            format_price(quote.price),
            format_optional_change(quote.change_1h, false),
            format_optional_change(quote.change_24h, false),
            format_optional_change(quote.change_7d, false),
            market_cap_label(quote.market_cap),
        );
    }

    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use crate::config::{Config, Preferences};
    use clap::Parser;
    use ratatui::{Terminal, backend::TestBackend};
    use rust_decimal_macros::dec;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn app_with_quotes() -> App {
        let args = Args::parse_from(["coinwatch", "-s", "BTC,ETH"]);
        let prefs = Preferences::resolve(&args, &Config::default());
        let mut app = App::new(&args, prefs).unwrap();

        let request = app.begin_refresh();
        let mut btc = Quote::new("BTCUSDT", "BTC", dec!(67000.5));
        btc.change_1h = Some(dec!(5));
        app.apply_refresh(crate::app::RefreshOutcome {
            seq: request.seq(),
            source: crate::models::DataSource::Binance,
            result: Ok(vec![btc, Quote::new("ETHUSDT", "ETH", dec!(3100))]),
        });
        app
    }

    #[test]
    fn test_render_list_and_detail() {
        let app = app_with_quotes();
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("COINWATCH"));
        assert!(text.contains("ETHUSDT"));
        assert!(text.contains("$67,000.50"));
        assert!(text.contains("+5.00%"));
        assert!(text.contains("coinmarketcap.com/currencies/btc/"));
    }

    #[test]
    fn test_render_empty_state() {
        let mut app = app_with_quotes();
        app.search = "doge".to_string();

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();

        assert!(buffer_text(&terminal).contains("No tickers match \"doge\""));
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Bitcoin", 10), "Bitcoin");
        assert_eq!(truncate_string("Wrapped Bitcoin", 10), "Wrapped...");
        assert_eq!(truncate_string("abcdef", 3), "...");
    }
}
