use crate::app::{App, CatalogView};
use chrono::{Local, Utc};
use ocr_flow::{
    session::{SessionSnapshot, SessionStatus},
    signal::Signal,
};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Bar, BarChart, BarGroup, Block, BorderType, Borders, List, ListItem, Paragraph},
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rust_decimal_macros::dec;

/// |OCR| above which the ratio is highlighted.
const OCR_HIGHLIGHT: Decimal = dec!(0.3);

const GREEN: Color = Color::Rgb(0, 255, 127);
const RED: Color = Color::Rgb(255, 69, 58);
const GOLD: Color = Color::Rgb(255, 215, 0);
const BLUE: Color = Color::Rgb(100, 149, 237);
const GREY: Color = Color::Rgb(128, 128, 150);
const TEXT: Color = Color::Rgb(200, 200, 220);
const BACKGROUND: Color = Color::Rgb(15, 15, 25);

pub fn render(f: &mut Frame, app: &mut App, snapshot: &SessionSnapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_status_bar(f, chunks[0], snapshot);

    match &app.catalog {
        CatalogView::Loading => render_message(
            f,
            chunks[1],
            "Loading instruments...",
            Style::default().fg(BLUE),
        ),
        CatalogView::Failed(cause) => render_message(
            f,
            chunks[1],
            &format!("Failed to load instruments: {cause}"),
            Style::default().fg(RED).add_modifier(Modifier::BOLD),
        ),
        CatalogView::Ready(_) => {
            let main_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(32), Constraint::Min(0)])
                .split(chunks[1]);

            render_coin_pane(f, main_chunks[0], app);
            render_session_pane(f, main_chunks[1], snapshot);
        }
    }

    render_help(f, chunks[2]);
}

fn block(title: &str, colour: Color) -> Block<'static> {
    Block::default()
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(colour).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(colour))
        .style(Style::default().bg(BACKGROUND))
}

fn render_status_bar(f: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
    let status_colour = status_colour(snapshot.status);

    let line = Line::from(vec![
        Span::styled(
            " ◆ OCR FLOW ◆ ",
            Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" ● {} ", snapshot.status.to_string().to_uppercase()),
            Style::default()
                .fg(status_colour)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {} ", snapshot.symbol.as_deref().unwrap_or("-")),
            Style::default().fg(TEXT),
        ),
        Span::styled(
            format!(" ⏱  {} ", Local::now().format("%H:%M:%S")),
            Style::default().fg(BLUE),
        ),
    ]);

    let paragraph = Paragraph::new(line)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Rgb(138, 43, 226)))
                .style(Style::default().bg(Color::Rgb(18, 18, 28))),
        )
        .alignment(Alignment::Center);

    f.render_widget(paragraph, area);
}

fn render_help(f: &mut Frame, area: Rect) {
    let help = Paragraph::new(Line::from(Span::styled(
        " [type] search  [↑/↓] select  [Enter] analyse  [Esc] stop  [Ctrl-C] quit ",
        Style::default().fg(GREY),
    )));
    f.render_widget(help, area);
}

fn render_message(f: &mut Frame, area: Rect, message: &str, style: Style) {
    let paragraph = Paragraph::new(Text::from(vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), style)),
    ]))
    .block(block("OCR Flow", BLUE))
    .alignment(Alignment::Center);

    f.render_widget(paragraph, area);
}

fn render_coin_pane(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let search = Paragraph::new(Line::from(vec![
        Span::styled("🔍 ", Style::default().fg(BLUE)),
        Span::styled(app.search.clone(), Style::default().fg(Color::White)),
        Span::styled("▏", Style::default().fg(GREY)),
    ]))
    .block(block("Search", BLUE));
    f.render_widget(search, chunks[0]);

    let listings = app.filtered();
    let count = listings.len();
    let items: Vec<ListItem> = listings
        .into_iter()
        .map(|listing| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<12}", listing.coin),
                    Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("{} contracts", listing.contracts.len()),
                    Style::default().fg(GREY),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block(&format!("Coins ({count})"), GOLD))
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(40, 40, 70))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    f.render_stateful_widget(list, chunks[1], &mut app.list_state);
}

fn render_session_pane(f: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
    if snapshot.symbol.is_none() {
        render_message(
            f,
            area,
            "Select a coin and press Enter to start analysis",
            Style::default().fg(GREY),
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(11), Constraint::Min(0)])
        .split(area);

    render_metrics(f, chunks[0], snapshot);
    render_history(f, chunks[1], snapshot);
}

fn render_metrics(f: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
    let label = Style::default().fg(GREY);
    let value = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
    let flow = &snapshot.flow;

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Price        ", label),
            Span::styled(format!("{:.4}", flow.last_price), value),
        ]),
        Line::from(vec![
            Span::styled("OCR          ", label),
            Span::styled(
                format!("{:.4}", flow.ratio),
                value.fg(ratio_colour(flow.ratio)),
            ),
        ]),
        Line::from(vec![
            Span::styled("Signal       ", label),
            Span::styled(snapshot.signal.label(), value.fg(signal_colour(snapshot.signal))),
        ]),
        Line::from(vec![
            Span::styled("Market buy   ", label),
            Span::styled(format!("{:.2}", flow.buy_volume), value.fg(GREEN)),
            Span::styled("   Market sell  ", label),
            Span::styled(format!("{:.2}", flow.sell_volume), value.fg(RED)),
        ]),
    ];

    lines.push(match &snapshot.depth {
        Some(depth) => Line::from(vec![
            Span::styled("Bid depth    ", label),
            Span::styled(format!("{:.2}", depth.bid_volume), value.fg(GREEN)),
            Span::styled("   Ask depth    ", label),
            Span::styled(format!("{:.2}", depth.ask_volume), value.fg(RED)),
        ]),
        None => Line::from(vec![
            Span::styled("Depth        ", label),
            Span::styled("waiting for first sample", Style::default().fg(GREY)),
        ]),
    });

    lines.push(Line::from(vec![
        Span::styled("Status       ", label),
        Span::styled(
            snapshot.status.to_string(),
            value.fg(status_colour(snapshot.status)),
        ),
        Span::styled("   Last update  ", label),
        Span::styled(last_update(snapshot), Style::default().fg(BLUE)),
    ]));

    lines.push(Line::from(vec![
        Span::styled("Trades       ", label),
        Span::styled(snapshot.stats.trades_applied.to_string(), Style::default().fg(TEXT)),
        Span::styled("   Dropped      ", label),
        Span::styled(
            snapshot.stats.malformed_messages.to_string(),
            Style::default().fg(TEXT),
        ),
        Span::styled("   Depth errors ", label),
        Span::styled(
            snapshot.stats.depth_failures.to_string(),
            Style::default().fg(TEXT),
        ),
    ]));

    if let Some(fault) = &snapshot.fault {
        lines.push(Line::from(vec![
            Span::styled("Fault        ", label),
            Span::styled(fault.clone(), Style::default().fg(RED).add_modifier(Modifier::BOLD)),
        ]));
    }

    let title = snapshot.symbol.as_deref().unwrap_or_default();
    let paragraph = Paragraph::new(Text::from(lines)).block(block(title, GOLD));
    f.render_widget(paragraph, area);
}

fn render_history(f: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
    let bars: Vec<Bar> = snapshot
        .history
        .iter()
        .map(|ratio| {
            let colour = if ratio.is_sign_negative() && !ratio.is_zero() {
                RED
            } else {
                GREEN
            };
            Bar::default()
                .value(bar_height(*ratio))
                .text_value(String::new())
                .style(Style::default().fg(colour))
        })
        .collect();

    let chart = BarChart::default()
        .block(block(
            &format!("OCR History ({})", snapshot.history.len()),
            BLUE,
        ))
        .data(BarGroup::default().bars(&bars))
        .bar_width(1)
        .bar_gap(0)
        .max(100);

    f.render_widget(chart, area);
}

/// Bar height for a ratio in `[-1, 1]`, as |ratio| in hundredths.
fn bar_height(ratio: Decimal) -> u64 {
    (ratio.abs() * Decimal::ONE_HUNDRED)
        .round()
        .to_u64()
        .unwrap_or_default()
}

fn ratio_colour(ratio: Decimal) -> Color {
    if ratio > OCR_HIGHLIGHT {
        GREEN
    } else if ratio < -OCR_HIGHLIGHT {
        RED
    } else {
        Color::White
    }
}

fn signal_colour(signal: Signal) -> Color {
    match signal {
        Signal::BuySignal => GREEN,
        Signal::SellSignal => RED,
        Signal::Neutral => GREY,
    }
}

fn status_colour(status: SessionStatus) -> Color {
    match status {
        SessionStatus::Running => GREEN,
        SessionStatus::Faulted => RED,
        SessionStatus::Starting | SessionStatus::Stopping => GOLD,
        SessionStatus::Idle => GREY,
    }
}

fn last_update(snapshot: &SessionSnapshot) -> String {
    match snapshot.last_update {
        Some(time) => {
            let age = (Utc::now() - time).num_seconds().max(0);
            format!("{} ({age}s ago)", time.with_timezone(&Local).format("%H:%M:%S"))
        }
        None => "-".to_string(),
    }
}
