use std::io;

use crossterm::tty::IsTty;
use ratatui::backend::CrosstermBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph, Row, Table, TableState, Widget,
    Wrap,
};
use ratatui::{Frame, Terminal, TerminalOptions, Viewport};

use crate::app::{App, Screen};
use crate::compare::{Comparison, MetricTable};
use crate::dashboard::{Dashboard, Histogram, PositionAverages};
use crate::notice::Notice;
use crate::profile::PlayerProfile;
use crate::scout::{DISPLAY_COLUMNS, ScoutControls, ScoutReport, Slider};
use crate::search::{SearchControls, SearchResult};
use crate::table::{PlayerTable, format_number};
use crate::watchlist::WatchlistEntry;

/// Width used when stdout is not a terminal.
pub const PLAIN_WIDTH: u16 = 120;

const PALETTE: [Color; 6] = [
    Color::Green,
    Color::Yellow,
    Color::Cyan,
    Color::Magenta,
    Color::Red,
    Color::Blue,
];

/// One block of one-shot output with the rows it needs.
pub enum Panel {
    Note(Paragraph<'static>, u16),
    Grid(Table<'static>, u16),
    Bars(BarChart<'static>, u16),
}

impl Panel {
    pub fn note(lines: Vec<Line<'static>>) -> Self {
        let height = lines.len() as u16;
        Panel::Note(Paragraph::new(lines).wrap(Wrap { trim: false }), height)
    }

    pub fn height(&self) -> u16 {
        match self {
            Panel::Note(_, h) | Panel::Grid(_, h) | Panel::Bars(_, h) => *h,
        }
    }
}

impl Widget for Panel {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self {
            Panel::Note(widget, _) => widget.render(area, buf),
            Panel::Grid(widget, _) => widget.render(area, buf),
            Panel::Bars(widget, _) => widget.render(area, buf),
        }
    }
}

/// Panels laid out top to bottom.
#[derive(Default)]
pub struct Stack(pub Vec<Panel>);

impl Stack {
    pub fn message(text: impl Into<String>) -> Self {
        Stack(vec![Panel::note(vec![Line::from(text.into())])])
    }

    pub fn push(&mut self, panel: Panel) {
        self.0.push(panel);
    }

    pub fn height(&self) -> u16 {
        self.0.iter().map(Panel::height).sum()
    }
}

impl Widget for Stack {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut constraints: Vec<Constraint> =
            self.0.iter().map(|p| Constraint::Length(p.height())).collect();
        constraints.push(Constraint::Min(0));
        let areas = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);
        for (panel, rect) in self.0.into_iter().zip(areas.iter()) {
            panel.render(*rect, buf);
        }
    }
}

/// Draw a stack below the prompt on a terminal, or as plain text otherwise.
pub fn print_stack(stack: Stack) -> io::Result<()> {
    let height = stack.height();
    if io::stdout().is_tty() {
        let (cols, rows) = crossterm::terminal::size()?;
        if height < rows {
            let mut terminal = Terminal::with_options(
                CrosstermBackend::new(io::stdout()),
                TerminalOptions {
                    viewport: Viewport::Inline(height),
                },
            )?;
            terminal.draw(|frame| frame.render_widget(stack, frame.size()))?;
            drop(terminal);
            println!();
            return Ok(());
        }
        print!("{}", render_to_text(stack, cols));
        return Ok(());
    }
    print!("{}", render_to_text(stack, PLAIN_WIDTH));
    Ok(())
}

pub fn render_to_text(stack: Stack, width: u16) -> String {
    let area = Rect::new(0, 0, width, stack.height());
    let mut buf = Buffer::empty(area);
    stack.render(area, &mut buf);
    buffer_text(&buf)
}

/// Buffer symbols row by row, trailing blanks trimmed.
pub fn buffer_text(buf: &Buffer) -> String {
    let area = buf.area;
    let mut out = String::new();
    for y in area.top()..area.bottom() {
        let mut line = String::new();
        for x in area.left()..area.right() {
            line.push_str(buf.get(x, y).symbol());
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn number(value: f64) -> String {
    format_number((value * 100.0).round() / 100.0)
}

fn titled(title: impl Into<String>) -> Block<'static> {
    Block::default().title(title.into()).borders(Borders::ALL)
}

fn header_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

fn highlight_style() -> Style {
    Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
}

fn column_widths(header: &[String], rows: &[Vec<String>]) -> Vec<Constraint> {
    let mut widths: Vec<u16> = header.iter().map(|h| h.chars().count() as u16).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let w = cell.chars().count() as u16;
            match widths.get_mut(idx) {
                Some(slot) => *slot = (*slot).max(w),
                None => widths.push(w),
            }
        }
    }
    widths.into_iter().map(|w| Constraint::Length(w.max(1))).collect()
}

/// Bordered table with a bold header; the height includes borders.
pub fn rows_table(
    title: impl Into<String>,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
) -> (Table<'static>, u16) {
    let widths = column_widths(&header, &rows);
    let height = rows.len() as u16 + 3;
    let table = Table::new(rows.into_iter().map(Row::new), widths)
        .header(Row::new(header).style(header_style()))
        .block(titled(title))
        .column_spacing(2)
        .highlight_style(highlight_style());
    (table, height)
}

pub fn player_table(title: impl Into<String>, table: &PlayerTable) -> (Table<'static>, u16) {
    let mut rows = table.to_string_rows();
    let header = if rows.is_empty() { Vec::new() } else { rows.remove(0) };
    rows_table(title, header, rows)
}

pub fn metric_table(title: impl Into<String>, metrics: &MetricTable) -> (Table<'static>, u16) {
    let mut header = vec!["Player".to_string()];
    header.extend(metrics.metrics.iter().cloned());
    let rows = metrics
        .rows
        .iter()
        .map(|row| {
            let mut line = vec![row.player.clone()];
            line.extend(row.values.iter().map(|v| number(*v)));
            line
        })
        .collect();
    rows_table(title, header, rows)
}

pub fn histogram_chart(histogram: &Histogram) -> (BarChart<'static>, u16) {
    let bars: Vec<Bar<'static>> = histogram
        .bins
        .iter()
        .map(|bin| {
            Bar::default()
                .value(bin.count as u64)
                .label(Line::from(format!(
                    "{}..{}",
                    number(bin.lower),
                    number(bin.upper)
                )))
                .text_value(bin.count.to_string())
                .style(Style::default().fg(Color::Cyan))
        })
        .collect();
    let height = bars.len() as u16 + 2;
    let chart = BarChart::default()
        .block(titled(format!("{} distribution", histogram.column)))
        .data(BarGroup::default().bars(&bars))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .group_gap(0);
    (chart, height)
}

/// One group per metric, one bar per player, on the 0..100 scale.
pub fn comparison_chart(normalized: &MetricTable) -> (BarChart<'static>, u16) {
    let mut chart = BarChart::default()
        .block(titled("Share of best (0-100)"))
        .bar_width(3)
        .bar_gap(1)
        .group_gap(3)
        .max(100);
    for (col, metric) in normalized.metrics.iter().enumerate() {
        let bars: Vec<Bar<'static>> = normalized
            .rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let value = row.values[col].max(0.0);
                Bar::default()
                    .value(value.round() as u64)
                    .text_value(format!("{value:.0}"))
                    .style(Style::default().fg(PALETTE[idx % PALETTE.len()]))
            })
            .collect();
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(metric.clone()))
                .bars(&bars),
        );
    }
    (chart, 14)
}

fn legend(players: &[String]) -> Line<'static> {
    let spans: Vec<Span<'static>> = players
        .iter()
        .enumerate()
        .flat_map(|(idx, name)| {
            [
                Span::styled("■ ", Style::default().fg(PALETTE[idx % PALETTE.len()])),
                Span::raw(format!("{name}  ")),
            ]
        })
        .collect();
    Line::from(spans)
}

fn notice_lines(notices: impl IntoIterator<Item = Notice>) -> Vec<Line<'static>> {
    notices
        .into_iter()
        .map(|n| Line::styled(n.message(), Style::default().fg(Color::Yellow)))
        .collect()
}

pub fn search_view(result: &SearchResult) -> Stack {
    let mut stack = Stack::default();
    let mut lines = vec![Line::from(format!("{} players found", result.total))];
    lines.extend(notice_lines(result.notice));
    stack.push(Panel::note(lines));
    if !result.rows.is_empty() {
        let (table, h) = player_table("Search", &result.rows.project(&DISPLAY_COLUMNS));
        stack.push(Panel::Grid(table, h));
    }
    stack
}

fn slider_line(label: &str, slider: &Slider) -> Line<'static> {
    Line::from(format!(
        "  {label}: {}..{} step {} (default {})",
        number(slider.min),
        number(slider.max),
        number(slider.step),
        number(slider.default)
    ))
}

pub fn controls_view(controls: &SearchControls, scout: &ScoutControls) -> Stack {
    let lines = vec![
        Line::from(format!("squads: {}", controls.squads.join(", "))),
        Line::from(format!("positions: {}", controls.positions.join(", "))),
        Line::from(format!(
            "age: {}..{} (default {}..{})",
            number(controls.age_domain.min),
            number(controls.age_domain.max),
            number(controls.age_default.min),
            number(controls.age_default.max)
        )),
        Line::from(format!(
            "market value: {}..{}",
            number(controls.market_value_bounds.min),
            number(controls.market_value_bounds.max)
        )),
        Line::from(format!("sort by: {}", controls.sort_columns.join(", "))),
        Line::from(""),
        Line::from(format!("scout ({}):", scout.tier.label())),
        slider_line("max age", &scout.max_age),
        slider_line("min minutes", &scout.min_minutes),
        slider_line("max market value", &scout.max_market_value),
        slider_line(scout.primary_column, &scout.primary),
        slider_line(scout.secondary_column, &scout.secondary),
    ];
    Stack(vec![Panel::note(lines)])
}

fn scout_summary(report: &ScoutReport) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(format!(
        "{} profile, ranked by {} | {} candidates",
        report.tier.label(),
        report.ranking.join(", "),
        report.total
    ))];
    lines.extend(notice_lines(report.notice));
    lines
}

pub fn scout_view(report: &ScoutReport) -> Stack {
    let mut stack = Stack(vec![Panel::note(scout_summary(report))]);
    if !report.candidates.is_empty() {
        let (table, h) = player_table("Candidates", &report.candidates);
        stack.push(Panel::Grid(table, h));
    }
    stack
}

pub fn comparison_view(comparison: &Comparison) -> Stack {
    let mut stack = Stack::default();
    if !comparison.notices.is_empty() {
        stack.push(Panel::note(notice_lines(comparison.notices.iter().copied())));
    }
    if comparison.raw.rows.is_empty() {
        return stack;
    }
    let (table, h) = metric_table("Raw", &comparison.raw);
    stack.push(Panel::Grid(table, h));
    if let Some(normalized) = &comparison.normalized {
        let players: Vec<String> = normalized.rows.iter().map(|r| r.player.clone()).collect();
        stack.push(Panel::note(vec![legend(&players)]));
        let (chart, h) = comparison_chart(normalized);
        stack.push(Panel::Bars(chart, h));
    }
    if let Some(points) = &comparison.scatter {
        let header = ["Player", "xG", "Gls", "Min"].map(str::to_string).to_vec();
        let rows = points
            .iter()
            .map(|p| vec![p.player.clone(), number(p.xg), number(p.goals), number(p.minutes)])
            .collect();
        let (table, h) = rows_table("xG vs goals", header, rows);
        stack.push(Panel::Grid(table, h));
    }
    stack
}

fn baseline_table(profile: &PlayerProfile) -> (Table<'static>, u16) {
    let header = vec![
        "Metric".to_string(),
        profile.player.clone(),
        format!("{} avg ({})", profile.group, profile.group_size),
    ];
    let rows = profile
        .baseline
        .iter()
        .map(|b| {
            vec![
                b.metric.clone(),
                b.player.map(number).unwrap_or_default(),
                number(b.group_average),
            ]
        })
        .collect();
    rows_table("Against position average", header, rows)
}

pub fn profile_view(profile: &PlayerProfile) -> Stack {
    let mut stack = Stack::default();
    let (card, h) = player_table(profile.player.clone(), &profile.card);
    stack.push(Panel::Grid(card, h));
    let (stats, h) = player_table("Stats", &profile.stats);
    stack.push(Panel::Grid(stats, h));
    if let Some(notice) = profile.notice {
        stack.push(Panel::note(notice_lines([notice])));
    }
    if profile.radar_ready() {
        let (table, h) = baseline_table(profile);
        stack.push(Panel::Grid(table, h));
    }
    stack
}

fn averages_table(averages: &PositionAverages) -> (Table<'static>, u16) {
    let mut header = vec!["Pos".to_string()];
    header.extend(averages.metrics.iter().map(|m| m.to_string()));
    let rows = averages
        .rows
        .iter()
        .map(|row| {
            let mut line = vec![row.position.clone()];
            line.extend(row.values.iter().map(|v| number(*v)));
            line
        })
        .collect();
    rows_table("Averages by position", header, rows)
}

pub fn dashboard_view(dashboard: &Dashboard) -> Stack {
    let mut stack = Stack(vec![Panel::note(vec![Line::from(format!(
        "{} players",
        dashboard.players
    ))])]);
    for board in &dashboard.leaderboards {
        let (table, h) = player_table(format!("Top {}", board.metric), &board.rows);
        stack.push(Panel::Grid(table, h));
    }
    if let Some(averages) = &dashboard.position_averages {
        let (table, h) = averages_table(averages);
        stack.push(Panel::Grid(table, h));
    }
    for histogram in &dashboard.histograms {
        let (chart, h) = histogram_chart(histogram);
        stack.push(Panel::Bars(chart, h));
    }
    stack
}

fn watchlist_table(entries: &[WatchlistEntry]) -> (Table<'static>, u16) {
    let header = vec!["Player".to_string(), "Notes".to_string()];
    let rows = entries
        .iter()
        .map(|e| vec![e.player.clone(), e.notes.clone()])
        .collect();
    rows_table("Watchlist", header, rows)
}

pub fn watchlist_view(entries: &[WatchlistEntry]) -> Stack {
    if entries.is_empty() {
        return Stack::message(Notice::EmptyWatchlist.message());
    }
    let (table, h) = watchlist_table(entries);
    Stack(vec![Panel::Grid(table, h)])
}

pub fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.screen {
        Screen::Search => render_search(frame, chunks[1], app),
        Screen::Scout => render_scout(frame, chunks[1], app),
        Screen::Compare => render_compare(frame, chunks[1], app),
        Screen::Profile => render_profile(frame, chunks[1], app),
        Screen::Dashboard => render_dashboard(frame, chunks[1], app),
        Screen::Watchlist => render_watchlist(frame, chunks[1], app),
    }

    let footer = Paragraph::new(footer_text(app)).block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if app.help_overlay {
        let area = frame.size();
        render_help_overlay(frame, area);
    }
}

fn header_text(app: &App) -> Line<'static> {
    let mut spans = vec![Span::styled(
        " SCOUTBASE ",
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for (idx, screen) in Screen::ALL.iter().enumerate() {
        let style = if *screen == app.screen {
            Style::default().fg(Color::Black).bg(Color::Green)
        } else {
            Style::default()
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(format!("{} {}", idx + 1, screen.label()), style));
    }
    Line::from(spans)
}

fn footer_text(app: &App) -> String {
    let keys = match app.screen {
        Screen::Search => "j/k Move | p Pos | t Squad | s Sort | r Reverse | c Compare | w Watch | Enter Profile",
        Screen::Scout => "j/k Move | p Target | c Compare | w Watch | Enter Profile",
        Screen::Compare => "j/k Move | x Remove | Enter Profile",
        Screen::Profile => "c Compare | w Watch | b Back",
        Screen::Dashboard => "b Back",
        Screen::Watchlist => "j/k Move | x Remove | Enter Profile",
    };
    match &app.status {
        Some(status) => format!("{keys} | ? Help | q Quit | {status}"),
        None => format!("{keys} | ? Help | q Quit"),
    }
}

fn render_selectable(frame: &mut Frame, area: Rect, table: Table<'static>, selected: usize) {
    let mut state = TableState::default();
    state.select(Some(selected));
    frame.render_stateful_widget(table, area, &mut state);
}

fn split_summary(area: Rect, lines: u16) -> (Rect, Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(lines), Constraint::Min(1)])
        .split(area);
    (parts[0], parts[1])
}

fn render_search(frame: &mut Frame, area: Rect, app: &App) {
    let result = app.search_result();
    let sort = app
        .filter
        .sort
        .as_ref()
        .map(|s| format!("{} {}", s.column, if s.ascending { "asc" } else { "desc" }))
        .unwrap_or_else(|| "none".to_string());
    let mut lines = vec![Line::from(format!(
        "Pos: {} | Squad: {} | Sort: {} | {} players",
        app.filter.position.label(),
        app.filter.squad.label(),
        sort,
        result.total
    ))];
    lines.extend(notice_lines(result.notice));
    let (top, bottom) = split_summary(area, lines.len() as u16);
    frame.render_widget(Paragraph::new(lines), top);
    let (table, _) = player_table("Search", &result.rows.project(&DISPLAY_COLUMNS));
    render_selectable(frame, bottom, table, app.selected);
}

fn render_scout(frame: &mut Frame, area: Rect, app: &App) {
    let controls = app.scout_controls();
    let report = app.scout_report();
    let mut lines = vec![Line::from(format!(
        "Target: {} | age <= {} | min >= {} | value <= {} | {} >= {} | {} >= {}",
        controls.target.label(),
        number(controls.max_age.default),
        number(controls.min_minutes.default),
        number(controls.max_market_value.default),
        controls.primary_column,
        number(controls.primary.default),
        controls.secondary_column,
        number(controls.secondary.default),
    ))];
    lines.extend(scout_summary(&report));
    let (top, bottom) = split_summary(area, lines.len() as u16);
    frame.render_widget(Paragraph::new(lines), top);
    let (table, _) = player_table("Candidates", &report.candidates);
    render_selectable(frame, bottom, table, app.selected);
}

fn render_compare(frame: &mut Frame, area: Rect, app: &App) {
    if app.compare_names.is_empty() {
        let hint = Paragraph::new("No players selected. Press c on a player in Search or Scout.")
            .block(titled("Compare"));
        frame.render_widget(hint, area);
        return;
    }
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(1)])
        .split(area);
    let rows = app.compare_names.iter().map(|n| vec![n.clone()]).collect();
    let (list, _) = rows_table("Selected", vec!["Player".to_string()], rows);
    render_selectable(frame, cols[0], list, app.selected);
    frame.render_widget(comparison_view(&app.comparison()), cols[1]);
}

fn render_profile(frame: &mut Frame, area: Rect, app: &App) {
    match app.profile() {
        Some(found) => frame.render_widget(profile_view(&found), area),
        None => {
            let message = if app.profile_name.is_some() {
                Notice::PlayerNotFound.message()
            } else {
                "Press Enter on a player to open a profile."
            };
            frame.render_widget(Paragraph::new(message).block(titled("Profile")), area);
        }
    }
}

fn render_dashboard(frame: &mut Frame, area: Rect, app: &App) {
    let overview = app.overview();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(1)])
        .split(area);

    let boards = overview.leaderboards.len().max(1) as u32;
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints((0..boards).map(|_| Constraint::Ratio(1, boards)))
        .split(rows[0]);
    for (board, rect) in overview.leaderboards.iter().zip(top.iter()) {
        let (table, _) = player_table(format!("Top {}", board.metric), &board.rows);
        frame.render_widget(table, *rect);
    }

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(34), Constraint::Percentage(33), Constraint::Percentage(33)])
        .split(rows[1]);
    if let Some(averages) = &overview.position_averages {
        let (table, _) = averages_table(averages);
        frame.render_widget(table, bottom[0]);
    }
    for (histogram, rect) in overview.histograms.iter().zip(bottom.iter().skip(1)) {
        let (chart, _) = histogram_chart(histogram);
        frame.render_widget(chart, *rect);
    }
}

fn render_watchlist(frame: &mut Frame, area: Rect, app: &App) {
    if app.entries.is_empty() {
        let empty = Paragraph::new(Notice::EmptyWatchlist.message()).block(titled("Watchlist"));
        frame.render_widget(empty, area);
        return;
    }
    let (table, _) = watchlist_table(&app.entries);
    render_selectable(frame, area, table, app.selected);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "ScoutBase - Help",
        "",
        "Global:",
        "  1-6          Switch screen",
        "  b / Esc      Back to search",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Lists:",
        "  j/k or ↑/↓   Move",
        "  Enter / o    Open profile",
        "  c            Add to / drop from comparison",
        "  w            Add to watchlist",
        "  x / Del      Remove (watchlist, comparison)",
        "",
        "Search:",
        "  p / t        Cycle position / squad",
        "  s / r        Cycle sort column / reverse",
    ]
    .join("\n");

    let help = Paragraph::new(text).block(titled("Help"));
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
