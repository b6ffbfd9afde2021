// Terminal browser over one pipeline run: Gold rows, ranking, location stats

use crate::lakehouse::GoldOutput;
use crate::prescriptive::Recommendation;
use crate::record::{Affordability, GoldRecord, LocationStats, ScoredRecord};
use crate::report::{format_optional_rupiah, format_rupiah};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::cmp::Ordering;
use std::io;

/// Rows shown in the ranking page
pub const RANKING_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Gold,
    Ranking,
    Locations,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Gold => Page::Ranking,
            Page::Ranking => Page::Locations,
            Page::Locations => Page::Gold,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Gold => Page::Locations,
            Page::Ranking => Page::Gold,
            Page::Locations => Page::Ranking,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Gold => "Gold",
            Page::Ranking => "Ranking",
            Page::Locations => "Locations",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Name,
    Location,
    Total,
    Affordability,
    Score,
}

impl SortColumn {
    pub fn from_key(c: char) -> Option<Self> {
        match c {
            '1' => Some(SortColumn::Name),
            '2' => Some(SortColumn::Location),
            '3' => Some(SortColumn::Total),
            '4' => Some(SortColumn::Affordability),
            '5' => Some(SortColumn::Score),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortColumn::Name => "Concert",
            SortColumn::Location => "Location",
            SortColumn::Total => "Total",
            SortColumn::Affordability => "Affordability",
            SortColumn::Score => "Score",
        }
    }
}

/// Columns shared by Gold and ranked rows
pub trait ConcertRow {
    fn name(&self) -> &str;
    fn location(&self) -> Option<&str>;
    fn total(&self) -> f64;
    fn affordability(&self) -> Affordability;
    /// Prescriptive score, absent before ranking
    fn score(&self) -> Option<f64>;
}

impl ConcertRow for GoldRecord {
    fn name(&self) -> &str {
        &self.name
    }
    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
    fn total(&self) -> f64 {
        self.total
    }
    fn affordability(&self) -> Affordability {
        self.affordability
    }
    fn score(&self) -> Option<f64> {
        None
    }
}

impl ConcertRow for ScoredRecord {
    fn name(&self) -> &str {
        &self.name
    }
    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
    fn total(&self) -> f64 {
        self.total
    }
    fn affordability(&self) -> Affordability {
        self.affordability
    }
    fn score(&self) -> Option<f64> {
        Some(self.prescriptive_score)
    }
}

fn affordability_rank(a: Affordability) -> usize {
    Affordability::ALL.iter().position(|b| *b == a).unwrap_or(0)
}

fn compare<R: ConcertRow>(a: &R, b: &R, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Name => a.name().cmp(b.name()),
        SortColumn::Location => a.location().cmp(&b.location()),
        SortColumn::Total => a.total().total_cmp(&b.total()),
        SortColumn::Affordability => {
            affordability_rank(a.affordability()).cmp(&affordability_rank(b.affordability()))
        }
        // Unscored rows count as 0
        SortColumn::Score => a.score().unwrap_or(0.0).total_cmp(&b.score().unwrap_or(0.0)),
    }
}

pub fn sort_rows<R: ConcertRow>(rows: &mut [R], column: SortColumn, descending: bool) {
    rows.sort_by(|a, b| {
        let ord = compare(a, b, column);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
}

pub fn affordability_color(a: Affordability) -> Color {
    match a {
        Affordability::VeryAffordable => Color::Green,
        Affordability::Affordable => Color::Cyan,
        Affordability::AtLimit => Color::Yellow,
        Affordability::NotAffordable => Color::Red,
    }
}

pub struct App {
    pub gold: Vec<GoldRecord>,
    pub ranked: Vec<ScoredRecord>,
    pub locations: Vec<LocationStats>,
    pub optimal: Option<ScoredRecord>,
    pub budget: f64,
    pub current_page: Page,
    pub gold_state: TableState,
    pub ranking_state: TableState,
    pub location_state: TableState,
    pub show_detail: bool,
    /// Last sort applied to the current page; `true` means descending
    pub sort: Option<(SortColumn, bool)>,
}

impl App {
    pub fn new(gold: &GoldOutput, recommendation: Option<&Recommendation>, budget: f64) -> Self {
        let ranked: Vec<ScoredRecord> = recommendation
            .map(|rec| rec.top(RANKING_ROWS).to_vec())
            .unwrap_or_default();

        let mut app = Self {
            gold: gold.records.clone(),
            ranked,
            locations: gold.location_stats.clone(),
            optimal: recommendation.map(|rec| rec.optimal.clone()),
            budget,
            current_page: Page::Gold,
            gold_state: TableState::default(),
            ranking_state: TableState::default(),
            location_state: TableState::default(),
            show_detail: false,
            sort: None,
        };

        for page in [Page::Gold, Page::Ranking, Page::Locations] {
            if app.page_len(page) > 0 {
                app.state_mut(page).select(Some(0));
            }
        }
        app
    }

    pub fn page_len(&self, page: Page) -> usize {
        match page {
            Page::Gold => self.gold.len(),
            Page::Ranking => self.ranked.len(),
            Page::Locations => self.locations.len(),
        }
    }

    fn state_mut(&mut self, page: Page) -> &mut TableState {
        match page {
            Page::Gold => &mut self.gold_state,
            Page::Ranking => &mut self.ranking_state,
            Page::Locations => &mut self.location_state,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        match self.current_page {
            Page::Gold => self.gold_state.selected(),
            Page::Ranking => self.ranking_state.selected(),
            Page::Locations => self.location_state.selected(),
        }
    }

    fn select(&mut self, index: Option<usize>) {
        let page = self.current_page;
        self.state_mut(page).select(index);
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
        self.sort = None;
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
        self.sort = None;
    }

    /// Same column again flips direction; a new column starts ascending
    pub fn toggle_sort(&mut self, column: SortColumn) {
        let descending = match self.sort {
            Some((current, desc)) if current == column => !desc,
            _ => false,
        };
        self.sort = Some((column, descending));

        match self.current_page {
            Page::Gold => sort_rows(&mut self.gold, column, descending),
            Page::Ranking => sort_rows(&mut self.ranked, column, descending),
            Page::Locations => sort_locations(&mut self.locations, column, descending),
        }
        if self.page_len(self.current_page) > 0 {
            self.select(Some(0));
        }
    }

    pub fn next(&mut self) {
        let len = self.page_len(self.current_page);
        if len == 0 {
            return;
        }
        let i = match self.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.page_len(self.current_page);
        if len == 0 {
            return;
        }
        let i = match self.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.page_len(self.current_page);
        if len == 0 {
            return;
        }
        let i = self.selected().map(|i| (i + 20).min(len - 1)).unwrap_or(0);
        self.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = self.selected().map(|i| i.saturating_sub(20)).unwrap_or(0);
        self.select(Some(i));
    }

    pub fn home(&mut self) {
        if self.page_len(self.current_page) > 0 {
            self.select(Some(0));
        }
    }

    pub fn end(&mut self) {
        let len = self.page_len(self.current_page);
        if len > 0 {
            self.select(Some(len - 1));
        }
    }
}

/// Location page: Name and Location both sort by location, Total by mean,
/// Score by count
fn sort_locations(rows: &mut [LocationStats], column: SortColumn, descending: bool) {
    rows.sort_by(|a, b| {
        let ord = match column {
            SortColumn::Name | SortColumn::Location | SortColumn::Affordability => {
                a.location.cmp(&b.location)
            }
            SortColumn::Total => a.mean.total_cmp(&b.mean),
            SortColumn::Score => a.count.cmp(&b.count),
        };
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
}

pub fn run_ui(app: &mut App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char(c) if SortColumn::from_key(c).is_some() => {
                    if let Some(column) = SortColumn::from_key(c) {
                        app.toggle_sort(column);
                    }
                }
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.home(),
                KeyCode::End => app.end(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let content = if app.show_detail && app.current_page != Page::Locations {
        let split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);
        render_detail_panel(f, split[1], app);
        split[0]
    } else {
        chunks[1]
    };

    match app.current_page {
        Page::Gold => render_gold(f, content, app),
        Page::Ranking => render_ranking(f, content, app),
        Page::Locations => render_locations(f, content, app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![];
    for (i, page) in [Page::Gold, Page::Ranking, Page::Locations].iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(page.title().to_string(), style));
    }

    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Budget: {}", format_rupiah(app.budget)),
        Style::default().fg(Color::White),
    ));
    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Concerts: {}", app.gold.len()),
        Style::default().fg(Color::White),
    ));
    if let Some(optimal) = &app.optimal {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            format!("Optimal: {}", optimal.name),
            Style::default().fg(Color::Green),
        ));
    }

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(header, area);
}

fn header_row(titles: &[&str], sort: Option<(SortColumn, bool)>) -> Row<'static> {
    let cells = titles.iter().enumerate().map(|(i, title)| {
        let marker = match sort {
            Some((column, desc)) if column_index(column) == i => {
                if desc {
                    " ▼"
                } else {
                    " ▲"
                }
            }
            _ => "",
        };
        Cell::from(format!("{}{}", title, marker)).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    Row::new(cells.collect::<Vec<_>>())
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn column_index(column: SortColumn) -> usize {
    match column {
        SortColumn::Name => 0,
        SortColumn::Location => 1,
        SortColumn::Total => 2,
        SortColumn::Affordability => 3,
        SortColumn::Score => 4,
    }
}

fn concert_rows<R: ConcertRow>(rows: &[R]) -> Vec<Row<'static>> {
    rows.iter()
        .map(|row| {
            let color = affordability_color(row.affordability());
            Row::new(vec![
                Cell::from(row.name().to_string()),
                Cell::from(row.location().unwrap_or("-").to_string()),
                Cell::from(format_rupiah(row.total())),
                Cell::from(row.affordability().label()).style(Style::default().fg(color)),
                Cell::from(
                    row.score()
                        .map(|s| format!("{:.3}", s))
                        .unwrap_or_else(|| "-".to_string()),
                ),
            ])
            .height(1)
        })
        .collect()
}

fn concert_table(rows: Vec<Row<'static>>, header: Row<'static>, title: String) -> Table<'static> {
    Table::new(
        rows,
        [
            Constraint::Min(24),
            Constraint::Length(18),
            Constraint::Length(16),
            Constraint::Length(16),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ")
}

const CONCERT_COLUMNS: [&str; 5] = ["Concert", "Location", "Total", "Affordability", "Score"];

fn render_gold(f: &mut Frame, area: Rect, app: &mut App) {
    let table = concert_table(
        concert_rows(&app.gold),
        header_row(&CONCERT_COLUMNS, app.sort),
        " Gold - All Concerts ".to_string(),
    );
    f.render_stateful_widget(table, area, &mut app.gold_state);
}

fn render_ranking(f: &mut Frame, area: Rect, app: &mut App) {
    if app.ranked.is_empty() {
        let empty = Paragraph::new("  No concert fits the budget").block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Ranking "),
        );
        f.render_widget(empty, area);
        return;
    }

    let table = concert_table(
        concert_rows(&app.ranked),
        header_row(&CONCERT_COLUMNS, app.sort),
        format!(" Ranking - Top {} ", app.ranked.len()),
    );
    f.render_stateful_widget(table, area, &mut app.ranking_state);
}

fn render_locations(f: &mut Frame, area: Rect, app: &mut App) {
    let header = header_row(&["Location", "", "Mean", "", "Count"], app.sort);
    let rows = app.locations.iter().map(|s| {
        Row::new(vec![
            Cell::from(s.location.clone()),
            Cell::from(format!("min {}", format_rupiah(s.min))),
            Cell::from(format_rupiah(s.mean)),
            Cell::from(format!("max {}", format_rupiah(s.max))),
            Cell::from(s.count.to_string()),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(20),
            Constraint::Length(16),
            Constraint::Length(20),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Locations - Total Expenditure "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.location_state);
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("  {}: ", label),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(value),
    ])
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Concert Details ");

    let selected = app.selected();
    let (record, scored): (Option<&GoldRecord>, Option<&ScoredRecord>) = match app.current_page {
        Page::Gold => (selected.and_then(|i| app.gold.get(i)), None),
        Page::Ranking => (None, selected.and_then(|i| app.ranked.get(i))),
        Page::Locations => (None, None),
    };

    let mut content = vec![Line::from("")];
    if let Some(r) = record {
        content.extend(detail_lines(
            &r.name,
            r.location.as_deref(),
            r.date,
            [r.ticket_price, r.transport_cost, r.accommodation_cost, r.merchandise],
            r.total,
            r.efficiency_score,
            r.affordability,
        ));
    } else if let Some(s) = scored {
        content.extend(detail_lines(
            &s.name,
            s.location.as_deref(),
            s.date,
            [s.ticket_price, s.transport_cost, s.accommodation_cost, s.merchandise],
            s.total,
            s.efficiency_score,
            s.affordability,
        ));
        content.push(Line::from("  ─────────────────────────────────────"));
        content.push(Line::from(vec![Span::styled(
            "  SCORE",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )]));
        content.push(field("Budget left", format_rupiah(s.sisa_budget)));
        content.push(field("Cost efficiency", format!("{:.2}", s.score_cost)));
        content.push(field("Budget remaining", format!("{:.2}", s.score_remaining)));
        content.push(field("Experience value", format!("{:.2}", s.score_experience)));
        content.push(field("Prescriptive", format!("{:.3}", s.prescriptive_score)));
    } else {
        content.push(Line::from("  No concert selected"));
    }

    content.push(Line::from(""));
    content.push(Line::from(vec![Span::styled(
        "  Press Enter to close",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )]));

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn detail_lines(
    name: &str,
    location: Option<&str>,
    date: Option<chrono::NaiveDate>,
    costs: [Option<f64>; 4],
    total: f64,
    efficiency: f64,
    affordability: Affordability,
) -> Vec<Line<'static>> {
    let [ticket, transport, accommodation, merchandise] = costs;
    vec![
        field("Concert", name.to_string()),
        field("Location", location.unwrap_or("-").to_string()),
        field(
            "Date",
            date.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
        Line::from(""),
        field("Ticket", format_optional_rupiah(ticket)),
        field("Transport", format_optional_rupiah(transport)),
        field("Accommodation", format_optional_rupiah(accommodation)),
        field("Merchandise", format_optional_rupiah(merchandise)),
        field("Total", format_rupiah(total)),
        Line::from(""),
        field("Efficiency", format!("{:.3}", efficiency)),
        Line::from(vec![
            Span::styled(
                "  Affordability: ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                affordability.label(),
                Style::default().fg(affordability_color(affordability)),
            ),
        ]),
    ]
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.page_len(app.current_page);

    let mut spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if let Some((column, desc)) = app.sort {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("Sort: {} {}", column.label(), if desc { "desc" } else { "asc" }),
            Style::default().fg(Color::Green),
        ));
    }

    for (key, action, color) in [
        ("1-5", " Sort", Color::Yellow),
        ("Enter", " Details", Color::Yellow),
        ("Tab", " Page", Color::Yellow),
        ("↑/↓", " Nav", Color::Yellow),
        ("q", " Quit", Color::Red),
    ] {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(key, Style::default().fg(color)));
        spans.push(Span::raw(action));
    }

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(status_bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lakehouse::derive_gold;
    use crate::prescriptive::PrescriptiveEngine;
    use crate::record::ConcertRecord;

    fn output() -> GoldOutput {
        let silver: Vec<ConcertRecord> = [
            ("BTS", "Jakarta", 2_500_000.0),
            ("IU", "Bandung", 900_000.0),
            ("Twice", "Jakarta", 4_000_000.0),
        ]
        .iter()
        .map(|(name, location, total)| ConcertRecord {
            name: name.to_string(),
            location: Some(location.to_string()),
            date: None,
            ticket_price: None,
            transport_cost: None,
            accommodation_cost: None,
            merchandise: Some(100_000.0),
            total: *total,
        })
        .collect();
        derive_gold(&silver, 3_000_000.0)
    }

    fn app() -> App {
        let gold = output();
        let rec = PrescriptiveEngine::new(&gold.records, 3_000_000.0).calc_scores();
        App::new(&gold, rec.as_ref(), 3_000_000.0)
    }

    #[test]
    fn test_new_selects_first_rows() {
        let app = app();

        assert_eq!(app.current_page, Page::Gold);
        assert_eq!(app.selected(), Some(0));
        assert_eq!(app.ranked.len(), 2, "Twice is over budget");
        assert_eq!(app.ranking_state.selected(), Some(0));
        assert_eq!(app.optimal.as_ref().map(|o| o.name.as_str()), Some("IU"));
    }

    #[test]
    fn test_sort_toggles_direction() {
        let mut app = app();

        app.toggle_sort(SortColumn::Total);
        let totals: Vec<f64> = app.gold.iter().map(|r| r.total).collect();
        assert_eq!(totals, vec![900_000.0, 2_500_000.0, 4_000_000.0]);

        app.toggle_sort(SortColumn::Total);
        assert_eq!(app.sort, Some((SortColumn::Total, true)));
        assert_eq!(app.gold[0].name, "Twice");

        app.toggle_sort(SortColumn::Name);
        assert_eq!(app.sort, Some((SortColumn::Name, false)));
        assert_eq!(app.gold[0].name, "BTS");
    }

    #[test]
    fn test_sort_ranking_by_score() {
        let mut app = app();
        app.next_page();
        assert_eq!(app.current_page, Page::Ranking);
        assert_eq!(app.sort, None);

        app.toggle_sort(SortColumn::Score);
        assert!(app.ranked[0].prescriptive_score <= app.ranked[1].prescriptive_score);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = app();

        app.previous();
        assert_eq!(app.selected(), Some(2));
        app.next();
        assert_eq!(app.selected(), Some(0));
        app.page_down();
        assert_eq!(app.selected(), Some(2));
        app.page_up();
        assert_eq!(app.selected(), Some(0));
        app.end();
        assert_eq!(app.selected(), Some(2));
    }

    #[test]
    fn test_pages_cycle() {
        assert_eq!(Page::Gold.next().next().next(), Page::Gold);
        assert_eq!(Page::Gold.previous(), Page::Locations);
    }

    #[test]
    fn test_empty_recommendation() {
        let gold = output();
        let app = App::new(&gold, None, 1.0);

        assert!(app.ranked.is_empty());
        assert!(app.optimal.is_none());
        assert_eq!(app.ranking_state.selected(), None);
    }
}
