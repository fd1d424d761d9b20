use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::collections::BTreeSet;
use std::io::{self, Stdout};
use std::path::PathBuf;

use tally_core::{format_amount, Category, PieChart, SessionState, TallyError};
use tally_session::Session;
use tracing::info;

const CHART_BAR_WIDTH: usize = 40;

const SLICE_COLORS: [Color; 6] = [
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::Green,
    Color::Blue,
    Color::Red,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    OpenStatement,
    OpenSnapshot,
    SaveAs,
}

impl PromptKind {
    fn title(&self) -> &'static str {
        match self {
            PromptKind::OpenStatement => "statement CSV path",
            PromptKind::OpenSnapshot => "snapshot CSV path",
            PromptKind::SaveAs => "save snapshot as",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Browse,
    Prompt(PromptKind),
    /// Blocking message; any key dismisses
    Message(String),
    /// Yes/no: resume the previous snapshot?
    ConfirmRestore,
    Chart(PieChart),
}

pub struct App {
    session: Session,
    cursor: usize,
    selected: BTreeSet<usize>,
    category: Category,
    mode: Mode,
    input: String,
    status: String,
    quit: bool,
}

impl App {
    pub fn new(session: Session, category: Category) -> Self {
        Self {
            session,
            cursor: 0,
            selected: BTreeSet::new(),
            category,
            mode: Mode::Browse,
            input: String::new(),
            status: String::new(),
            quit: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn selected(&self) -> Vec<usize> {
        self.selected.iter().copied().collect()
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn ask_restore(&mut self) {
        self.mode = Mode::ConfirmRestore;
    }

    pub fn open_statement(&mut self, path: PathBuf) {
        match self.session.load_statement(&path) {
            Ok(summary) => {
                self.reset_selection();
                self.status = format!(
                    "Loaded {} rows from {}",
                    summary.record_count,
                    path.display()
                );
            }
            Err(e) => self.mode = Mode::Message(format!("Load failed: {e}")),
        }
    }

    pub fn open_snapshot(&mut self, path: Option<PathBuf>) {
        let result = match &path {
            Some(p) => self.session.restore_from(p),
            None => self.session.restore(),
        };
        match result {
            Ok(summary) => {
                self.reset_selection();
                self.status = format!("Restored {} rows", summary.record_count);
            }
            Err(e) => self.mode = Mode::Message(e.to_string()),
        }
    }

    fn reset_selection(&mut self) {
        self.cursor = 0;
        self.selected.clear();
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        match std::mem::replace(&mut self.mode, Mode::Browse) {
            Mode::Browse => self.handle_browse(code),
            Mode::Prompt(kind) => self.handle_prompt(kind, code),
            Mode::ConfirmRestore => match code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.open_snapshot(None),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {}
                _ => self.mode = Mode::ConfirmRestore,
            },
            Mode::Message(_) | Mode::Chart(_) => {}
        }
    }

    fn handle_browse(&mut self, code: KeyCode) {
        let len = self.session.records().len();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor + 1 < len {
                    self.cursor += 1;
                }
            }
            KeyCode::Char(' ') => {
                if self.cursor < len && !self.selected.remove(&self.cursor) {
                    self.selected.insert(self.cursor);
                }
            }
            KeyCode::Char('a') => self.selected = (0..len).collect(),
            KeyCode::Char('c') => self.selected.clear(),
            KeyCode::Left | KeyCode::Char('h') => self.category = self.category.prev(),
            KeyCode::Right | KeyCode::Char('l') => self.category = self.category.next(),
            KeyCode::Enter => self.assign_selected(),
            KeyCode::Char('p') => self.show_chart(),
            KeyCode::Char('s') => match self.session.save() {
                Ok(path) => self.status = format!("Saved {}", path.display()),
                Err(e) => self.mode = Mode::Message(e.to_string()),
            },
            KeyCode::Char('o') => self.start_prompt(PromptKind::OpenStatement),
            KeyCode::Char('r') => self.start_prompt(PromptKind::OpenSnapshot),
            KeyCode::Char('w') => self.start_prompt(PromptKind::SaveAs),
            _ => {}
        }
    }

    fn start_prompt(&mut self, kind: PromptKind) {
        self.input.clear();
        self.mode = Mode::Prompt(kind);
    }

    fn handle_prompt(&mut self, kind: PromptKind, code: KeyCode) {
        match code {
            KeyCode::Esc => self.input.clear(),
            KeyCode::Enter => {
                let path = PathBuf::from(self.input.trim());
                self.input.clear();
                if path.as_os_str().is_empty() {
                    return;
                }
                match kind {
                    PromptKind::OpenStatement => self.open_statement(path),
                    PromptKind::OpenSnapshot => self.open_snapshot(Some(path)),
                    PromptKind::SaveAs => match self.session.save_to(&path) {
                        Ok(p) => self.status = format!("Saved {}", p.display()),
                        Err(e) => self.mode = Mode::Message(e.to_string()),
                    },
                }
            }
            KeyCode::Backspace => {
                self.input.pop();
                self.mode = Mode::Prompt(kind);
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                self.mode = Mode::Prompt(kind);
            }
            _ => self.mode = Mode::Prompt(kind),
        }
    }

    fn assign_selected(&mut self) {
        if self.session.is_empty() {
            return;
        }
        if self.selected.is_empty() {
            self.mode = Mode::Message("Select rows first (Space, or a for all)".to_string());
            return;
        }
        let rows = self.selected();
        match self.session.assign(&rows, self.category) {
            Ok(outcome) => {
                self.status = format!(
                    "Tagged {} row(s) as {}",
                    outcome.report.applied.len(),
                    self.category
                );
                if let Some(e) = outcome.snapshot_error {
                    self.mode = Mode::Message(e.to_string());
                }
            }
            Err(e) => self.mode = Mode::Message(e.to_string()),
        }
    }

    fn show_chart(&mut self) {
        self.mode = match self.session.chart() {
            Ok(chart) => Mode::Chart(chart),
            Err(TallyError::NoData) => Mode::Message("Nothing to chart yet.".to_string()),
            Err(TallyError::IncompleteCategorization { uncategorized }) => Mode::Message(format!(
                "Assign a category to every row first ({uncategorized} left)."
            )),
            Err(e) => Mode::Message(e.to_string()),
        };
    }
}

pub fn run_tui(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = event_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!(state = ?app.session().state(), "tui closed");
    res
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    while !app.should_quit() {
        terminal.draw(|f| draw(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                app.handle_key(key.code);
            }
        }
    }
    Ok(())
}

fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(2),
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(34)])
        .split(chunks[1]);
    draw_table(f, app, body[0]);
    draw_summary(f, app, body[1]);

    draw_categories(f, app, chunks[2]);
    draw_footer(f, app, chunks[3]);

    match &app.mode {
        Mode::Message(msg) => draw_modal(f, "notice", msg, "press any key"),
        Mode::ConfirmRestore => draw_modal(
            f,
            "previous session",
            "A snapshot from last time exists. Load it?",
            "y / n",
        ),
        Mode::Chart(chart) => draw_chart(f, chart),
        Mode::Browse | Mode::Prompt(_) => {}
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let session = app.session();
    let source = session
        .source()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(no file)".to_string());
    let state = match session.state() {
        SessionState::Empty => "empty",
        SessionState::Loaded => "loaded",
        SessionState::Categorized => "categorizing",
        SessionState::ChartReady => "ready to chart",
    };

    let line = Line::from(vec![
        Span::styled(
            "tally ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("payment month: {} ", session.payment_month())),
        Span::styled(format!("[{state}] "), Style::default().fg(Color::Cyan)),
        Span::styled(source, Style::default().fg(Color::Gray)),
    ]);
    let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn draw_table(f: &mut Frame, app: &App, area: Rect) {
    let rows: Vec<Row> = app
        .session()
        .records()
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let mark = if app.selected.contains(&i) { "●" } else { " " };
            let style = if app.selected.contains(&i) {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(mark),
                Cell::from(r.date.clone()),
                Cell::from(r.description.clone()),
                Cell::from(format_amount(r.amount)),
                Cell::from(r.category_label()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(1),
        Constraint::Length(12),
        Constraint::Min(20),
        Constraint::Length(10),
        Constraint::Length(14),
    ];
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["", "date", "description", "amount", "category"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title("transactions"))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = TableState::default();
    if !app.session().is_empty() {
        state.select(Some(app.cursor));
    }
    f.render_stateful_widget(table, area, &mut state);
}

fn draw_summary(f: &mut Frame, app: &App, area: Rect) {
    let summary = app.session().summary();
    let mut lines = vec![Line::from(Span::styled(
        summary.total_line(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    lines.push(Line::raw(""));
    lines.extend(summary.lines().into_iter().map(Line::raw));
    if summary.uncategorized_count > 0 {
        lines.push(Line::styled(
            format!("{} row(s) untagged", summary.uncategorized_count),
            Style::default().fg(Color::Gray),
        ));
    }

    let panel = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title("summary"))
        .wrap(Wrap { trim: false });
    f.render_widget(panel, area);
}

fn draw_categories(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = Vec::new();
    for c in Category::ALL {
        let style = if c == app.category {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {c} "), style));
    }
    let bar = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("category (←/→)"))
        .wrap(Wrap { trim: true });
    f.render_widget(bar, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let text = match &app.mode {
        Mode::Prompt(kind) => Text::from(vec![Line::from(vec![
            Span::styled(format!("{}: ", kind.title()), Style::default().fg(Color::Cyan)),
            Span::raw(app.input.as_str()),
        ])]),
        _ => Text::from(vec![
            Line::styled(
                "Space select  a all  c clear  Enter assign  p chart  o open  r snapshot  s save  w save as  q quit",
                Style::default().fg(Color::Gray),
            ),
            Line::raw(app.status.as_str()),
        ]),
    };
    f.render_widget(Paragraph::new(text), area);
}

fn draw_modal(f: &mut Frame, title: &str, msg: &str, hint: &str) {
    let area = centered(f.area(), 60, 7);
    let body = Paragraph::new(Text::from(vec![
        Line::raw(msg.to_string()),
        Line::raw(""),
        Line::styled(hint.to_string(), Style::default().fg(Color::Gray)),
    ]))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    f.render_widget(Clear, area);
    f.render_widget(body, area);
}

fn draw_chart(f: &mut Frame, chart: &PieChart) {
    let height = (chart.slices.len() as u16).saturating_add(4);
    let area = centered(f.area(), 90, height);

    let label_width = chart
        .slices
        .iter()
        .map(|s| s.label().chars().count())
        .max()
        .unwrap_or(0);
    let lines: Vec<Line> = chart
        .slices
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let filled = ((s.percent / 100.0) * CHART_BAR_WIDTH as f64).round().max(0.0) as usize;
            Line::from(vec![
                Span::raw(format!("{:<label_width$} ", s.label())),
                Span::styled(
                    "█".repeat(filled.min(CHART_BAR_WIDTH)),
                    Style::default().fg(SLICE_COLORS[i % SLICE_COLORS.len()]),
                ),
                Span::raw(format!(" {}", s.percent_label())),
            ])
        })
        .collect();

    let body = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(chart.title.clone())
            .title_bottom("press any key"),
    );
    f.render_widget(Clear, area);
    f.render_widget(body, area);
}

fn centered(area: Rect, width_pct: u16, height: u16) -> Rect {
    let width = area.width * width_pct / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tally_ingest::ColumnResolver;
    use tally_session::SnapshotStore;

    fn app_with_statement(dir: &Path) -> App {
        let csv = dir.join("statement_2024-05.csv");
        std::fs::write(
            &csv,
            "Date,Store,Amount\n05/01,Grocer,100\n05/02,Bakery,200\n05/03,Power Co,50\n",
        )
        .unwrap();
        let session = Session::new(
            SnapshotStore::new(dir.join("snap.csv")),
            ColumnResolver::default(),
        );
        let mut app = App::new(session, Category::Food);
        app.open_statement(csv);
        app
    }

    fn press(app: &mut App, keys: &[KeyCode]) {
        for k in keys {
            app.handle_key(*k);
        }
    }

    #[test]
    fn test_select_and_assign() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with_statement(dir.path());

        press(
            &mut app,
            &[KeyCode::Char(' '), KeyCode::Down, KeyCode::Char(' '), KeyCode::Enter],
        );
        let summary = app.session().summary();
        assert_eq!(summary.amount_for(Category::Food), Some(300.0));
        assert!(app.session().store().exists());
        assert_eq!(app.mode(), &Mode::Browse);
    }

    #[test]
    fn test_chart_refused_until_complete() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with_statement(dir.path());

        press(&mut app, &[KeyCode::Char(' '), KeyCode::Enter, KeyCode::Char('p')]);
        assert!(matches!(app.mode(), Mode::Message(m) if m.contains("2 left")));

        // dismiss, then tag the rest as utilities
        press(
            &mut app,
            &[
                KeyCode::Char('x'),
                KeyCode::Char('c'),
                KeyCode::Down,
                KeyCode::Char(' '),
                KeyCode::Down,
                KeyCode::Char(' '),
                KeyCode::Right,
                KeyCode::Enter,
                KeyCode::Char('p'),
            ],
        );
        assert_eq!(app.category(), Category::Utilities);
        match app.mode() {
            Mode::Chart(chart) => assert_eq!(chart.total, 350.0),
            other => panic!("expected chart, got {other:?}"),
        }
    }

    #[test]
    fn test_select_all_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with_statement(dir.path());

        press(&mut app, &[KeyCode::Char('a')]);
        assert_eq!(app.selected(), vec![0, 1, 2]);
        press(&mut app, &[KeyCode::Char('c')]);
        assert!(app.selected().is_empty());
    }

    #[test]
    fn test_assign_without_selection_shows_notice() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with_statement(dir.path());

        press(&mut app, &[KeyCode::Enter]);
        assert!(matches!(app.mode(), Mode::Message(_)));
        assert!(!app.session().store().exists());
    }

    #[test]
    fn test_failed_open_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with_statement(dir.path());

        press(&mut app, &[KeyCode::Char('o')]);
        for c in "/definitely/missing.csv".chars() {
            app.handle_key(KeyCode::Char(c));
        }
        press(&mut app, &[KeyCode::Enter]);

        assert!(matches!(app.mode(), Mode::Message(m) if m.starts_with("Load failed")));
        assert_eq!(app.session().records().len(), 3);
    }

    #[test]
    fn test_confirm_restore() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = app_with_statement(dir.path());
        press(&mut first, &[KeyCode::Char('a'), KeyCode::Enter]);

        let session = Session::new(
            SnapshotStore::new(dir.path().join("snap.csv")),
            ColumnResolver::default(),
        );
        let mut app = App::new(session, Category::Food);
        app.ask_restore();
        press(&mut app, &[KeyCode::Char('?')]);
        assert_eq!(app.mode(), &Mode::ConfirmRestore);

        press(&mut app, &[KeyCode::Char('y')]);
        assert_eq!(app.session().state(), SessionState::ChartReady);
        assert_eq!(app.session().payment_month().to_string(), "2024 year 5 month");
    }
}
