//! Application state and TUI event loop for the summary-table viewer.
//!
//! [`App`] owns the theme, the tables to show and which one is selected.
//! Left/Right (or Tab/BackTab) cycle through tables; `q` or Ctrl+C quits.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    text::{Line, Span},
    widgets::{Paragraph, Tabs},
    Frame, Terminal,
};

use ecology_core::models::SummaryTable;

use crate::table_view;
use crate::themes::Theme;

const TICK_RATE: Duration = Duration::from_millis(250);
const TAB_TITLE_WIDTH: usize = 24;

/// Outcome of a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Redraw,
    Ignore,
}

/// Viewer state.
pub struct App {
    theme: Theme,
    /// One-line summary shown above the tabs.
    subtitle: String,
    tables: Vec<SummaryTable>,
    selected: usize,
}

impl App {
    pub fn new(theme_name: &str, subtitle: impl Into<String>, tables: Vec<SummaryTable>) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            subtitle: subtitle.into(),
            tables,
            selected: 0,
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_table(&self) -> Option<&SummaryTable> {
        self.tables.get(self.selected)
    }

    pub fn next(&mut self) {
        if !self.tables.is_empty() {
            self.selected = (self.selected + 1) % self.tables.len();
        }
    }

    pub fn previous(&mut self) {
        if !self.tables.is_empty() {
            self.selected = (self.selected + self.tables.len() - 1) % self.tables.len();
        }
    }

    /// Apply one key press to the state.
    pub fn handle_key(&mut self, key: KeyEvent) -> KeyAction {
        if key.kind == KeyEventKind::Release {
            return KeyAction::Ignore;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,
            KeyCode::Right | KeyCode::Tab | KeyCode::Char('l') => {
                self.next();
                KeyAction::Redraw
            }
            KeyCode::Left | KeyCode::BackTab | KeyCode::Char('h') => {
                self.previous();
                KeyAction::Redraw
            }
            _ => KeyAction::Ignore,
        }
    }

    /// Take over the terminal and show the tables until the user quits.
    pub fn run(mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        loop {
            terminal.draw(|frame| self.render(frame))?;

            if event::poll(TICK_RATE)? {
                if let Event::Key(key) = event::read()? {
                    if self.handle_key(key) == KeyAction::Quit {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Render the current state into `frame`.
    pub fn render(&self, frame: &mut Frame) {
        let [title_area, tabs_area, body_area, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("Monster Ecology", self.theme.header),
                Span::styled(" │ ", self.theme.separator),
                Span::styled(self.subtitle.clone(), self.theme.dim),
            ])),
            title_area,
        );

        let Some(table) = self.selected_table() else {
            table_view::render_no_data(
                frame,
                body_area,
                "Fetch a dataset with --view fetch, then try again.",
                &self.theme,
            );
            return;
        };

        let titles: Vec<Line> = self
            .tables
            .iter()
            .map(|t| Line::from(table_view::truncate_to_width(&t.title, TAB_TITLE_WIDTH)))
            .collect();
        frame.render_widget(
            Tabs::new(titles)
                .select(self.selected)
                .style(self.theme.tab_inactive)
                .highlight_style(self.theme.tab_active)
                .divider(Span::styled("│", self.theme.separator)),
            tabs_area,
        );

        table_view::render_summary_table(frame, body_area, table, &self.theme);

        frame.render_widget(
            Paragraph::new(Span::styled(
                "←/→ switch table · q quit",
                self.theme.dim,
            )),
            footer_area,
        );
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
