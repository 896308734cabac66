//! Ratatui-based terminal UI.
//!
//! The TUI lists CSV files found under the working directory (plus the built-in
//! reference dataset), and for the loaded dataset shows the Kaplan-Meier curve,
//! the fallback/success notice, and a preview of the raw uploaded rows.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table},
};

use crate::app::pipeline::{self, RunOutput};
use crate::cli::picker::{discover_csv_files, pretty_path};
use crate::domain::NoticeLevel;
use crate::error::AppError;

mod plotters_chart;

use plotters_chart::KmPlottersChart;

/// Raw rows shown under the chart.
const PREVIEW_ROWS: usize = 10;

/// Start the TUI, optionally loading `input` first.
pub fn run(input: Option<PathBuf>) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(input);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// One entry of the source list.
#[derive(Debug, Clone, PartialEq)]
enum SourceEntry {
    Reference,
    File(PathBuf),
}

impl SourceEntry {
    fn label(&self) -> String {
        match self {
            SourceEntry::Reference => "[reference dataset]".to_string(),
            SourceEntry::File(path) => pretty_path(path),
        }
    }

    fn path(&self) -> Option<PathBuf> {
        match self {
            SourceEntry::Reference => None,
            SourceEntry::File(path) => Some(path.clone()),
        }
    }
}

struct App {
    entries: Vec<SourceEntry>,
    /// File passed on the command line; kept listed even outside the scan.
    pinned: Option<PathBuf>,
    selected: usize,
    loaded: Option<SourceEntry>,
    censor_marks: bool,
    status: String,
    run: Option<RunOutput>,
}

impl App {
    fn new(input: Option<PathBuf>) -> Self {
        let mut app = Self {
            entries: Vec::new(),
            pinned: input.clone(),
            selected: 0,
            loaded: None,
            censor_marks: false,
            status: String::new(),
            run: None,
        };
        app.rescan();

        if let Some(path) = input {
            app.select_entry(&SourceEntry::File(path));
        }
        app.load_selected();
        app
    }

    /// Rebuild the source list, keeping the cursor on the same entry.
    fn rescan(&mut self) {
        let mut discovered = discover_csv_files();
        if let Some(pinned) = &self.pinned {
            if !discovered.contains(pinned) {
                discovered.push(pinned.clone());
            }
        }
        let previous = self.entries.get(self.selected).cloned();

        self.entries = std::iter::once(SourceEntry::Reference)
            .chain(discovered.into_iter().map(SourceEntry::File))
            .collect();
        self.selected = 0;
        if let Some(previous) = previous {
            self.select_entry(&previous);
        }
    }

    fn select_entry(&mut self, entry: &SourceEntry) -> bool {
        match self.entries.iter().position(|e| e == entry) {
            Some(idx) => {
                self.selected = idx;
                true
            }
            None => false,
        }
    }

    /// Rescan, then reload the dataset currently shown.
    fn reload(&mut self) {
        self.rescan();
        let Some(loaded) = self.loaded.clone() else {
            self.load_selected();
            return;
        };
        if self.select_entry(&loaded) {
            self.load_selected();
        } else {
            self.status = format!("{} no longer found; keeping previous data", loaded.label());
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected + 1 < self.entries.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Enter => self.load_selected(),
            KeyCode::Char('c') => {
                self.censor_marks = !self.censor_marks;
                self.status = format!(
                    "censor marks: {}",
                    if self.censor_marks { "on" } else { "off" }
                );
            }
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
        false
    }

    fn load_selected(&mut self) {
        let Some(entry) = self.entries.get(self.selected).cloned() else {
            return;
        };

        let result = pipeline::resolve_dataset(entry.path().as_deref()).and_then(pipeline::run_with_dataset);
        match result {
            Ok(run) => {
                self.status = format!("Loaded {}", entry.label());
                self.loaded = Some(entry);
                self.run = Some(run);
            }
            Err(err) => {
                self.status = format!("Load failed: {err}");
            }
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();

        let summary = match &self.run {
            Some(run) => {
                let median = run
                    .curve
                    .median()
                    .map(|m| format!("{m:.2}"))
                    .unwrap_or_else(|| "not reached".to_string());
                format!(
                    " | n={} events={} censored={} | median={median}",
                    run.curve.n_observations, run.curve.n_events, run.curve.n_censored
                )
            }
            None => String::new(),
        };
        lines.push(Line::from(vec![
            Span::styled("km", Style::default().fg(Color::Cyan)),
            Span::raw(" — Kaplan-Meier survival"),
            Span::styled(summary, Style::default().fg(Color::Gray)),
        ]));

        if let Some(run) = &self.run {
            let color = match run.dataset.notice.level {
                NoticeLevel::Success => Color::Green,
                NoticeLevel::Warning => Color::Yellow,
            };
            lines.push(Line::from(Span::styled(
                run.dataset.notice.message.clone(),
                Style::default().fg(color),
            )));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(32), Constraint::Min(0)])
            .split(area);

        self.draw_sources(frame, cols[0]);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(PREVIEW_ROWS as u16 + 3)])
            .split(cols[1]);

        self.draw_chart(frame, rows[0]);
        self.draw_preview(frame, rows[1]);
    }

    fn draw_sources(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .entries
            .iter()
            .map(|e| {
                let marker = if self.loaded.as_ref() == Some(e) { "* " } else { "  " };
                ListItem::new(format!("{marker}{}", e.label()))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Datasets").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title("Overall Survival (Kaplan-Meier Estimate)")
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(run) = &self.run else {
            let msg = Paragraph::new("No dataset loaded.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let widget = KmPlottersChart {
            steps: &run.plot.vertices,
            censor: &run.plot.censor_marks,
            show_censor: self.censor_marks,
            x_bounds: run.plot.x_bounds,
            y_bounds: run.plot.y_bounds,
            x_label: "time",
            y_label: "survival probability",
        };
        frame.render_widget(widget, inner);
    }

    fn draw_preview(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Uploaded data preview").borders(Borders::ALL);

        let Some(table) = self.run.as_ref().and_then(|r| r.dataset.table.as_ref()) else {
            let msg = Paragraph::new("(reference dataset: nothing uploaded)")
                .style(Style::default().fg(Color::Gray))
                .block(block);
            frame.render_widget(msg, area);
            return;
        };

        let rows = table.preview(PREVIEW_ROWS);
        let n_cols = table.headers.len().max(rows.iter().map(Vec::len).max().unwrap_or(0)).max(1);
        let widths = vec![Constraint::Ratio(1, n_cols as u32); n_cols];

        let header = Row::new(table.headers.clone())
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        let body = rows.into_iter().map(Row::new);

        let widget = Table::new(body, widths).header(header).block(block);
        frame.render_widget(widget, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  Enter load  c censor marks  r reload  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DataSource;

    fn app_with_reference() -> App {
        let mut app = App {
            entries: vec![SourceEntry::Reference],
            pinned: None,
            selected: 0,
            loaded: None,
            censor_marks: false,
            status: String::new(),
            run: None,
        };
        app.load_selected();
        app
    }

    #[test]
    fn reference_entry_loads_with_warning() {
        let app = app_with_reference();
        let run = app.run.as_ref().unwrap();
        assert!(run.dataset.is_fallback());
        assert!(run.dataset.notice.is_warning());
        assert_eq!(app.loaded, Some(SourceEntry::Reference));
    }

    #[test]
    fn keys_move_selection_and_toggle_marks() {
        let mut app = app_with_reference();
        app.entries.push(SourceEntry::File("a.csv".into()));

        assert!(!app.handle_key(KeyCode::Down));
        assert_eq!(app.selected, 1);
        assert!(!app.handle_key(KeyCode::Down));
        assert_eq!(app.selected, 1);
        app.handle_key(KeyCode::Up);
        assert_eq!(app.selected, 0);

        app.handle_key(KeyCode::Char('c'));
        assert!(app.censor_marks);
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn missing_file_keeps_previous_run() {
        let mut app = app_with_reference();
        app.entries.push(SourceEntry::File("does/not/exist.csv".into()));
        app.selected = 1;
        app.load_selected();
        assert!(app.status.starts_with("Load failed"));
        assert_eq!(app.loaded, Some(SourceEntry::Reference));
        assert!(app.run.is_some());
    }

    #[test]
    fn reload_keeps_the_file_passed_on_the_command_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cohort.csv");
        std::fs::write(&path, "time,event\n3,1\n5,0\n8,1\n").unwrap();

        let mut app = App::new(Some(path.clone()));
        let uploaded = DataSource::Uploaded { path: path.clone() };
        assert_eq!(app.run.as_ref().unwrap().dataset.source, uploaded);

        assert!(!app.handle_key(KeyCode::Char('r')));
        assert_eq!(app.run.as_ref().unwrap().dataset.source, uploaded);
        assert_eq!(app.loaded, Some(SourceEntry::File(path.clone())));
        assert_eq!(app.entries[app.selected], SourceEntry::File(path));
    }

    #[test]
    fn reload_keeps_previous_data_when_file_disappears() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.csv");
        std::fs::write(&path, "time,event\n3,1\n5,0\n").unwrap();

        let mut app = app_with_reference();
        app.entries.push(SourceEntry::File(path.clone()));
        app.selected = 1;
        app.load_selected();
        assert_eq!(app.loaded, Some(SourceEntry::File(path.clone())));

        std::fs::remove_file(&path).unwrap();
        app.handle_key(KeyCode::Char('r'));
        assert!(app.status.contains("no longer found"), "status: {}", app.status);
        assert_eq!(
            app.run.as_ref().unwrap().dataset.source,
            DataSource::Uploaded { path }
        );
    }
}
