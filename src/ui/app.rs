use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io;
use tracing::{error, info};

use super::components;
use super::state::{Action, DashboardState};
use crate::export::{write_xlsx, ChartLinks, ExportOptions};
use crate::models::{Config, Notice, KEY_COLUMN, PLACEHOLDER};
use crate::session::{filter_settings, load_table};
use crate::sources::{DatasetSource, SheetsClient};

pub struct DashboardApp<S> {
    pub state: DashboardState,
    pub should_quit: bool,
    source: S,
    config: Config,
}

impl<S> DashboardApp<S>
where
    S: DatasetSource + Sync,
{
    pub fn new(source: S, config: Config) -> Self {
        let state = DashboardState::new(filter_settings(&config), &config.chart_url_template);
        Self {
            state,
            should_quit: false,
            source,
            config,
        }
    }

    /// Fetch both sheets again and rebuild the table
    pub async fn reload(&mut self) {
        self.state.loading = true;
        let outcome = load_table(&self.source, &self.config).await;
        self.state.apply_load(outcome);
    }

    /// Write the current view to the export directory
    pub fn export(&mut self) {
        let options = ExportOptions {
            placeholder: PLACEHOLDER.to_string(),
            chart_links: Some(ChartLinks {
                key_column: KEY_COLUMN.to_string(),
                template: self.config.chart_url_template.clone(),
            }),
        };
        match write_xlsx(self.state.view(), &options, &self.config.export_dir) {
            Ok(path) => {
                info!("Exported view to {}", path.display());
                self.state
                    .push_notice(Notice::info(format!("Excel dosyası kaydedildi: {}", path.display())));
            }
            Err(e) => {
                error!("Export failed: {}", e);
                self.state.push_notice(Notice::error(format!("Export failed: {}", e)));
            }
        }
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Min(0),    // Content
                Constraint::Length(6), // Notices
                Constraint::Length(3), // Status bar
            ])
            .split(f.area());

        self.render_title(f, chunks[0]);

        if self.state.loading && self.state.session.is_none() {
            components::render_loading_indicator(f, chunks[1], "Fetching spreadsheets...");
        } else if let Some(message) = &self.state.fatal {
            components::render_fatal(f, chunks[1], message);
        } else {
            self.render_content(f, chunks[1]);
        }

        components::render_notices(f, chunks[2], &self.state);
        components::render_status_bar(f, chunks[3]);
    }

    fn render_title(&self, f: &mut Frame, area: Rect) {
        let (rows, total) = match &self.state.session {
            Some(session) => (self.state.view().row_count(), session.table().row_count()),
            None => (0, 0),
        };
        let mut spans = vec![
            Span::styled(
                "📈 Hisse Analiz Paneli",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("   {} / {} hisse", rows, total), Style::default().fg(Color::Gray)),
        ];
        if self.state.loading {
            spans.push(Span::styled("   reloading...", Style::default().fg(Color::Yellow)));
        }

        let paragraph = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }

    fn render_content(&mut self, f: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(25), // Filters
                Constraint::Min(0),         // Table
                Constraint::Length(28),     // Column visibility
            ])
            .split(area);

        components::render_filters(f, columns[0], &self.state);

        let middle = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(columns[1]);
        components::render_table(f, middle[0], &mut self.state);
        components::render_detail_line(f, middle[1], &self.state);

        components::render_columns(f, columns[2], &self.state);
    }
}

/// Run the interactive dashboard until the user quits
pub async fn run_app(config: Config) -> Result<()> {
    let client = SheetsClient::new(&config)?;
    let mut app = DashboardApp::new(client, config);

    // Setup terminal
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app).await;

    // Cleanup terminal
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    result
}

async fn event_loop<B, S>(terminal: &mut Terminal<B>, app: &mut DashboardApp<S>) -> Result<()>
where
    B: ratatui::backend::Backend,
    S: DatasetSource + Sync,
{
    terminal.draw(|f| app.draw(f))?;
    app.reload().await;

    loop {
        terminal.draw(|f| app.draw(f))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match app.state.handle_key(key.code) {
                Action::Quit => app.should_quit = true,
                Action::Reload => {
                    app.state.loading = true;
                    terminal.draw(|f| app.draw(f))?;
                    app.reload().await;
                }
                Action::Export => app.export(),
                Action::None => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
