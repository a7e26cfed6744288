use crossterm::event::KeyCode;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use ratatui::widgets::TableState;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::filters::{classify_column, ColumnFilter, ColumnKind, FilterSettings};
use crate::links::chart_url;
use crate::models::{Dataset, Notice, KEY_COLUMN};
use crate::session::{LoadOutcome, Session};

/// Most recent notices kept for the notice panel
pub const MAX_NOTICES: usize = 50;
const PAGE: usize = 10;

/// Which panel receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Filters,
    Table,
    Columns,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Filters => Focus::Table,
            Focus::Table => Focus::Columns,
            Focus::Columns => Focus::Filters,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Focus::Filters => Focus::Columns,
            Focus::Table => Focus::Filters,
            Focus::Columns => Focus::Table,
        }
    }
}

/// Work the event loop must do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Reload,
    Export,
}

/// One selectable line of the filter sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterRow {
    Header(usize),
    Option(usize, usize),
}

/// Everything the dashboard shows, driven purely by key presses
///
/// The table view is recomputed from the session after every change to the
/// filters or visible columns.
#[derive(Debug)]
pub struct DashboardState {
    pub session: Option<Session>,
    /// Set when the join key is missing; the table is not shown
    pub fatal: Option<String>,
    pub notices: Vec<Notice>,
    pub focus: Focus,
    pub filter_cursor: usize,
    pub column_cursor: usize,
    /// First visible table column, for horizontal scrolling
    pub column_offset: usize,
    pub table_state: TableState,
    /// Query being typed after `/`
    pub search: Option<String>,
    pub loading: bool,
    pub chart_url_template: String,
    settings: FilterSettings,
    view: Dataset,
    numeric_columns: HashSet<String>,
}

impl DashboardState {
    pub fn new(settings: FilterSettings, chart_url_template: &str) -> Self {
        Self {
            session: None,
            fatal: None,
            notices: Vec::new(),
            focus: Focus::Filters,
            filter_cursor: 0,
            column_cursor: 0,
            column_offset: 0,
            table_state: TableState::default(),
            search: None,
            loading: true,
            chart_url_template: chart_url_template.to_string(),
            settings,
            view: Dataset::empty(),
            numeric_columns: HashSet::new(),
        }
    }

    /// Install the result of a load, keeping selections across reloads
    pub fn apply_load(&mut self, outcome: LoadOutcome) {
        self.loading = false;
        for notice in outcome.notices {
            self.push_notice(notice);
        }

        match outcome.result {
            Ok(output) => {
                if !output.absent_targets.is_empty() {
                    debug!("Columns not present in either source: {:?}", output.absent_targets);
                }
                match self.session.as_mut() {
                    Some(session) => session.replace_table(output.table),
                    None => self.session = Some(Session::new(output.table, self.settings.clone())),
                }
                self.fatal = None;
            }
            Err(e) => {
                warn!("Dashboard stopped: {}", e);
                self.session = None;
                self.fatal = Some(e.to_string());
            }
        }
        self.numeric_columns = self.session.as_ref().map(numeric_columns).unwrap_or_default();
        self.refresh_view();
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
        if self.notices.len() > MAX_NOTICES {
            let excess = self.notices.len() - MAX_NOTICES;
            self.notices.drain(..excess);
        }
    }

    /// Filtered rows restricted to the visible columns
    pub fn view(&self) -> &Dataset {
        &self.view
    }

    /// Whether the column's values are displayed as numbers
    pub fn is_numeric_column(&self, column: &str) -> bool {
        self.numeric_columns.contains(column)
    }

    pub fn placeholder(&self) -> &str {
        self.session
            .as_ref()
            .map_or(&self.settings.placeholder, |s| &s.settings().placeholder)
    }

    fn refresh_view(&mut self) {
        self.view = self.session.as_ref().map(Session::view).unwrap_or_else(Dataset::empty);

        let rows = self.view.row_count();
        match self.table_state.selected() {
            _ if rows == 0 => self.table_state.select(None),
            Some(i) if i >= rows => self.table_state.select(Some(rows - 1)),
            None => self.table_state.select(Some(0)),
            Some(_) => {}
        }

        let columns = self.view.columns().len();
        self.column_offset = self.column_offset.min(columns.saturating_sub(1));
        self.filter_cursor = self.filter_cursor.min(self.filter_rows().len().saturating_sub(1));
        let column_count = self.session.as_ref().map_or(0, |s| s.visibility().entries().len());
        self.column_cursor = self.column_cursor.min(column_count.saturating_sub(1));
    }

    /// Sidebar lines: a header per filter, then one line per categorical option
    pub fn filter_rows(&self) -> Vec<FilterRow> {
        let Some(session) = &self.session else {
            return Vec::new();
        };
        let mut rows = Vec::new();
        for (i, filter) in session.filters().filters.iter().enumerate() {
            rows.push(FilterRow::Header(i));
            if let ColumnFilter::Categorical(f) = filter {
                rows.extend((0..f.options.len()).map(|o| FilterRow::Option(i, o)));
            }
        }
        rows
    }

    fn focused_filter_index(&self) -> Option<usize> {
        match self.filter_rows().get(self.filter_cursor)? {
            FilterRow::Header(i) | FilterRow::Option(i, _) => Some(*i),
        }
    }

    /// Stock symbol of the highlighted row
    pub fn selected_symbol(&self) -> Option<String> {
        let row = self.table_state.selected()?;
        self.view.cell(row, KEY_COLUMN)?.as_text()
    }

    /// Chart URL for the highlighted row
    pub fn selected_chart_url(&self) -> Option<String> {
        self.selected_symbol()
            .map(|symbol| chart_url(&self.chart_url_template, &symbol))
    }

    pub fn handle_key(&mut self, key: KeyCode) -> Action {
        if self.search.is_some() {
            self.handle_search_key(key);
            return Action::None;
        }

        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Char('r') | KeyCode::Char('R') => return Action::Reload,
            _ => {}
        }
        if self.fatal.is_some() || self.session.is_none() {
            return Action::None;
        }

        match key {
            KeyCode::Char('e') | KeyCode::Char('E') => return Action::Export,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            KeyCode::Char('/') => {
                self.focus = Focus::Table;
                self.search = Some(String::new());
            }
            _ => match self.focus {
                Focus::Filters => self.handle_filter_key(key),
                Focus::Table => self.handle_table_key(key),
                Focus::Columns => self.handle_column_key(key),
            },
        }
        Action::None
    }

    fn handle_search_key(&mut self, key: KeyCode) {
        let Some(query) = self.search.as_mut() else {
            return;
        };
        match key {
            KeyCode::Char(c) => query.push(c),
            KeyCode::Backspace => {
                query.pop();
            }
            KeyCode::Enter => {
                let query = std::mem::take(query);
                self.search = None;
                self.jump_to_match(&query);
            }
            KeyCode::Esc => self.search = None,
            _ => {}
        }
    }

    /// Highlight the row whose stock name best fuzzy-matches `query`
    pub fn jump_to_match(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        let matcher = SkimMatcherV2::default();
        let best = self
            .view
            .column_cells(KEY_COLUMN)
            .into_iter()
            .flatten()
            .enumerate()
            .filter_map(|(i, cell)| {
                let name = cell.as_text()?;
                matcher.fuzzy_match(&name, query).map(|score| (score, i))
            })
            .max_by_key(|(score, i)| (*score, std::cmp::Reverse(*i)));

        match best {
            Some((_, row)) => self.table_state.select(Some(row)),
            None => self.push_notice(Notice::info(format!("No stock matches '{}'", query))),
        }
    }

    fn handle_filter_key(&mut self, key: KeyCode) {
        let rows = self.filter_rows();
        if rows.is_empty() {
            return;
        }
        match key {
            KeyCode::Up => self.filter_cursor = self.filter_cursor.saturating_sub(1),
            KeyCode::Down => self.filter_cursor = (self.filter_cursor + 1).min(rows.len() - 1),
            KeyCode::PageUp => self.filter_cursor = self.filter_cursor.saturating_sub(PAGE),
            KeyCode::PageDown => self.filter_cursor = (self.filter_cursor + PAGE).min(rows.len() - 1),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_focused_option(rows[self.filter_cursor]),
            KeyCode::Left => self.nudge_focused(|f| f.nudge_low(-1)),
            KeyCode::Right => self.nudge_focused(|f| f.nudge_low(1)),
            KeyCode::Char('[') => self.nudge_focused(|f| f.nudge_high(-1)),
            KeyCode::Char(']') => self.nudge_focused(|f| f.nudge_high(1)),
            KeyCode::Char('0') => {
                if let Some(filter) = self.focused_filter_mut() {
                    filter.reset();
                }
                self.refresh_view();
            }
            _ => {}
        }
    }

    fn focused_filter_mut(&mut self) -> Option<&mut ColumnFilter> {
        let index = self.focused_filter_index()?;
        self.session.as_mut()?.filters_mut().filters.get_mut(index)
    }

    fn toggle_focused_option(&mut self, row: FilterRow) {
        let Some(ColumnFilter::Categorical(filter)) = self.focused_filter_mut() else {
            return;
        };
        match row {
            FilterRow::Option(_, o) => {
                if let Some(value) = filter.options.get(o).cloned() {
                    filter.toggle(&value);
                }
            }
            FilterRow::Header(_) => {
                if filter.selected.is_empty() {
                    filter.reset();
                } else {
                    filter.selected.clear();
                }
            }
        }
        self.refresh_view();
    }

    fn nudge_focused<F>(&mut self, nudge: F)
    where
        F: FnOnce(&mut crate::filters::NumericFilter),
    {
        if let Some(ColumnFilter::Numeric(filter)) = self.focused_filter_mut() {
            nudge(filter);
            self.refresh_view();
        }
    }

    fn handle_table_key(&mut self, key: KeyCode) {
        let rows = self.view.row_count();
        let columns = self.view.columns().len();
        let current = self.table_state.selected().unwrap_or(0);
        match key {
            KeyCode::Up => self.table_state.select(Some(current.saturating_sub(1))),
            KeyCode::Down if rows > 0 => self.table_state.select(Some((current + 1).min(rows - 1))),
            KeyCode::PageUp => self.table_state.select(Some(current.saturating_sub(PAGE))),
            KeyCode::PageDown if rows > 0 => {
                self.table_state.select(Some((current + PAGE).min(rows - 1)))
            }
            KeyCode::Home => self.table_state.select(Some(0)),
            KeyCode::End if rows > 0 => self.table_state.select(Some(rows - 1)),
            KeyCode::Left => self.column_offset = self.column_offset.saturating_sub(1),
            KeyCode::Right if columns > 0 => {
                self.column_offset = (self.column_offset + 1).min(columns - 1)
            }
            _ => {}
        }
    }

    fn handle_column_key(&mut self, key: KeyCode) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let count = session.visibility().entries().len();
        if count == 0 {
            return;
        }
        match key {
            KeyCode::Up => self.column_cursor = self.column_cursor.saturating_sub(1),
            KeyCode::Down => self.column_cursor = (self.column_cursor + 1).min(count - 1),
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some((column, _)) = session.visibility().entries().get(self.column_cursor).cloned() {
                    session.visibility_mut().toggle(&column);
                }
                self.refresh_view();
            }
            KeyCode::Char('a') | KeyCode::Char('0') => {
                session.visibility_mut().show_all();
                self.refresh_view();
            }
            _ => {}
        }
    }
}

/// Columns classified numeric, ignoring filter exemptions
fn numeric_columns(session: &Session) -> HashSet<String> {
    let settings = FilterSettings {
        exempt: Vec::new(),
        ..session.settings().clone()
    };
    let table = session.table();
    table
        .columns()
        .iter()
        .filter(|c| classify_column(table, c, &settings) == ColumnKind::Numeric)
        .cloned()
        .collect()
}
