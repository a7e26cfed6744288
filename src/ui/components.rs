/// Rendering helpers for the dashboard panels
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell as TableCell, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
    Frame,
};

use super::state::{DashboardState, FilterRow, Focus};
use crate::filters::{parse_numeric, ColumnFilter};
use crate::models::{Cell, NoticeLevel};

const MAX_COLUMN_WIDTH: u16 = 24;
const MIN_COLUMN_WIDTH: u16 = 6;

/// Values of numeric columns are shown with two decimals; other cells as-is
pub fn format_cell(cell: &Cell, numeric: bool, placeholder: &str) -> String {
    if numeric {
        if let Some(v) = parse_numeric(cell, placeholder).value() {
            return format!("{:.2}", v);
        }
    }
    cell.as_text().unwrap_or_default()
}

fn panel_block(title: &str, focused: bool) -> Block<'_> {
    let border = if focused { Color::Yellow } else { Color::Gray };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title)
}

fn notice_style(level: NoticeLevel) -> Style {
    match level {
        NoticeLevel::Info => Style::default().fg(Color::Cyan),
        NoticeLevel::Warning => Style::default().fg(Color::Yellow),
        NoticeLevel::Error => Style::default().fg(Color::Red),
    }
}

/// Filter sidebar ("Filtreler")
pub fn render_filters(f: &mut Frame, area: Rect, state: &DashboardState) {
    let focused = state.focus == Focus::Filters;
    let Some(session) = &state.session else {
        f.render_widget(Paragraph::new("").block(panel_block("Filtreler", focused)), area);
        return;
    };
    let filters = &session.filters().filters;

    let items: Vec<ListItem> = state
        .filter_rows()
        .into_iter()
        .map(|row| match row {
            FilterRow::Header(i) => match &filters[i] {
                ColumnFilter::Categorical(c) => {
                    let label = format!("▸ {} ({}/{})", c.column, c.selected.len(), c.options.len());
                    ListItem::new(Line::from(Span::styled(
                        label,
                        Style::default().add_modifier(Modifier::BOLD),
                    )))
                }
                ColumnFilter::Numeric(n) => {
                    let label = format!("▸ {}", n.column);
                    let range = if n.is_degenerate() {
                        format!("  {:.2} (single value)", n.min)
                    } else {
                        format!("  {:.2} .. {:.2}  [{:.2}, {:.2}]", n.lo, n.hi, n.min, n.max)
                    };
                    let style = if n.is_active() { Color::Green } else { Color::Gray };
                    ListItem::new(vec![
                        Line::from(Span::styled(label, Style::default().add_modifier(Modifier::BOLD))),
                        Line::from(Span::styled(range, Style::default().fg(style))),
                    ])
                }
            },
            FilterRow::Option(i, o) => match &filters[i] {
                ColumnFilter::Categorical(c) => {
                    let value = &c.options[o];
                    let mark = if c.is_selected(value) { "[x]" } else { "[ ]" };
                    ListItem::new(format!("   {} {}", mark, value))
                }
                ColumnFilter::Numeric(_) => ListItem::new(""),
            },
        })
        .collect();

    let title = format!("Filtreler ({} active)", session.filters().active_count());
    let list = List::new(items)
        .block(panel_block(&title, focused))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let mut list_state = ListState::default();
    if focused {
        list_state.select(Some(state.filter_cursor));
    }
    f.render_stateful_widget(list, area, &mut list_state);
}

/// Filtered table ("Filtrelenmiş Veri Tablosu")
pub fn render_table(f: &mut Frame, area: Rect, state: &mut DashboardState) {
    let focused = state.focus == Focus::Table;
    let view = state.view();
    let offset = state.column_offset;
    let columns: Vec<&String> = view.columns().iter().skip(offset).collect();
    let numeric: Vec<bool> = view.columns().iter().map(|c| state.is_numeric_column(c)).collect();
    let placeholder = state.placeholder();

    let widths: Vec<Constraint> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let longest = view
                .rows()
                .iter()
                .map(|row| format_cell(&row[i + offset], numeric[i + offset], placeholder).chars().count())
                .max()
                .unwrap_or(0)
                .max(name.chars().count()) as u16;
            Constraint::Length(longest.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH))
        })
        .collect();

    let header = Row::new(columns.iter().map(|c| TableCell::from(c.as_str())))
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = view
        .rows()
        .iter()
        .map(|row| {
            Row::new(
                row.iter()
                    .enumerate()
                    .skip(offset)
                    .map(|(c, cell)| TableCell::from(format_cell(cell, numeric[c], placeholder))),
            )
        })
        .collect();

    let title = format!("Filtrelenmiş Veri Tablosu ({} rows)", view.row_count());
    let table = Table::new(rows, widths)
        .header(header)
        .block(panel_block(&title, focused))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("» ");

    let mut table_state = state.table_state.clone();
    f.render_stateful_widget(table, area, &mut table_state);
    state.table_state = table_state;
}

/// Column visibility panel
pub fn render_columns(f: &mut Frame, area: Rect, state: &DashboardState) {
    let focused = state.focus == Focus::Columns;
    let items: Vec<ListItem> = state
        .session
        .as_ref()
        .map(|s| s.visibility().entries())
        .unwrap_or(&[])
        .iter()
        .map(|(column, visible)| {
            let mark = if *visible { "[x]" } else { "[ ]" };
            ListItem::new(format!("{} {}", mark, column))
        })
        .collect();

    let list = List::new(items)
        .block(panel_block("Sütunlar", focused))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let mut list_state = ListState::default();
    if focused {
        list_state.select(Some(state.column_cursor));
    }
    f.render_stateful_widget(list, area, &mut list_state);
}

/// Chart link for the highlighted row, or the search prompt while typing
pub fn render_detail_line(f: &mut Frame, area: Rect, state: &DashboardState) {
    let line = match (&state.search, state.selected_chart_url()) {
        (Some(query), _) => Line::from(vec![
            Span::styled("Ara: ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(query.clone()),
        ]),
        (None, Some(url)) => Line::from(vec![
            Span::styled("Grafik: ", Style::default().fg(Color::Gray)),
            Span::styled(url, Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED)),
        ]),
        (None, None) => Line::from(""),
    };
    f.render_widget(Paragraph::new(line), area);
}

/// Most recent notices, newest last
pub fn render_notices(f: &mut Frame, area: Rect, state: &DashboardState) {
    let capacity = area.height.saturating_sub(2) as usize;
    let skip = state.notices.len().saturating_sub(capacity);
    let lines: Vec<Line> = state
        .notices
        .iter()
        .skip(skip)
        .map(|n| {
            Line::from(vec![
                Span::styled(
                    format!("{} ", n.timestamp.format("%H:%M:%S")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(n.message.clone(), notice_style(n.level)),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Bildirimler"))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

/// Full-screen message shown when the table cannot be built
pub fn render_fatal(f: &mut Frame, area: Rect, message: &str) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Tablolar birleştirilemedi",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    lines.extend(message.lines().map(|l| Line::from(l.to_string())));
    lines.push(Line::from(""));
    lines.push(Line::from("Press R to reload or Q to quit"));

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Error"))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

/// Render a loading indicator
pub fn render_loading_indicator(f: &mut Frame, area: Rect, message: &str) {
    let loading = Paragraph::new(message)
        .block(Block::default().borders(Borders::ALL).title("Loading"))
        .style(Style::default().fg(Color::Yellow));

    f.render_widget(loading, area);
}

pub fn render_status_bar(f: &mut Frame, area: Rect) {
    let key = |k: &'static str, color: Color| {
        Span::styled(k, Style::default().fg(color).add_modifier(Modifier::BOLD))
    };
    let gray = |t: &'static str| Span::styled(t, Style::default().fg(Color::Gray));

    let status_text = vec![Line::from(vec![
        key("Tab", Color::Yellow),
        gray(" focus • "),
        key("Space", Color::Yellow),
        gray(" toggle • "),
        key("←/→ [ ]", Color::Yellow),
        gray(" range • "),
        key("0", Color::Yellow),
        gray(" reset • "),
        key("/", Color::Yellow),
        gray(" search • "),
        key("E", Color::Green),
        gray(" export • "),
        key("R", Color::Green),
        gray(" reload • "),
        key("Q", Color::Red),
        gray(" quit"),
    ])];

    let paragraph = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::White));

    f.render_widget(paragraph, area);
}
