//! Summary-table view for the monster-ecology TUI.
//!
//! Renders one [`SummaryTable`] as a bordered [`ratatui::widgets::Table`]:
//! the row key in the first column, then one column per value.

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use ecology_core::formatting::{self, NO_VALUE};
use ecology_core::models::SummaryTable;

use crate::themes::Theme;

/// Widest key column before truncation.
const MAX_KEY_WIDTH: usize = 28;
const MIN_VALUE_WIDTH: usize = 9;

/// How the cells of one column are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Percent,
    Integer,
    Decimal,
}

/// Pick the cell kind for `column` of `table`.
pub fn cell_kind(table: &SummaryTable, column: &str) -> CellKind {
    if table.title.ends_with("(%)") || column.starts_with("pct_") {
        CellKind::Percent
    } else if matches!(column, "count" | "pairs") {
        CellKind::Integer
    } else {
        CellKind::Decimal
    }
}

/// Printed text and style of a single cell.
fn format_cell(kind: CellKind, value: Option<f64>, theme: &Theme, base: Style) -> (String, Style) {
    let Some(v) = value else {
        return (NO_VALUE.to_string(), theme.table_missing);
    };
    match kind {
        CellKind::Percent => (formatting::format_percent(Some(v)), theme.percent_style(v)),
        CellKind::Integer => (formatting::format_number(v, 0), base),
        CellKind::Decimal => (formatting::format_number(v, 2), base),
    }
}

/// Cut `text` to at most `max_width` terminal columns, ending in `…` when
/// anything was removed.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Render `table` into `area`.
pub fn render_summary_table(frame: &mut Frame, area: Rect, table: &SummaryTable, theme: &Theme) {
    let header_cells = std::iter::once(Cell::from(table.dimension.clone()))
        .chain(table.columns.iter().map(|c| Cell::from(c.clone())))
        .map(|cell| cell.style(theme.table_header));
    let header = Row::new(header_cells).height(1);

    let kinds: Vec<CellKind> = table.columns.iter().map(|c| cell_kind(table, c)).collect();

    let data_rows: Vec<Row> = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            let mut cells =
                vec![Cell::from(truncate_to_width(&row.key, MAX_KEY_WIDTH)).style(theme.table_key)];
            for (kind, value) in kinds.iter().zip(&row.values) {
                let (text, cell_style) = format_cell(*kind, *value, theme, style);
                cells.push(Cell::from(text).style(cell_style));
            }
            Row::new(cells).style(style)
        })
        .collect();

    let key_width = table
        .rows
        .iter()
        .map(|r| r.key.width())
        .chain(std::iter::once(table.dimension.width()))
        .max()
        .unwrap_or(0)
        .min(MAX_KEY_WIDTH);
    let widths: Vec<Constraint> = std::iter::once(Constraint::Length(key_width as u16 + 1))
        .chain(
            table
                .columns
                .iter()
                .map(|c| Constraint::Length(c.width().max(MIN_VALUE_WIDTH) as u16 + 1)),
        )
        .collect();

    let widget = Table::new(data_rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.separator)
                .title(Span::styled(format!(" {} ", table.title), theme.header)),
        )
        .style(theme.text);

    frame.render_widget(widget, area);
}

/// Render a placeholder when there is nothing to show.
pub fn render_no_data(frame: &mut Frame, area: Rect, message: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No monsters to summarize", theme.warning)),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), theme.dim)),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Monster Ecology "),
        ),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────
