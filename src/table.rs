//! Plain-text table rendering for query responses.
//!
//! ```text
//! +---------+---------+
//! | column1 | column2 |
//! +---------+---------+
//! | 1       | NULL    |
//! | 2       | 3       |
//! +---------+---------+
//! ```

use crate::types::Row;

/// Default number of data rows rendered by `QueryResponse::as_table`.
pub const DEFAULT_MAX_ROWS: usize = 10;

/// Horizontal placement of text inside a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Right,
    /// With odd padding the extra space goes left when the width is odd
    /// and right when it is even.
    Center,
}

impl Alignment {
    /// Pads `text` to `width` characters.
    pub fn pad(&self, text: &str, width: usize) -> String {
        match self {
            Alignment::Left => format!("{text:<width$}"),
            Alignment::Right => format!("{text:>width$}"),
            Alignment::Center => {
                let margin = width.saturating_sub(text.chars().count());
                let left = margin / 2 + (margin & width & 1);
                format!("{}{text}{}", " ".repeat(left), " ".repeat(margin - left))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    pub max_rows: usize,
    pub alignment: Alignment,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            alignment: Alignment::default(),
        }
    }
}

impl TableOptions {
    pub fn max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }
}

/// A row that can be laid out as one line of a table.
pub trait TableRow {
    /// Returns the stringified cells, in column order.
    fn cells(&self) -> Vec<String>;
}

impl TableRow for Row {
    fn cells(&self) -> Vec<String> {
        self.iter().map(ToString::to_string).collect()
    }
}

/// Renders a header and rows as a `+-|` box table.
///
/// Each column is as wide as its longest header or cell, counted in characters.
/// Cells missing from short rows render empty. The result has no trailing newline.
pub fn render_table<S: AsRef<str>>(
    columns: &[S],
    rows: &[Vec<String>],
    alignment: Alignment,
) -> String {
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .fold(column.as_ref().chars().count(), usize::max)
        })
        .collect();

    let separator = format!(
        "+{}+",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );

    let mut lines = Vec::with_capacity(rows.len() + 4);
    lines.push(separator.clone());
    lines.push(format_line(
        columns.iter().map(AsRef::as_ref),
        &widths,
        alignment,
    ));
    lines.push(separator.clone());
    for row in rows {
        let cells = (0..widths.len()).map(|i| row.get(i).map(String::as_str).unwrap_or(""));
        lines.push(format_line(cells, &widths, alignment));
    }
    lines.push(separator);

    lines.join("\n")
}

fn format_line<'a>(
    cells: impl Iterator<Item = &'a str>,
    widths: &[usize],
    alignment: Alignment,
) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| alignment.pad(cell, *width))
        .collect();
    format!("| {} |", padded.join(" | "))
}
