use std::fmt;
use std::time::Duration;

use crate::error::DatabaseError;
use crate::table::{render_table, TableOptions, TableRow, DEFAULT_MAX_ROWS};

use super::{Cursor, Row};

/// Statement kind reported for batched inserts.
pub const INSERT_PIPELINE: &str = "INSERT PIPELINE";

/// Normalized outcome of a single statement.
///
/// Either a success, carrying whatever columns and rows the statement produced,
/// or a captured database error. When an error is present the columns and rows
/// are empty and `row_count` is `-1`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse<R = Row> {
    statement_kind: String,
    columns: Vec<String>,
    rows: Vec<R>,
    row_count: i64,
    duration: Duration,
    error: Option<DatabaseError>,
}

impl QueryResponse<Row> {
    /// Builds a response from a successful execution, keeping rows as raw values.
    pub fn from_cursor(cursor: Cursor, statement_kind: Option<&str>, result_expected: bool) -> Self {
        Self::from_cursor_with(cursor, statement_kind, result_expected, |row| row)
    }
}

impl<R> QueryResponse<R> {
    /// Builds a response from a successful execution.
    ///
    /// Rows are fetched only when `result_expected` is set and the cursor reports
    /// a positive row count; each one is passed through `row_mapper`. Without an
    /// explicit `statement_kind`, the first word of the driver's status message
    /// is used.
    pub fn from_cursor_with<F>(
        mut cursor: Cursor,
        statement_kind: Option<&str>,
        result_expected: bool,
        row_mapper: F,
    ) -> Self
    where
        F: FnMut(Row) -> R,
    {
        let rows = if result_expected && cursor.row_count > 0 {
            cursor.fetch_all().into_iter().map(row_mapper).collect()
        } else {
            Vec::new()
        };

        let statement_kind = match statement_kind {
            Some(kind) if !kind.is_empty() => kind.to_string(),
            _ => cursor
                .status_message
                .as_deref()
                .and_then(|message| message.split(' ').next())
                .unwrap_or_default()
                .to_string(),
        };

        Self {
            statement_kind,
            columns: cursor.column_names(),
            rows,
            row_count: cursor.row_count,
            duration: Duration::ZERO,
            error: None,
        }
    }

    /// Builds a response that records `error`, with its message flattened to one line.
    pub fn from_error(error: &DatabaseError) -> Self {
        Self {
            statement_kind: String::new(),
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: -1,
            duration: Duration::ZERO,
            error: Some(DatabaseError {
                message: error.single_line_message(),
                ..error.clone()
            }),
        }
    }

    pub(crate) fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Returns true if the statement completed without a database error.
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn statement_kind(&self) -> &str {
        &self.statement_kind
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }

    /// Rows returned or affected, or `-1` when unknown or on error.
    pub fn row_count(&self) -> i64 {
        self.row_count
    }

    /// Wall time spent connecting and executing.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn error(&self) -> Option<&DatabaseError> {
        self.error.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }
}

impl<R: TableRow> QueryResponse<R> {
    /// Renders the response as a text table showing at most `max_rows` rows.
    pub fn as_table(&self, max_rows: usize) -> String {
        self.as_table_with(TableOptions::default().max_rows(max_rows))
    }

    pub fn as_table_with(&self, options: TableOptions) -> String {
        if self.columns.is_empty() {
            return match &self.error {
                Some(error) => render_table(&["error"], &[vec![error.message.clone()]], options.alignment),
                // No result set, typical for DDL and DML.
                None => render_table(&[" "], &[vec![self.row_count.to_string()]], options.alignment),
            };
        }

        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .take(options.max_rows)
            .map(TableRow::cells)
            .collect();
        render_table(&self.columns, &rows, options.alignment)
    }
}

impl<R: TableRow> fmt::Display for QueryResponse<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_table(DEFAULT_MAX_ROWS))
    }
}

impl<R> IntoIterator for QueryResponse<R> {
    type Item = R;
    type IntoIter = std::vec::IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a, R> IntoIterator for &'a QueryResponse<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
