use super::Row;

/// Metadata for a single result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Driver-side handle over one statement execution.
///
/// `row_count` follows the driver convention: rows returned for queries,
/// rows affected for DML, and `-1` when the count is not meaningful.
/// `description` is `None` when the statement produced no result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    pub row_count: i64,
    pub description: Option<Vec<ColumnDescriptor>>,
    pub status_message: Option<String>,
    rows: Vec<Row>,
}

impl Cursor {
    pub fn new(row_count: i64) -> Self {
        Self {
            row_count,
            description: None,
            status_message: None,
            rows: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: Vec<ColumnDescriptor>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_status_message(mut self, status_message: impl Into<String>) -> Self {
        self.status_message = Some(status_message.into());
        self
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    /// Returns the column names, or an empty list when there is no result set.
    pub fn column_names(&self) -> Vec<String> {
        self.description
            .as_ref()
            .map(|cols| cols.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Takes every buffered row. Subsequent calls return nothing.
    pub fn fetch_all(&mut self) -> Vec<Row> {
        std::mem::take(&mut self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SqlValue;

    #[test]
    fn test_fetch_all_drains() {
        let mut cursor = Cursor::new(1).with_rows(vec![vec![SqlValue::Int32(1)]]);
        assert_eq!(cursor.fetch_all(), vec![vec![SqlValue::Int32(1)]]);
        assert!(cursor.fetch_all().is_empty());
        assert_eq!(cursor.row_count, 1);
    }

    #[test]
    fn test_column_names() {
        let cursor = Cursor::new(0).with_description(vec![
            ColumnDescriptor::new("id"),
            ColumnDescriptor::new("name"),
        ]);
        assert_eq!(cursor.column_names(), vec!["id", "name"]);
        assert!(Cursor::new(-1).column_names().is_empty());
    }
}
