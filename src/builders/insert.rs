use crate::error::{CedarError, Result};

/// Parameter marker syntax expected by the target driver.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Placeholder {
    /// `%s`, as used by format-style drivers.
    #[default]
    Format,
    /// `?`
    QuestionMark,
    /// `$1`, `$2`, ... as used by PostgreSQL's extended protocol.
    Numbered,
    /// The same literal token repeated for every parameter.
    Custom(String),
}

impl Placeholder {
    /// Returns the marker for the parameter at `position` (1-indexed).
    pub fn token(&self, position: usize) -> String {
        match self {
            Placeholder::Format => "%s".to_string(),
            Placeholder::QuestionMark => "?".to_string(),
            Placeholder::Numbered => format!("${position}"),
            Placeholder::Custom(token) => token.clone(),
        }
    }
}

/// Builds parameterized `insert` statements for a single table.
///
/// # Example
/// ```
/// use cedar_client::builders::{InsertBuilder, Placeholder};
///
/// let sql = InsertBuilder::new("mytbl")
///     .columns(["col1", "col2"])
///     .placeholder(Placeholder::Numbered)
///     .build(2)
///     .unwrap();
/// assert_eq!(sql, r#"insert into "mytbl" (col1,col2) values ($1,$2)"#);
/// ```
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table: String,
    columns: Option<Vec<String>>,
    placeholder: Placeholder,
}

impl InsertBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: None,
            placeholder: Placeholder::default(),
        }
    }

    /// Names the target columns. They are emitted unquoted, in order.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Build the statement for rows holding `arity` values each.
    pub fn build(&self, arity: usize) -> Result<String> {
        if self.table.is_empty() {
            return Err(CedarError::InvalidArgument(
                "insert requires a table name".to_string(),
            ));
        }
        if arity == 0 {
            return Err(CedarError::InvalidArgument(
                "insert requires at least one value per row".to_string(),
            ));
        }

        let mut sql = String::with_capacity(64 + arity * 4);

        sql.push_str("insert into \"");
        sql.push_str(&self.table);
        sql.push('"');

        if let Some(ref columns) = self.columns {
            if columns.len() != arity {
                return Err(CedarError::InvalidArgument(format!(
                    "{} column(s) given for rows of {} value(s)",
                    columns.len(),
                    arity
                )));
            }
            sql.push_str(" (");
            sql.push_str(&columns.join(","));
            sql.push(')');
        }

        sql.push_str(" values (");
        for position in 1..=arity {
            if position > 1 {
                sql.push(',');
            }
            sql.push_str(&self.placeholder.token(position));
        }
        sql.push(')');

        Ok(sql)
    }
}

/// Function form of [`InsertBuilder`].
pub fn build_insert(
    table: &str,
    arity: usize,
    columns: Option<&[&str]>,
    placeholder: &Placeholder,
) -> Result<String> {
    let mut builder = InsertBuilder::new(table).placeholder(placeholder.clone());
    if let Some(columns) = columns {
        builder = builder.columns(columns.iter().copied());
    }
    builder.build(arity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_without_columns() {
        let sql = build_insert("mytbl", 2, None, &Placeholder::Format).unwrap();
        assert_eq!(sql, r#"insert into "mytbl" values (%s,%s)"#);
    }

    #[test]
    fn test_build_with_columns() {
        let sql = build_insert("mytbl", 2, Some(&["col1", "col2"][..]), &Placeholder::Format).unwrap();
        assert_eq!(sql, r#"insert into "mytbl" (col1,col2) values (%s,%s)"#);
    }

    #[test]
    fn test_build_with_other_placeholders() {
        let sql = build_insert("mytbl", 2, None, &Placeholder::QuestionMark).unwrap();
        assert_eq!(sql, r#"insert into "mytbl" values (?,?)"#);

        let sql = build_insert("mytbl", 3, None, &Placeholder::Numbered).unwrap();
        assert_eq!(sql, r#"insert into "mytbl" values ($1,$2,$3)"#);

        let sql = build_insert("t", 2, None, &Placeholder::Custom(":v".to_string())).unwrap();
        assert_eq!(sql, r#"insert into "t" values (:v,:v)"#);
    }

    #[test]
    fn test_single_value_has_no_separator() {
        let sql = InsertBuilder::new("t").build(1).unwrap();
        assert_eq!(sql, r#"insert into "t" values (%s)"#);
    }

    #[test]
    fn test_missing_table_name() {
        let err = build_insert("", 1, None, &Placeholder::Format).unwrap_err();
        assert!(matches!(err, CedarError::InvalidArgument(_)));
    }

    #[test]
    fn test_zero_arity() {
        let err = build_insert("some", 0, None, &Placeholder::Format).unwrap_err();
        assert!(matches!(err, CedarError::InvalidArgument(_)));
    }

    #[test]
    fn test_column_count_mismatch() {
        let err = InsertBuilder::new("t").columns(["a"]).build(2).unwrap_err();
        match err {
            CedarError::InvalidArgument(msg) => {
                assert_eq!(msg, "1 column(s) given for rows of 2 value(s)")
            }
            _ => panic!("Expected InvalidArgument error"),
        }
    }
}
