use std::fmt;

use thiserror::Error;

/// Stage at which the driver reported a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseErrorKind {
    Connect,
    Execute,
    Fetch,
}

impl DatabaseErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Execute => "execute",
            Self::Fetch => "fetch",
        }
    }
}

impl fmt::Display for DatabaseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any failure raised by the underlying driver while connecting, executing or fetching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Database {kind} error: {message}")]
pub struct DatabaseError {
    pub kind: DatabaseErrorKind,
    pub message: String,
    /// SQLSTATE code, when the server supplied one.
    pub code: Option<String>,
}

impl DatabaseError {
    pub fn new(kind: DatabaseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(DatabaseErrorKind::Connect, message)
    }

    pub fn execute(message: impl Into<String>) -> Self {
        Self::new(DatabaseErrorKind::Execute, message)
    }

    pub fn fetch(message: impl Into<String>) -> Self {
        Self::new(DatabaseErrorKind::Fetch, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// The message with embedded newlines replaced by spaces.
    pub fn single_line_message(&self) -> String {
        self.message.replace('\n', " ")
    }
}

/// Error type for cedar-client operations
#[derive(Debug, Error)]
pub enum CedarError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type alias for cedar-client operations
pub type Result<T> = std::result::Result<T, CedarError>;

/// Result type alias for driver operations
pub type DbResult<T> = std::result::Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_message() {
        let err = DatabaseError::execute("syntax error at or near \"selec\"\nLINE 1: selec 1\n^");
        assert_eq!(
            err.single_line_message(),
            "syntax error at or near \"selec\" LINE 1: selec 1 ^"
        );
        // The original message is left untouched.
        assert!(err.message.contains('\n'));
    }

    #[test]
    fn test_database_error_display() {
        let err = DatabaseError::connect("connection refused").with_code("08001");
        assert_eq!(err.to_string(), "Database connect error: connection refused");
        assert_eq!(err.code.as_deref(), Some("08001"));
    }

    #[test]
    fn test_cedar_error_from_database_error() {
        let err: CedarError = DatabaseError::fetch("lost").into();
        match err {
            CedarError::Database(inner) => assert_eq!(inner.kind, DatabaseErrorKind::Fetch),
            _ => panic!("Expected Database error"),
        }
    }
}
