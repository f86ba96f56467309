use async_trait::async_trait;

use crate::builders::Placeholder;
use crate::error::DbResult;
use crate::types::{Cursor, Row};

/// Trait for database driver implementations.
/// Drivers are responsible for:
/// - Opening connections from a key=value connection string
/// - Converting SqlValue parameters to native types
/// - Executing statements and reporting them as a Cursor
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Open a new connection.
    async fn connect(&self, connection_string: &str) -> DbResult<Box<dyn Connection>>;

    /// Placeholder syntax this driver expects in parameterized statements.
    fn placeholder(&self) -> Placeholder {
        Placeholder::Format
    }
}

/// A single open connection. Dropping it releases the connection.
#[async_trait]
pub trait Connection: Send {
    /// Execute one statement.
    async fn execute(&mut self, statement: &str) -> DbResult<Cursor>;

    /// Execute a parameterized statement once per row, submitted as one batch.
    /// The batch is atomic: either every row is applied or none is.
    /// The returned cursor reports the total rows affected.
    async fn execute_many(&mut self, statement: &str, rows: &[Row]) -> DbResult<Cursor>;
}
