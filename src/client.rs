use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::builders::InsertBuilder;
use crate::config::ConnectionParams;
use crate::drivers::TokioPostgresDriver;
use crate::error::{CedarError, DbResult, Result};
use crate::traits::DatabaseDriver;
use crate::types::{Cursor, QueryResponse, Row, INSERT_PIPELINE};

/// What to do when the database reports an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Return `Ok` with the error recorded in the response.
    #[default]
    Capture,
    /// Return the error as `Err(CedarError::Database)`.
    Raise,
}

/// Main entry point for cedar-client.
///
/// Holds connection parameters and a driver. Each call opens its own connection,
/// runs one statement (or one batch), and releases the connection before returning.
pub struct Client {
    params: ConnectionParams,
    driver: Arc<dyn DatabaseDriver>,
    error_policy: ErrorPolicy,
}

impl Client {
    /// Create a client that talks to PostgreSQL through tokio-postgres.
    ///
    /// # Example
    /// ```ignore
    /// let client = Client::new(ConnectionParams::new("localhost", "testdb", "admin", "secret"));
    /// let response = client.query("select 1 as one").await?;
    /// println!("{}", response);
    /// ```
    pub fn new(params: ConnectionParams) -> Self {
        Self::with_driver(params, Arc::new(TokioPostgresDriver::new()))
    }

    /// Create a new client with a custom driver.
    /// Useful for testing or using alternative database drivers.
    pub fn with_driver(params: ConnectionParams, driver: Arc<dyn DatabaseDriver>) -> Self {
        Self {
            params,
            driver,
            error_policy: ErrorPolicy::default(),
        }
    }

    /// Set the policy used by `query`, `query_as` and `insert_many`.
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// The connection string handed to the driver.
    pub fn uri(&self) -> String {
        self.params.to_uri()
    }

    /// Execute a statement and fetch whatever it returns.
    pub async fn query(&self, statement: &str) -> Result<QueryResponse> {
        self.query_with(statement, self.error_policy).await
    }

    pub async fn query_with(&self, statement: &str, policy: ErrorPolicy) -> Result<QueryResponse> {
        self.query_as_with(statement, policy, |row| row).await
    }

    /// Execute a statement, converting each fetched row with `row_mapper`.
    pub async fn query_as<R, F>(&self, statement: &str, row_mapper: F) -> Result<QueryResponse<R>>
    where
        F: FnMut(Row) -> R,
    {
        self.query_as_with(statement, self.error_policy, row_mapper)
            .await
    }

    pub async fn query_as_with<R, F>(
        &self,
        statement: &str,
        policy: ErrorPolicy,
        row_mapper: F,
    ) -> Result<QueryResponse<R>>
    where
        F: FnMut(Row) -> R,
    {
        let started = Instant::now();
        debug!(statement, "executing statement");

        let outcome = self
            .execute(statement)
            .await
            .map(|cursor| QueryResponse::from_cursor_with(cursor, None, true, row_mapper));
        settle(outcome, policy, started)
    }

    /// Insert `rows` into `table_name` as one pipelined batch.
    ///
    /// The statement has one placeholder per value of the first row; every row
    /// must have the same number of values.
    pub async fn insert_many(&self, table_name: &str, rows: &[Row]) -> Result<QueryResponse> {
        self.insert_many_with(table_name, rows, self.error_policy)
            .await
    }

    pub async fn insert_many_with(
        &self,
        table_name: &str,
        rows: &[Row],
        policy: ErrorPolicy,
    ) -> Result<QueryResponse> {
        let arity = rows.first().map(Vec::len).ok_or_else(|| {
            CedarError::InvalidArgument("insert_many requires at least one row".to_string())
        })?;
        let statement = InsertBuilder::new(table_name)
            .placeholder(self.driver.placeholder())
            .build(arity)?;

        let started = Instant::now();
        debug!(statement = %statement, rows = rows.len(), "executing insert pipeline");

        let outcome = self
            .execute_many(&statement, rows)
            .await
            .map(|cursor| QueryResponse::from_cursor(cursor, Some(INSERT_PIPELINE), false));
        settle(outcome, policy, started)
    }

    async fn execute(&self, statement: &str) -> DbResult<Cursor> {
        let mut connection = self.driver.connect(&self.params.to_uri()).await?;
        let cursor = connection.execute(statement).await?;
        Ok(cursor)
    }

    async fn execute_many(&self, statement: &str, rows: &[Row]) -> DbResult<Cursor> {
        let mut connection = self.driver.connect(&self.params.to_uri()).await?;
        let cursor = connection.execute_many(statement, rows).await?;
        Ok(cursor)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("params", &self.params)
            .field("error_policy", &self.error_policy)
            .finish_non_exhaustive()
    }
}

/// Turn a driver outcome into the caller-facing result according to `policy`.
fn settle<R>(
    outcome: DbResult<QueryResponse<R>>,
    policy: ErrorPolicy,
    started: Instant,
) -> Result<QueryResponse<R>> {
    let elapsed = started.elapsed();
    match outcome {
        Ok(response) => {
            debug!(
                statement_kind = response.statement_kind(),
                row_count = response.row_count(),
                elapsed_ms = elapsed.as_millis() as u64,
                "statement finished"
            );
            Ok(response.with_duration(elapsed))
        }
        Err(error) => {
            warn!(
                kind = %error.kind,
                code = error.code.as_deref().unwrap_or(""),
                error = %error.single_line_message(),
                ?policy,
                "statement failed"
            );
            match policy {
                ErrorPolicy::Capture => Ok(QueryResponse::from_error(&error).with_duration(elapsed)),
                ErrorPolicy::Raise => Err(CedarError::Database(error)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatabaseError;

    #[test]
    fn test_settle_success_records_duration() {
        let started = Instant::now();
        let response = settle(
            Ok(QueryResponse::from_cursor(Cursor::new(1), None, true)),
            ErrorPolicy::Raise,
            started,
        )
        .unwrap();
        assert!(response.ok());
        assert!(response.duration() <= started.elapsed());
    }

    #[test]
    fn test_settle_capture() {
        let outcome: DbResult<QueryResponse> = Err(DatabaseError::execute("a\nb"));
        let response = settle(outcome, ErrorPolicy::Capture, Instant::now()).unwrap();
        assert!(!response.ok());
        assert_eq!(response.error_message(), Some("a b"));
    }

    #[test]
    fn test_settle_raise() {
        let outcome: DbResult<QueryResponse> = Err(DatabaseError::execute("a\nb"));
        match settle(outcome, ErrorPolicy::Raise, Instant::now()) {
            Err(CedarError::Database(e)) => assert_eq!(e.message, "a\nb"),
            other => panic!("Expected Database error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_policy_is_capture() {
        assert_eq!(ErrorPolicy::default(), ErrorPolicy::Capture);
    }

    #[test]
    fn test_debug_hides_password() {
        let client = Client::new(ConnectionParams::new("h", "d", "u", "topsecret"));
        assert!(!format!("{client:?}").contains("topsecret"));
        assert_eq!(client.uri(), "host=h port=5432 dbname=d user=u password=topsecret");
    }
}
