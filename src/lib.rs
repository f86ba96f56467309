//! cedar-client - a small convenience client for CedarDB and other PostgreSQL-compatible databases
//!
//! Connection and execution are delegated to a driver (tokio-postgres by default).
//! Every outcome, success or failure, comes back as a uniform [`QueryResponse`]
//! that can be inspected or rendered as a text table.
//!
//! # Example
//! ```ignore
//! use cedar_client::{Client, ConnectionParams, SqlValue};
//!
//! let client = Client::new(ConnectionParams::new("localhost", "testdb", "admin", "secret"));
//!
//! let response = client.query("select id, name from users").await?;
//! if response.ok() {
//!     println!("{}", response);
//! } else {
//!     eprintln!("query failed: {}", response.error_message().unwrap_or_default());
//! }
//!
//! let rows = vec![
//!     vec![SqlValue::from(1), SqlValue::from("Alice")],
//!     vec![SqlValue::from(2), SqlValue::from("Bob")],
//! ];
//! let inserted = client.insert_many("users", &rows).await?;
//! assert_eq!(inserted.row_count(), 2);
//! ```

pub mod builders;
pub mod config;
pub mod drivers;
pub mod error;
pub mod table;
pub mod traits;
pub mod types;

mod client;

// Re-export main types for convenient access
pub use builders::{build_insert, InsertBuilder, Placeholder};
pub use client::{Client, ErrorPolicy};
pub use config::ConnectionParams;
pub use error::{CedarError, DatabaseError, DatabaseErrorKind, DbResult, Result};
pub use table::{render_table, Alignment, TableOptions, TableRow};
pub use traits::{Connection, DatabaseDriver};
pub use types::{ColumnDescriptor, Cursor, QueryResponse, Row, SqlValue, INSERT_PIPELINE};
