mod cursor;
mod response;
mod sql_value;

pub use cursor::{ColumnDescriptor, Cursor};
pub use response::{QueryResponse, INSERT_PIPELINE};
pub use sql_value::{Row, SqlValue};
