mod tokio_postgres;

pub use self::in_memory_test::{InMemoryTestCursorBuilder, InMemoryTestDriver, RecordedStatement};
pub use self::tokio_postgres::TokioPostgresDriver;
