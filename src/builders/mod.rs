mod insert;

pub use insert::{build_insert, InsertBuilder, Placeholder};
