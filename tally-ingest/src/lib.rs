//! tally-ingest: statement CSV ingestion with fuzzy column matching.

pub mod loader;
pub mod resolver;
pub mod similarity;

pub use loader::{load_statement, read_statement, Statement};
pub use resolver::{ColumnMap, ColumnResolver, FieldAliases, ResolvedColumn, DEFAULT_CUTOFF};
