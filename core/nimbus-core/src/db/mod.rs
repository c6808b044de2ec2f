//! Relational backend: connection, transactions, parameter values

pub mod database;
pub mod schema;
pub mod transaction;
pub mod value;

pub use database::Database;
pub use transaction::Transaction;
pub use value::{IntoParam, ScalarValue};

/// Row handle passed to entity decoders
pub use rusqlite::Row;

/// Result type of row decoding
pub type SqlResult<T> = rusqlite::Result<T>;

/// Current wall-clock time in epoch milliseconds (creation/removed markers).
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
