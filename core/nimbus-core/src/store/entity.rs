//! Entity mapping trait

use crate::db::{IntoParam, Row, ScalarValue, SqlResult};
use std::fmt;

/// A struct persisted as one row of one table.
///
/// Usually derived with `#[derive(Entity)]`; `COLUMNS`, `from_row` and
/// `values` all follow struct field declaration order.
pub trait Entity: Sized + Send + Sync + 'static {
    /// Primary key type; keys are assigned by the database on insert.
    type Key: IntoParam + Clone + fmt::Debug + Send + Sync + 'static;

    const TABLE: &'static str;
    const KEY_COLUMN: &'static str;
    /// Soft-delete marker column, if the entity supports removal
    const REMOVED_COLUMN: Option<&'static str>;
    const COLUMNS: &'static [&'static str];

    fn key(&self) -> Self::Key;

    fn from_row(row: &Row<'_>) -> SqlResult<Self>;

    /// Every column value, key included, in `COLUMNS` order.
    fn values(&self) -> Vec<ScalarValue>;
}
