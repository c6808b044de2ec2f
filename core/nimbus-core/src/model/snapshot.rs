use crate::db::{IntoParam, ScalarValue, now_millis};
use nimbus_derive::Entity;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use serde::Serialize;
use std::fmt;

/// Version label new snapshots start at.
pub const BASELINE_VERSION: &str = "2.2";

/// Snapshot schedule kind, persisted as its ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SnapshotType {
    Manual,
    Recurring,
    Template,
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl SnapshotType {
    const ALL: [SnapshotType; 7] = [
        SnapshotType::Manual,
        SnapshotType::Recurring,
        SnapshotType::Template,
        SnapshotType::Hourly,
        SnapshotType::Daily,
        SnapshotType::Weekly,
        SnapshotType::Monthly,
    ];

    pub fn ordinal(self) -> i32 {
        self as i32
    }

    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SnapshotType::Manual => "MANUAL",
            SnapshotType::Recurring => "RECURRING",
            SnapshotType::Template => "TEMPLATE",
            SnapshotType::Hourly => "HOURLY",
            SnapshotType::Daily => "DAILY",
            SnapshotType::Weekly => "WEEKLY",
            SnapshotType::Monthly => "MONTHLY",
        }
    }

    /// Case-insensitive name lookup (`daily`, `DAILY`).
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for SnapshotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IntoParam for SnapshotType {
    fn into_scalar(self) -> ScalarValue {
        ScalarValue::Int32(self.ordinal())
    }
}

impl FromSql for SnapshotType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let ordinal = value.as_i64()?;
        SnapshotType::from_ordinal(ordinal).ok_or(FromSqlError::OutOfRange(ordinal))
    }
}

/// Point-in-time copy of a volume; one link of the volume's lineage.
#[derive(Entity, Debug, Clone, PartialEq, Serialize)]
#[entity(table = "snapshots")]
pub struct Snapshot {
    #[entity(id)]
    pub id: i64,
    pub volume_id: i64,
    pub name: String,
    /// Parent in the chain; `None` for the root
    pub prev_snapshot_id: Option<i64>,
    /// Backup artifact reference, filled once the backup completes
    pub backup_snapshot_id: Option<String>,
    /// Backing path, filled once the copy materializes
    pub path: Option<String>,
    pub snapshot_type: SnapshotType,
    pub version: String,
    pub created: i64,
    #[entity(removed)]
    pub removed: Option<i64>,
}

impl Snapshot {
    pub fn new(volume_id: i64, name: impl Into<String>, snapshot_type: SnapshotType) -> Self {
        Self {
            id: 0,
            volume_id,
            name: name.into(),
            prev_snapshot_id: None,
            backup_snapshot_id: None,
            path: None,
            snapshot_type,
            version: BASELINE_VERSION.to_string(),
            created: now_millis(),
            removed: None,
        }
    }

    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.prev_snapshot_id = Some(parent_id);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn is_removed(&self) -> bool {
        self.removed.is_some()
    }
}
