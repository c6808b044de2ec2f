//! Persisted table layout
//!
//! Every entity table carries an integer primary key, a nullable `removed`
//! marker (epoch millis) and its domain columns.

use rusqlite::Connection;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS clusters (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT    NOT NULL,
    zone_id         INTEGER NOT NULL,
    pod_id          INTEGER NOT NULL,
    hypervisor_type TEXT,
    created         INTEGER NOT NULL,
    removed         INTEGER
);

CREATE TABLE IF NOT EXISTS hosts (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT    NOT NULL,
    zone_id         INTEGER NOT NULL,
    pod_id          INTEGER,
    cluster_id      INTEGER,
    url             TEXT    NOT NULL,
    hypervisor_type TEXT,
    status          TEXT    NOT NULL,
    created         INTEGER NOT NULL,
    removed         INTEGER
);

CREATE TABLE IF NOT EXISTS snapshots (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    volume_id          INTEGER NOT NULL,
    name               TEXT    NOT NULL,
    prev_snapshot_id   INTEGER,
    backup_snapshot_id TEXT,
    path               TEXT,
    snapshot_type      INTEGER NOT NULL,
    version            TEXT    NOT NULL DEFAULT '2.2',
    created            INTEGER NOT NULL,
    removed            INTEGER
);

CREATE INDEX IF NOT EXISTS i_hosts__cluster_id ON hosts (cluster_id);
CREATE INDEX IF NOT EXISTS i_snapshots__volume_id ON snapshots (volume_id);
CREATE INDEX IF NOT EXISTS i_snapshots__prev_snapshot_id ON snapshots (prev_snapshot_id);
"#;

/// Create missing tables and indexes. Idempotent.
pub fn install(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}
