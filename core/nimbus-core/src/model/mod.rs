//! Persisted control-plane entities

pub mod cluster;
pub mod host;
pub mod snapshot;

pub use cluster::Cluster;
pub use host::{Host, HostStatus};
pub use snapshot::{BASELINE_VERSION, Snapshot, SnapshotType};
