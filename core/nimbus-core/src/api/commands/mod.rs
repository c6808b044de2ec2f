//! Shipped API commands

pub mod add_host;
pub mod list_clusters;
pub mod list_snapshots;

pub use add_host::AddHostCmd;
pub use list_clusters::ListClustersCmd;
pub use list_snapshots::ListSnapshotsCmd;
