//! Domain DAOs built on [`GenericDao`](crate::store::GenericDao)

pub mod cluster_dao;
pub mod host_dao;
pub mod snapshot_dao;

pub use cluster_dao::{ClusterDao, ClusterQuery};
pub use host_dao::HostDao;
pub use snapshot_dao::{LookupOutcome, SnapshotDao};
