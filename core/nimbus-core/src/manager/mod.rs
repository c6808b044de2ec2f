//! Backend operations behind the shipped commands
//!
//! | 명령 | 백엔드 연산 | 구현 |
//! |------|-------------|------|
//! | `addHost` | `discoverHosts` | [`ResourceManager::discover_hosts`] |
//! | `listClusters` | `searchForClusters` | [`ResourceManager::search_for_clusters`] |
//! | `listSnapshots` | `listSnapshots` | [`SnapshotManager::list_snapshots`] |

pub mod discovery;
pub mod resource;
pub mod snapshot;

pub use discovery::{DiscoveredHost, DiscoveryRequest, HostDiscoverer, StaticDiscoverer};
pub use resource::ResourceManager;
pub use snapshot::SnapshotManager;

use crate::api::commands::{AddHostCmd, ListClustersCmd, ListSnapshotsCmd};
use crate::api::{ApiCommand, ApiError, Dispatcher, RawParams};
use crate::config::DatabaseConfig;
use crate::db::Database;
use crate::error::NimbusResult;
use std::sync::Arc;
use tracing::info;

/// Register every shipped backend operation on `dispatcher`.
pub fn register_operations(
    dispatcher: &Dispatcher,
    resources: Arc<ResourceManager>,
    snapshots: Arc<SnapshotManager>,
) -> NimbusResult<()> {
    let discover = Arc::clone(&resources);
    dispatcher.register_handler::<AddHostCmd, _>(move |cmd| discover.discover_hosts(cmd))?;
    dispatcher.register_handler::<ListClustersCmd, _>(move |cmd| resources.search_for_clusters(cmd))?;
    dispatcher.register_handler::<ListSnapshotsCmd, _>(move |cmd| snapshots.list_snapshots(cmd))?;
    Ok(())
}

/// Database, managers and a dispatcher with every operation registered.
pub struct ManagementServer {
    db: Arc<Database>,
    resources: Arc<ResourceManager>,
    snapshots: Arc<SnapshotManager>,
    dispatcher: Dispatcher,
}

impl ManagementServer {
    pub fn open(config: DatabaseConfig, discoverer: Arc<dyn HostDiscoverer>) -> NimbusResult<Self> {
        let db = Arc::new(Database::open(config)?);
        let resources = Arc::new(ResourceManager::new(Arc::clone(&db), discoverer)?);
        let snapshots = Arc::new(SnapshotManager::new(Arc::clone(&db))?);

        let dispatcher = Dispatcher::new();
        register_operations(&dispatcher, Arc::clone(&resources), Arc::clone(&snapshots))?;
        info!(operations = ?dispatcher.operations(), "management server ready");

        Ok(Self {
            db,
            resources,
            snapshots,
            dispatcher,
        })
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn snapshots(&self) -> &SnapshotManager {
        &self.snapshots
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn handle<C: ApiCommand>(&self, raw: &RawParams) -> Result<C::Response, ApiError> {
        self.dispatcher.dispatch::<C>(raw)
    }
}
