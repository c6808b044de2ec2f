use crate::api::commands::ListSnapshotsCmd;
use crate::dao::SnapshotDao;
use crate::db::Database;
use crate::error::NimbusResult;
use crate::model::Snapshot;
use crate::search::{Direction, Filter};
use std::sync::Arc;

/// Backend of `listSnapshots`.
pub struct SnapshotManager {
    db: Arc<Database>,
    snapshots: SnapshotDao,
}

impl SnapshotManager {
    pub fn new(db: Arc<Database>) -> NimbusResult<Self> {
        Ok(Self {
            snapshots: SnapshotDao::new(Arc::clone(&db))?,
            db,
        })
    }

    pub fn snapshots(&self) -> &SnapshotDao {
        &self.snapshots
    }

    /// Active snapshots of the volume, newest first.
    pub fn list_snapshots(&self, cmd: &ListSnapshotsCmd) -> NimbusResult<Vec<Snapshot>> {
        let filter = cmd.list.page_filter(
            Filter::new()
                .order_by(Snapshot::CREATED, Direction::Desc)
                .order_by(Snapshot::ID, Direction::Desc),
            self.db.config().default_page_size,
        );
        self.snapshots.search(
            cmd.volume_id,
            cmd.snapshot_type,
            cmd.list.keyword.as_deref(),
            Some(&filter),
        )
    }
}
