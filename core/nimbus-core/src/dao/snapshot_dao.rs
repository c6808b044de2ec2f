//! Snapshot lineage
//!
//! 스냅샷은 볼륨별로 `prev_snapshot_id`로 연결된 선형 체인을 이룹니다.
//! 체인 탐색은 삭제 표시된 스냅샷도 포함하며, 어떤 연산도 행을
//! 물리적으로 삭제하지 않습니다.

use crate::db::{Database, IntoParam, Transaction};
use crate::error::{NimbusError, NimbusResult};
use crate::model::{Snapshot, SnapshotType};
use crate::search::{Direction, Filter, Op, SearchTemplate, contains_pattern};
use crate::store::GenericDao;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Result of a lookup that distinguishes "nothing there" from "could not look".
#[derive(Debug)]
pub enum LookupOutcome<T> {
    Found(T),
    NotFound,
    Failed(NimbusError),
}

impl<T> LookupOutcome<T> {
    pub fn found(self) -> Option<T> {
        match self {
            LookupOutcome::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LookupOutcome::Failed(_))
    }
}

/// Snapshot queries and lineage maintenance.
pub struct SnapshotDao {
    dao: GenericDao<Snapshot>,
    volume_search: SearchTemplate<Snapshot>,
    volume_type_search: SearchTemplate<Snapshot>,
    volume_version_search: SearchTemplate<Snapshot>,
    parent_search: SearchTemplate<Snapshot>,
    root_search: SearchTemplate<Snapshot>,
    backup_uuid_search: SearchTemplate<Snapshot>,
    last_snapshot_search: SearchTemplate<Snapshot>,
    list_search: SearchTemplate<Snapshot>,
}

impl SnapshotDao {
    pub fn new(db: Arc<Database>) -> NimbusResult<Self> {
        let dao = GenericDao::new(db);

        let mut volume = dao.create_search_builder();
        volume.and("volumeId", Snapshot::VOLUME_ID, Op::Eq)?;

        let mut volume_type = dao.create_search_builder();
        volume_type
            .and("volumeId", Snapshot::VOLUME_ID, Op::Eq)?
            .and("type", Snapshot::SNAPSHOT_TYPE, Op::Eq)?;

        let mut volume_version = dao.create_search_builder();
        volume_version
            .and("volumeId", Snapshot::VOLUME_ID, Op::Eq)?
            .and("version", Snapshot::VERSION, Op::Eq)?
            .and("excludedIds", Snapshot::ID, Op::NotIn)?;

        let mut parent = dao.create_search_builder();
        parent.and("prevSnapshotId", Snapshot::PREV_SNAPSHOT_ID, Op::Eq)?;

        let mut root = dao.create_search_builder();
        root.and("volumeId", Snapshot::VOLUME_ID, Op::Eq)?
            .and("root", Snapshot::PREV_SNAPSHOT_ID, Op::Null)?;

        let mut backup_uuid = dao.create_search_builder();
        backup_uuid
            .and("volumeId", Snapshot::VOLUME_ID, Op::Eq)?
            .and("backupUuid", Snapshot::BACKUP_SNAPSHOT_ID, Op::Eq)?;

        let mut last_snapshot = dao.create_search_builder();
        last_snapshot
            .and("volumeId", Snapshot::VOLUME_ID, Op::Eq)?
            .and("excludedId", Snapshot::ID, Op::NEq)?
            .and("path", Snapshot::PATH, Op::NotNull)?;

        let mut list = dao.create_search_builder();
        list.and("volumeId", Snapshot::VOLUME_ID, Op::Eq)?
            .and("type", Snapshot::SNAPSHOT_TYPE, Op::Eq)?
            .and("keyword", Snapshot::NAME, Op::Like)?;

        Ok(Self {
            volume_search: volume.done()?,
            volume_type_search: volume_type.done()?,
            volume_version_search: volume_version.done()?,
            parent_search: parent.done()?,
            root_search: root.done()?,
            backup_uuid_search: backup_uuid.done()?,
            last_snapshot_search: last_snapshot.done()?,
            list_search: list.done()?,
            dao,
        })
    }

    /// Generic CRUD over the snapshots table.
    pub fn base(&self) -> &GenericDao<Snapshot> {
        &self.dao
    }

    pub fn find_by_id(&self, id: i64) -> NimbusResult<Option<Snapshot>> {
        self.dao.find_by_id(id)
    }

    /// Soft-remove one snapshot; its chain links stay intact.
    pub fn remove(&self, id: i64) -> NimbusResult<bool> {
        self.dao.remove(id)
    }

    /// Child of `snapshot_id`, removed snapshots included.
    pub fn find_next_snapshot(&self, snapshot_id: i64) -> NimbusResult<Option<Snapshot>> {
        self.dao
            .database()
            .transaction(|tx| self.find_next_snapshot_in(tx, snapshot_id))
    }

    fn find_next_snapshot_in(
        &self,
        tx: &Transaction<'_>,
        snapshot_id: i64,
    ) -> NimbusResult<Option<Snapshot>> {
        let mut sc = self.parent_search.create();
        sc.set_parameters("prevSnapshotId", snapshot_id)?;
        self.dao
            .find_one_including_removed_by_in(tx, &sc, Some(&oldest_first()))
    }

    /// Active snapshots of `volume_id` linked to the backup artifact.
    pub fn list_by_backup_uuid(
        &self,
        volume_id: i64,
        backup_uuid: &str,
    ) -> NimbusResult<Vec<Snapshot>> {
        let mut sc = self.backup_uuid_search.create();
        sc.set_parameters("volumeId", volume_id)?
            .set_parameters("backupUuid", backup_uuid)?;
        self.dao.list_by(&sc, None)
    }

    /// Newest snapshot of the volume, other than `excluding_id`, whose
    /// backing path is set. Removed snapshots qualify: their backups still
    /// serve as a delta base.
    #[instrument(skip(self))]
    pub fn lookup_last_snapshot(&self, volume_id: i64, excluding_id: i64) -> LookupOutcome<i64> {
        match self.find_last_snapshot(volume_id, excluding_id) {
            Ok(Some(id)) => LookupOutcome::Found(id),
            Ok(None) => LookupOutcome::NotFound,
            Err(err) => LookupOutcome::Failed(err),
        }
    }

    fn find_last_snapshot(&self, volume_id: i64, excluding_id: i64) -> NimbusResult<Option<i64>> {
        let mut sc = self.last_snapshot_search.create();
        sc.set_parameters("volumeId", volume_id)?
            .set_parameters("excludedId", excluding_id)?;
        let filter = newest_first().with_limit(1);
        let rows = self.dao.list_including_removed_by(&sc, Some(&filter))?;
        Ok(rows.first().map(|snapshot| snapshot.id))
    }

    /// Like [`lookup_last_snapshot`](Self::lookup_last_snapshot), with
    /// "not found" and "lookup failed" both reported as `None`.
    pub fn get_last_snapshot(&self, volume_id: i64, excluding_id: i64) -> Option<i64> {
        match self.lookup_last_snapshot(volume_id, excluding_id) {
            LookupOutcome::Found(id) => Some(id),
            LookupOutcome::NotFound => None,
            LookupOutcome::Failed(err) => {
                error!(volume_id, excluding_id, error = %err, "error getting last snapshot");
                None
            }
        }
    }

    /// Move every snapshot of `volume_id` at version `from` to `to`,
    /// removed rows included, in one transaction.
    pub fn update_snapshot_version(&self, volume_id: i64, from: &str, to: &str) -> bool {
        self.update_snapshot_version_excluding(volume_id, from, to, &[])
    }

    /// As [`update_snapshot_version`](Self::update_snapshot_version), leaving
    /// `excluded_ids` at their current version.
    #[instrument(skip(self, excluded_ids), fields(excluded = excluded_ids.len()))]
    pub fn update_snapshot_version_excluding(
        &self,
        volume_id: i64,
        from: &str,
        to: &str,
        excluded_ids: &[i64],
    ) -> bool {
        match self.migrate_version(volume_id, from, to, excluded_ids) {
            Ok(changed) => {
                info!(changed, "snapshot version updated");
                true
            }
            Err(err) => {
                error!(error = %err, "error updating snapshot version");
                false
            }
        }
    }

    fn migrate_version(
        &self,
        volume_id: i64,
        from: &str,
        to: &str,
        excluded_ids: &[i64],
    ) -> NimbusResult<usize> {
        let mut sc = self.volume_version_search.create();
        sc.set_parameters("volumeId", volume_id)?
            .set_parameters("version", from)?;
        if !excluded_ids.is_empty() {
            sc.set_parameter_list("excludedIds", excluded_ids.iter().copied())?;
        }
        self.dao
            .update_by(&sc, &[(Snapshot::VERSION, to.into_scalar())])
    }

    pub fn list_by_volume_id(
        &self,
        filter: Option<&Filter<Snapshot>>,
        volume_id: i64,
    ) -> NimbusResult<Vec<Snapshot>> {
        let mut sc = self.volume_search.create();
        sc.set_parameters("volumeId", volume_id)?;
        self.dao.list_by(&sc, filter)
    }

    /// Active snapshots of a volume, optionally narrowed by type and a
    /// name substring.
    pub fn search(
        &self,
        volume_id: i64,
        snapshot_type: Option<SnapshotType>,
        keyword: Option<&str>,
        filter: Option<&Filter<Snapshot>>,
    ) -> NimbusResult<Vec<Snapshot>> {
        let mut sc = self.list_search.create();
        sc.set_parameters("volumeId", volume_id)?;
        if let Some(snapshot_type) = snapshot_type {
            sc.set_parameters("type", snapshot_type)?;
        }
        if let Some(keyword) = keyword {
            sc.set_parameters("keyword", contains_pattern(keyword))?;
        }
        self.dao.list_by(&sc, filter)
    }

    pub fn list_by_volume_id_including_removed(&self, volume_id: i64) -> NimbusResult<Vec<Snapshot>> {
        let mut sc = self.volume_search.create();
        sc.set_parameters("volumeId", volume_id)?;
        self.dao.list_including_removed_by(&sc, None)
    }

    pub fn list_by_volume_id_type(
        &self,
        filter: Option<&Filter<Snapshot>>,
        volume_id: i64,
        snapshot_type: SnapshotType,
    ) -> NimbusResult<Vec<Snapshot>> {
        let mut sc = self.volume_type_search.create();
        sc.set_parameters("volumeId", volume_id)?
            .set_parameters("type", snapshot_type)?;
        self.dao.list_by(&sc, filter)
    }

    pub fn list_by_volume_id_version(
        &self,
        filter: Option<&Filter<Snapshot>>,
        volume_id: i64,
        version: &str,
    ) -> NimbusResult<Vec<Snapshot>> {
        let mut sc = self.volume_version_search.create();
        sc.set_parameters("volumeId", volume_id)?
            .set_parameters("version", version)?;
        self.dao.list_by(&sc, filter)
    }

    /// Persist `snapshot` as the new tail of its volume's chain.
    ///
    /// The parent, if any, must belong to the same volume and must not
    /// already have a child. Removed snapshots keep their chain position, so
    /// a removed child still occupies it.
    #[instrument(skip(self, snapshot), fields(volume_id = snapshot.volume_id, parent = ?snapshot.prev_snapshot_id))]
    pub fn extend_chain(&self, snapshot: &Snapshot) -> NimbusResult<Snapshot> {
        self.dao.database().transaction(|tx| {
            let sibling = match snapshot.prev_snapshot_id {
                Some(parent_id) => {
                    let parent = self
                        .dao
                        .find_by_id_including_removed_in(tx, parent_id)?
                        .ok_or_else(|| {
                            NimbusError::not_found("snapshot", format!("parent id {parent_id}"))
                        })?;
                    if parent.volume_id != snapshot.volume_id {
                        return Err(NimbusError::LineageViolation(format!(
                            "parent {parent_id} belongs to volume {}, not {}",
                            parent.volume_id, snapshot.volume_id
                        )));
                    }
                    let mut sc = self.parent_search.create();
                    sc.set_parameters("prevSnapshotId", parent_id)?;
                    self.dao.find_one_including_removed_by_in(tx, &sc, None)?
                }
                None => {
                    let mut sc = self.root_search.create();
                    sc.set_parameters("volumeId", snapshot.volume_id)?;
                    self.dao.find_one_including_removed_by_in(tx, &sc, None)?
                }
            };

            if let Some(existing) = sibling {
                warn!(existing = existing.id, "chain position already taken");
                return Err(NimbusError::LineageViolation(format!(
                    "snapshot {} already follows {:?} on volume {}",
                    existing.id, snapshot.prev_snapshot_id, snapshot.volume_id
                )));
            }

            self.dao.persist_in(tx, snapshot)
        })
    }

    /// Fill the backup reference and backing path of an active snapshot.
    pub fn record_backup(
        &self,
        snapshot_id: i64,
        backup_uuid: &str,
        path: &str,
    ) -> NimbusResult<Snapshot> {
        self.dao.database().transaction(|tx| {
            let mut snapshot = self
                .dao
                .find_by_id_in(tx, snapshot_id)?
                .ok_or_else(|| NimbusError::not_found("snapshot", format!("id {snapshot_id}")))?;
            snapshot.backup_snapshot_id = Some(backup_uuid.to_string());
            snapshot.path = Some(path.to_string());
            self.dao.update_in(tx, &snapshot)?;
            debug!(snapshot_id, backup_uuid, "backup recorded");
            Ok(snapshot)
        })
    }

    /// The volume's lineage from its root, removed snapshots included.
    #[instrument(skip(self))]
    pub fn chain(&self, volume_id: i64) -> NimbusResult<Vec<Snapshot>> {
        self.dao.database().transaction(|tx| {
            let mut sc = self.root_search.create();
            sc.set_parameters("volumeId", volume_id)?;
            let Some(root) = self
                .dao
                .find_one_including_removed_by_in(tx, &sc, Some(&oldest_first()))?
            else {
                return Ok(Vec::new());
            };

            let mut seen = HashSet::from([root.id]);
            let mut chain = vec![root];
            while let Some(last) = chain.last() {
                let Some(next) = self.find_next_snapshot_in(tx, last.id)? else {
                    break;
                };
                if !seen.insert(next.id) {
                    warn!(snapshot_id = next.id, "cycle in snapshot chain");
                    break;
                }
                chain.push(next);
            }
            debug!(length = chain.len(), "chain walked");
            Ok(chain)
        })
    }
}

fn newest_first() -> Filter<Snapshot> {
    Filter::new()
        .order_by(Snapshot::CREATED, Direction::Desc)
        .order_by(Snapshot::ID, Direction::Desc)
}

fn oldest_first() -> Filter<Snapshot> {
    Filter::new()
        .order_by(Snapshot::CREATED, Direction::Asc)
        .order_by(Snapshot::ID, Direction::Asc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> SnapshotDao {
        let db = Arc::new(Database::open_in_memory().unwrap());
        SnapshotDao::new(db).unwrap()
    }

    fn manual(volume_id: i64, name: &str) -> Snapshot {
        Snapshot::new(volume_id, name, SnapshotType::Manual)
    }

    #[test]
    fn test_extend_chain_and_walk() {
        let dao = setup();
        let root = dao.extend_chain(&manual(1, "s1")).unwrap();
        let second = dao.extend_chain(&manual(1, "s2").with_parent(root.id)).unwrap();
        let third = dao.extend_chain(&manual(1, "s3").with_parent(second.id)).unwrap();

        let ids: Vec<i64> = dao.chain(1).unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![root.id, second.id, third.id]);
        assert_eq!(dao.find_next_snapshot(third.id).unwrap(), None);
        assert!(dao.chain(2).unwrap().is_empty());
    }

    #[test]
    fn test_extend_chain_rejects_foreign_parent() {
        let dao = setup();
        let other = dao.extend_chain(&manual(2, "other")).unwrap();
        let err = dao
            .extend_chain(&manual(1, "s1").with_parent(other.id))
            .unwrap_err();
        assert!(matches!(err, NimbusError::LineageViolation(_)));
        assert!(dao.list_by_volume_id(None, 1).unwrap().is_empty());
    }

    #[test]
    fn test_extend_chain_rejects_second_child() {
        let dao = setup();
        let root = dao.extend_chain(&manual(1, "s1")).unwrap();
        dao.extend_chain(&manual(1, "s2").with_parent(root.id)).unwrap();
        let err = dao
            .extend_chain(&manual(1, "s2b").with_parent(root.id))
            .unwrap_err();
        assert!(matches!(err, NimbusError::LineageViolation(_)));

        let err = dao.extend_chain(&manual(1, "root2")).unwrap_err();
        assert!(matches!(err, NimbusError::LineageViolation(_)));
    }

    #[test]
    fn test_extend_chain_missing_parent() {
        let dao = setup();
        let err = dao.extend_chain(&manual(1, "s").with_parent(42)).unwrap_err();
        assert!(matches!(err, NimbusError::NotFound { .. }));
    }

    #[test]
    fn test_last_snapshot_requires_path() {
        let dao = setup();
        let root = dao.extend_chain(&manual(1, "s1")).unwrap();
        let second = dao.extend_chain(&manual(1, "s2").with_parent(root.id)).unwrap();

        assert!(matches!(
            dao.lookup_last_snapshot(1, second.id),
            LookupOutcome::NotFound
        ));
        assert_eq!(dao.get_last_snapshot(1, second.id), None);

        dao.record_backup(root.id, "uuid-1", "/secondary/1").unwrap();
        assert_eq!(dao.get_last_snapshot(1, second.id), Some(root.id));
        // the excluded id is never returned
        assert_eq!(dao.get_last_snapshot(1, root.id), None);
    }

    #[test]
    fn test_list_by_backup_uuid_scoped_to_volume() {
        let dao = setup();
        let a = dao.extend_chain(&manual(1, "a")).unwrap();
        let b = dao.extend_chain(&manual(2, "b")).unwrap();
        dao.record_backup(a.id, "shared", "/p/a").unwrap();
        dao.record_backup(b.id, "shared", "/p/b").unwrap();

        let found = dao.list_by_backup_uuid(1, "shared").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, a.id);
    }

    #[test]
    fn test_update_snapshot_version_excluding() {
        let dao = setup();
        let root = dao.extend_chain(&manual(1, "s1")).unwrap();
        let second = dao.extend_chain(&manual(1, "s2").with_parent(root.id)).unwrap();

        assert!(dao.update_snapshot_version_excluding(1, "2.2", "2.3", &[second.id]));
        assert_eq!(dao.list_by_volume_id_version(None, 1, "2.3").unwrap().len(), 1);
        assert_eq!(
            dao.list_by_volume_id_version(None, 1, "2.2").unwrap()[0].id,
            second.id
        );

        assert!(dao.update_snapshot_version(1, "2.2", "2.3"));
        assert!(dao.list_by_volume_id_version(None, 1, "2.2").unwrap().is_empty());
    }

    #[test]
    fn test_list_by_type() {
        let dao = setup();
        let root = dao.extend_chain(&manual(1, "s1")).unwrap();
        dao.extend_chain(&Snapshot::new(1, "d", SnapshotType::Daily).with_parent(root.id))
            .unwrap();
        let daily = dao
            .list_by_volume_id_type(None, 1, SnapshotType::Daily)
            .unwrap();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].snapshot_type, SnapshotType::Daily);
    }

    #[test]
    fn test_search_optional_terms() {
        let dao = setup();
        let root = dao.extend_chain(&manual(1, "nightly-a")).unwrap();
        let daily = dao
            .extend_chain(&Snapshot::new(1, "nightly-b", SnapshotType::Daily).with_parent(root.id))
            .unwrap();
        dao.extend_chain(&manual(2, "nightly-c")).unwrap();

        assert_eq!(dao.search(1, None, None, None).unwrap().len(), 2);
        let found = dao.search(1, Some(SnapshotType::Daily), None, None).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, daily.id);
        assert_eq!(dao.search(1, None, Some("-a"), None).unwrap()[0].id, root.id);
        assert!(dao.search(1, None, Some("weekly"), None).unwrap().is_empty());
    }

    #[test]
    fn test_record_backup_unknown_snapshot() {
        let dao = setup();
        assert!(matches!(
            dao.record_backup(7, "u", "/p").unwrap_err(),
            NimbusError::NotFound { .. }
        ));
    }

    #[test]
    fn test_removed_child_keeps_chain_position() {
        let dao = setup();
        let root = dao.extend_chain(&manual(1, "s1")).unwrap();
        let child = dao.extend_chain(&manual(1, "s2").with_parent(root.id)).unwrap();
        dao.remove(child.id).unwrap();

        let err = dao
            .extend_chain(&manual(1, "s2b").with_parent(root.id))
            .unwrap_err();
        assert!(matches!(err, NimbusError::LineageViolation(_)));

        // removed root still occupies the root slot
        dao.remove(root.id).unwrap();
        let err = dao.extend_chain(&manual(1, "root2")).unwrap_err();
        assert!(matches!(err, NimbusError::LineageViolation(_)));

        let tail = dao.extend_chain(&manual(1, "s3").with_parent(child.id)).unwrap();
        let ids: Vec<i64> = dao.chain(1).unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![root.id, child.id, tail.id]);
    }

    #[test]
    fn test_last_snapshot_includes_removed() {
        let dao = setup();
        let root = dao.extend_chain(&manual(1, "s1")).unwrap();
        let second = dao.extend_chain(&manual(1, "s2").with_parent(root.id)).unwrap();
        dao.record_backup(root.id, "uuid-1", "/secondary/1").unwrap();
        dao.remove(root.id).unwrap();

        assert_eq!(dao.get_last_snapshot(1, second.id), Some(root.id));
    }

    #[test]
    fn test_search_keyword_is_literal() {
        let dao = setup();
        let literal = dao.extend_chain(&manual(1, "a_b")).unwrap();
        dao.extend_chain(&manual(1, "axb").with_parent(literal.id)).unwrap();

        let found = dao.search(1, None, Some("a_b"), None).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, literal.id);
        assert!(dao.search(1, None, Some("%"), None).unwrap().is_empty());
    }
}
