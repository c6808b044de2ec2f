// 스냅샷 계보 통합 테스트: 체인 탐색, 버전 마이그레이션

use nimbus_core::dao::{LookupOutcome, SnapshotDao};
use nimbus_core::db::Database;
use nimbus_core::error::NimbusResult;
use nimbus_core::model::{BASELINE_VERSION, Snapshot, SnapshotType};
use nimbus_core::DatabaseConfig;
use std::sync::Arc;

fn snapshots() -> NimbusResult<SnapshotDao> {
    SnapshotDao::new(Arc::new(Database::open_in_memory()?))
}

fn build_chain(dao: &SnapshotDao, volume_id: i64, len: usize) -> NimbusResult<Vec<Snapshot>> {
    let mut chain: Vec<Snapshot> = Vec::with_capacity(len);
    for i in 0..len {
        let mut snapshot = Snapshot::new(volume_id, format!("v{volume_id}-s{i}"), SnapshotType::Hourly);
        if let Some(parent) = chain.last() {
            snapshot = snapshot.with_parent(parent.id);
        }
        chain.push(dao.extend_chain(&snapshot)?);
    }
    Ok(chain)
}

#[test]
fn test_chain_traversal_includes_removed() -> NimbusResult<()> {
    let dao = snapshots()?;
    let chain = build_chain(&dao, 1, 4)?;
    build_chain(&dao, 2, 2)?;

    // 중간 스냅샷을 삭제해도 체인은 끊기지 않는다
    assert!(dao.remove(chain[1].id)?);
    assert!(dao.remove(chain[0].id)?);

    assert_eq!(
        dao.find_next_snapshot(chain[0].id)?.map(|s| s.id),
        Some(chain[1].id)
    );
    let next = dao.find_next_snapshot(chain[1].id)?.expect("successor of removed snapshot");
    assert_eq!(next.id, chain[2].id);

    let walked = dao.chain(1)?;
    let ids: Vec<i64> = walked.iter().map(|s| s.id).collect();
    assert_eq!(ids, chain.iter().map(|s| s.id).collect::<Vec<_>>());
    assert!(walked[0].is_removed() && walked[1].is_removed());
    assert!(!walked[3].is_removed());

    // 삭제 표시만 되고 행은 남아 있다
    assert_eq!(dao.list_by_volume_id_including_removed(1)?.len(), 4);
    assert_eq!(dao.list_by_volume_id(None, 1)?.len(), 2);
    Ok(())
}

#[test]
fn test_chain_stays_linear_after_removal() -> NimbusResult<()> {
    let dao = snapshots()?;
    let chain = build_chain(&dao, 5, 2)?;
    dao.remove(chain[1].id)?;

    // 삭제된 자식도 자리를 차지하므로 부모 아래에 새 자식을 붙일 수 없다
    assert!(
        dao.extend_chain(&Snapshot::new(5, "replacement", SnapshotType::Manual).with_parent(chain[0].id))
            .is_err()
    );

    // 새 스냅샷은 꼬리(삭제된 스냅샷)에 이어진다
    let tail = dao.extend_chain(
        &Snapshot::new(5, "replacement", SnapshotType::Manual).with_parent(chain[1].id),
    )?;
    assert_eq!(dao.find_next_snapshot(chain[0].id)?.map(|s| s.id), Some(chain[1].id));
    assert_eq!(dao.find_next_snapshot(chain[1].id)?.map(|s| s.id), Some(tail.id));

    let walked: Vec<i64> = dao.chain(5)?.iter().map(|s| s.id).collect();
    assert_eq!(walked, vec![chain[0].id, chain[1].id, tail.id]);
    for active in dao.list_by_volume_id(None, 5)? {
        assert!(walked.contains(&active.id), "snapshot {} missing from chain", active.id);
    }
    Ok(())
}

#[test]
fn test_version_migration_all_or_nothing() -> NimbusResult<()> {
    let dir = tempfile::tempdir()?;
    let db = Arc::new(Database::open(
        DatabaseConfig::default().with_path(dir.path().join("lineage.db")),
    )?);
    let dao = SnapshotDao::new(Arc::clone(&db))?;
    let chain = build_chain(&dao, 9, 5)?;
    dao.remove(chain[0].id)?;

    // 마지막 행의 갱신을 실패시키는 트리거
    let blocked = chain[4].id;
    db.transaction(|tx| {
        tx.execute(
            &format!(
                "CREATE TRIGGER block_migration BEFORE UPDATE OF version ON snapshots \
                 WHEN NEW.id = {blocked} BEGIN SELECT RAISE(ABORT, 'blocked'); END"
            ),
            &[],
        )
    })?;

    assert!(!dao.update_snapshot_version(9, BASELINE_VERSION, "2.3"));
    assert_eq!(
        dao.list_by_volume_id_version(None, 9, BASELINE_VERSION)?.len(),
        4,
        "no active row may move when one row fails"
    );
    assert!(dao.list_by_volume_id_version(None, 9, "2.3")?.is_empty());

    // 실패하는 행을 제외하면 나머지는 한 번에 이동한다 (삭제된 행 포함)
    assert!(dao.update_snapshot_version_excluding(9, BASELINE_VERSION, "2.3", &[blocked]));
    let migrated: Vec<Snapshot> = dao
        .list_by_volume_id_including_removed(9)?
        .into_iter()
        .filter(|s| s.version == "2.3")
        .collect();
    assert_eq!(migrated.len(), 4);
    assert!(migrated.iter().any(Snapshot::is_removed));
    Ok(())
}

#[test]
fn test_last_snapshot_lookup_outcomes() -> NimbusResult<()> {
    let dao = snapshots()?;
    let chain = build_chain(&dao, 3, 3)?;

    assert!(matches!(dao.lookup_last_snapshot(3, chain[2].id), LookupOutcome::NotFound));

    dao.record_backup(chain[0].id, "b-0", "/store/0")?;
    dao.record_backup(chain[1].id, "b-1", "/store/1")?;
    assert_eq!(dao.lookup_last_snapshot(3, chain[2].id).found(), Some(chain[1].id));
    assert_eq!(dao.get_last_snapshot(3, chain[1].id), Some(chain[0].id));

    // 삭제된 스냅샷의 백업도 여전히 기준이 된다
    dao.remove(chain[1].id)?;
    assert_eq!(dao.get_last_snapshot(3, chain[2].id), Some(chain[1].id));

    assert!(dao.list_by_backup_uuid(3, "b-1")?.is_empty());
    assert_eq!(dao.list_by_backup_uuid(3, "b-0")?.len(), 1);
    assert!(dao.list_by_backup_uuid(4, "b-0")?.is_empty());
    Ok(())
}
