//! 스냅샷 체인과 명령 디스패치 예제
//!
//! 실행: cargo run --example snapshot_chain --features logging

use nimbus_core::api::commands::{AddHostCmd, ListSnapshotsCmd};
use nimbus_core::api::{RawParams, ResponseObject};
use nimbus_core::manager::{DiscoveredHost, ManagementServer, StaticDiscoverer};
use nimbus_core::model::{BASELINE_VERSION, Snapshot, SnapshotType};
use nimbus_core::{DatabaseConfig, NimbusResult};
use std::sync::Arc;

fn params(pairs: &[(&str, &str)]) -> RawParams {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn main() -> NimbusResult<()> {
    nimbus_core::logging::init();
    println!("=== Nimbus 스냅샷 체인 예제 ===\n");

    // 1. 관리 서버 준비
    println!("1. 관리 서버 생성...");
    let discoverer = Arc::new(StaticDiscoverer::new());
    discoverer.insert("http://10.1.1.5", vec![DiscoveredHost::new("kvm-01", "KVM")]);
    let server = ManagementServer::open(DatabaseConfig::from_env()?, discoverer)?;
    println!("   ✓ 등록된 연산: {:?}\n", server.dispatcher().operations());

    // 2. 호스트 추가 (addHost → discoverHosts)
    println!("2. 호스트 추가...");
    let added = server.handle::<AddHostCmd>(&params(&[
        ("zoneid", "1"),
        ("podid", "1"),
        ("clustername", "rack-a"),
        ("url", "http://10.1.1.5"),
        ("username", "root"),
        ("password", "password"),
    ]));
    match added {
        Ok(response) => println!("   {}\n", response.to_wire()?),
        Err(err) => println!("   ✗ {err}\n"),
    }

    // 3. 스냅샷 체인 구성
    println!("3. 스냅샷 체인 구성...");
    let snapshots = server.snapshots().snapshots();
    let mut parent: Option<i64> = None;
    for (i, kind) in [SnapshotType::Manual, SnapshotType::Daily, SnapshotType::Daily]
        .into_iter()
        .enumerate()
    {
        let mut snapshot = Snapshot::new(42, format!("vol42-{i}"), kind);
        if let Some(id) = parent {
            snapshot = snapshot.with_parent(id);
        }
        let stored = snapshots.extend_chain(&snapshot)?;
        snapshots.record_backup(stored.id, &format!("backup-{i}"), &format!("/secondary/42/{i}"))?;
        parent = Some(stored.id);
    }
    let first = snapshots.chain(42)?[0].id;
    snapshots.remove(first)?;
    println!("   ✓ 체인 길이 (삭제 포함): {}", snapshots.chain(42)?.len());
    println!(
        "   ✓ 마지막 스냅샷: {:?}\n",
        snapshots.get_last_snapshot(42, parent.unwrap_or_default())
    );

    // 4. 버전 마이그레이션
    println!("4. 버전 마이그레이션...");
    let migrated = snapshots.update_snapshot_version(42, BASELINE_VERSION, "2.3");
    println!("   ✓ 성공: {migrated}\n");

    // 5. 목록 조회 (listSnapshots)
    println!("5. 스냅샷 목록...");
    match server.handle::<ListSnapshotsCmd>(&params(&[("volumeid", "42"), ("pagesize", "10")])) {
        Ok(response) => println!("   {}", response.to_wire()?),
        Err(err) => println!("   ✗ {err}"),
    }

    Ok(())
}
