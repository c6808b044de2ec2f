// 검색 템플릿과 GenericDao 통합 테스트

use nimbus_core::dao::ClusterDao;
use nimbus_core::db::{Database, IntoParam};
use nimbus_core::error::{NimbusError, NimbusResult};
use nimbus_core::model::{Cluster, Host};
use nimbus_core::search::{Direction, Field, Filter, Op, SearchBuilder};
use nimbus_core::store::GenericDao;
use std::sync::Arc;
use std::thread;

fn database() -> Arc<Database> {
    Arc::new(Database::open_in_memory().expect("in-memory database"))
}

#[test]
fn test_template_shared_across_threads() -> NimbusResult<()> {
    let mut builder = SearchBuilder::<Cluster>::new();
    builder
        .and("zoneId", Cluster::ZONE_ID, Op::Eq)?
        .and("podId", Cluster::POD_ID, Op::Eq)?
        .or("names", Cluster::NAME, Op::In)?;
    let template = builder.done()?;

    // 같은 템플릿에서 스레드마다 독립적인 조건을 만든다
    let handles: Vec<_> = (0..8i64)
        .map(|worker| {
            let template = template.clone();
            thread::spawn(move || -> NimbusResult<()> {
                for round in 0..200i64 {
                    let mut sc = template.create();
                    sc.set_parameters("zoneId", worker)?;
                    if round % 2 == 0 {
                        sc.set_parameters("podId", round)?;
                    }
                    let predicate = sc.predicate().expect("zone is bound");
                    let expected = if round % 2 == 0 { 2 } else { 1 };
                    assert_eq!(predicate.params.len(), expected);
                    assert_eq!(predicate.params[0], worker.into_scalar());
                }
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker panicked")?;
    }

    // 템플릿 자체는 바뀌지 않는다
    assert_eq!(template.parameter_names(), vec!["names", "podId", "zoneId"]);
    assert!(template.create().predicate().is_none());
    Ok(())
}

#[test]
fn test_unbound_terms_do_not_constrain() -> NimbusResult<()> {
    let db = database();
    let dao = GenericDao::<Cluster>::new(Arc::clone(&db));
    dao.persist(&Cluster::new("a", 1, 1))?;
    dao.persist(&Cluster::new("b", 1, 2))?;
    dao.persist(&Cluster::new("c", 2, 3))?;

    let mut builder = dao.create_search_builder();
    builder
        .and("zoneId", Cluster::ZONE_ID, Op::Eq)?
        .and("podId", Cluster::POD_ID, Op::Eq)?;
    let template = builder.done()?;

    let mut sc = template.create();
    sc.set_parameters("zoneId", 1)?;
    assert_eq!(dao.list_by(&sc, None)?.len(), 2);
    assert_eq!(dao.count_by(&sc)?, 2);

    sc.set_parameters("podId", 2)?;
    let found = dao.list_by(&sc, None)?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "b");

    assert_eq!(dao.count_by(&template.create())?, 3);
    Ok(())
}

#[test]
fn test_soft_delete_modes() -> NimbusResult<()> {
    let db = database();
    let dao = GenericDao::<Cluster>::new(db);
    let kept = dao.persist(&Cluster::new("kept", 1, 1))?;
    let gone = dao.persist(&Cluster::new("gone", 1, 1))?;

    assert!(dao.remove(gone.id)?);
    // 이미 삭제된 행은 다시 표시되지 않는다
    assert!(!dao.remove(gone.id)?);

    let mut builder = dao.create_search_builder();
    builder.and("zoneId", Cluster::ZONE_ID, Op::Eq)?;
    let template = builder.done()?;
    let mut sc = template.create();
    sc.set_parameters("zoneId", 1)?;

    let active = dao.list_by(&sc, None)?;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, kept.id);

    let all = dao.list_including_removed_by(&sc, Some(&Filter::new().order_by(Cluster::ID, Direction::Asc)))?;
    assert_eq!(all.len(), 2);
    assert!(all[1].removed.is_some());

    assert!(dao.find_by_id(gone.id)?.is_none());
    assert_eq!(dao.find_by_id_including_removed(gone.id)?.map(|c| c.name), Some("gone".to_string()));
    Ok(())
}

#[test]
fn test_templates_by_field_name() -> NimbusResult<()> {
    let db = database();
    let clusters = ClusterDao::new(Arc::clone(&db))?;
    let hosts = GenericDao::<Host>::new(db);

    // 문자열 필드 이름으로도 템플릿을 선언할 수 있다
    let mut builder = clusters.base().create_search_builder();
    builder.and("name", Field::<Cluster>::named("name")?, Op::Eq)?;
    let mut sc = builder.done()?.create();
    sc.set_parameters("name", "x")?;
    assert!(clusters.base().list_by(&sc, None)?.is_empty());

    let mut host_builder = hosts.create_search_builder();
    host_builder.and("url", Host::URL, Op::Eq)?;
    assert!(host_builder.done()?.create().predicate().is_none());
    Ok(())
}

#[test]
fn test_bulk_update_requires_predicate() -> NimbusResult<()> {
    let dao = GenericDao::<Cluster>::new(database());
    dao.persist(&Cluster::new("a", 1, 1))?;

    let mut builder = dao.create_search_builder();
    builder.and("zoneId", Cluster::ZONE_ID, Op::Eq)?;
    let template = builder.done()?;

    let err = dao
        .update_by(&template.create(), &[(Cluster::NAME, "z".into_scalar())])
        .unwrap_err();
    assert!(matches!(err, NimbusError::InvalidOperation { .. }));

    let mut sc = template.create();
    sc.set_parameters("zoneId", 1)?;
    assert_eq!(dao.update_by(&sc, &[(Cluster::NAME, "z".into_scalar())])?, 1);
    assert_eq!(dao.list_all(None)?[0].name, "z");
    Ok(())
}
