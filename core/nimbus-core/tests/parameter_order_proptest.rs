// 바인딩 순서와 무관하게 파라미터는 선언 순서로 나온다

use nimbus_core::api::bind;
use nimbus_core::api::commands::ListClustersCmd;
use nimbus_core::api::{ApiCommand, RawParams};
use nimbus_core::db::{IntoParam, ScalarValue};
use nimbus_core::model::Cluster;
use nimbus_core::NimbusResult;
use nimbus_core::search::{Op, SearchBuilder, SearchTemplate};
use proptest::prelude::*;

const NAMES: [&str; 4] = ["id", "zoneId", "podId", "name"];

fn template() -> NimbusResult<SearchTemplate<Cluster>> {
    let mut builder = SearchBuilder::<Cluster>::new();
    builder
        .and("id", Cluster::ID, Op::Eq)?
        .and("zoneId", Cluster::ZONE_ID, Op::Eq)?
        .or("podId", Cluster::POD_ID, Op::Eq)?
        .and("name", Cluster::NAME, Op::Eq)?;
    builder.done()
}

fn value(slot: usize, n: i64) -> ScalarValue {
    if slot == 3 {
        format!("c{n}").into_scalar()
    } else {
        n.into_scalar()
    }
}

proptest! {
    #[test]
    fn prop_params_follow_declaration_order(
        values in prop::collection::vec(prop::option::of(0i64..1_000), 4),
        order in Just(vec![0usize, 1, 2, 3]).prop_shuffle(),
    ) {
        let template = template().unwrap();
        let mut sc = template.create();
        for &slot in &order {
            if let Some(n) = values[slot] {
                sc.set_parameters(NAMES[slot], value(slot, n)).unwrap();
            }
        }

        let expected: Vec<ScalarValue> = values
            .iter()
            .enumerate()
            .filter_map(|(slot, v)| v.map(|n| value(slot, n)))
            .collect();

        match sc.predicate() {
            Some(predicate) => {
                prop_assert_eq!(predicate.params, expected);
                prop_assert_eq!(predicate.sql.matches('?').count(), values.iter().flatten().count());
            }
            None => prop_assert!(expected.is_empty()),
        }
    }

    #[test]
    fn prop_bound_longs_survive_binding(zone in any::<i64>(), page in 1i64..10_000) {
        let raw: RawParams = [
            ("zoneid".to_string(), zone.to_string()),
            ("page".to_string(), format!(" {page} ")),
        ]
        .into_iter()
        .collect();
        let params = bind(ListClustersCmd::PARAMETERS, &raw).unwrap();
        let cmd = ListClustersCmd::from_params(&params).unwrap();
        prop_assert_eq!(cmd.zone_id, Some(zone));
        prop_assert_eq!(cmd.list.page, page as u64);
    }
}
