use crate::db::{Database, Transaction};
use crate::error::NimbusResult;
use crate::model::Cluster;
use crate::search::{Filter, Op, SearchTemplate, contains_pattern};
use crate::store::GenericDao;
use std::sync::Arc;

/// Optional cluster search terms; unset terms do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterQuery {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub pod_id: Option<i64>,
    pub zone_id: Option<i64>,
    /// Substring match on the name
    pub keyword: Option<String>,
}

pub struct ClusterDao {
    dao: GenericDao<Cluster>,
    search: SearchTemplate<Cluster>,
    name_search: SearchTemplate<Cluster>,
}

impl ClusterDao {
    pub fn new(db: Arc<Database>) -> NimbusResult<Self> {
        let dao = GenericDao::new(db);

        let mut search = dao.create_search_builder();
        search
            .and("id", Cluster::ID, Op::Eq)?
            .and("name", Cluster::NAME, Op::Eq)?
            .and("podId", Cluster::POD_ID, Op::Eq)?
            .and("zoneId", Cluster::ZONE_ID, Op::Eq)?
            .and("keyword", Cluster::NAME, Op::Like)?;

        let mut name_search = dao.create_search_builder();
        name_search
            .and("zoneId", Cluster::ZONE_ID, Op::Eq)?
            .and("podId", Cluster::POD_ID, Op::Eq)?
            .and("name", Cluster::NAME, Op::Eq)?;

        Ok(Self {
            search: search.done()?,
            name_search: name_search.done()?,
            dao,
        })
    }

    pub fn base(&self) -> &GenericDao<Cluster> {
        &self.dao
    }

    pub fn find_by_id(&self, id: i64) -> NimbusResult<Option<Cluster>> {
        self.dao.find_by_id(id)
    }

    pub fn search(
        &self,
        query: &ClusterQuery,
        filter: Option<&Filter<Cluster>>,
    ) -> NimbusResult<Vec<Cluster>> {
        let mut sc = self.search.create();
        if let Some(id) = query.id {
            sc.set_parameters("id", id)?;
        }
        if let Some(name) = &query.name {
            sc.set_parameters("name", name)?;
        }
        if let Some(pod_id) = query.pod_id {
            sc.set_parameters("podId", pod_id)?;
        }
        if let Some(zone_id) = query.zone_id {
            sc.set_parameters("zoneId", zone_id)?;
        }
        if let Some(keyword) = &query.keyword {
            sc.set_parameters("keyword", contains_pattern(keyword))?;
        }
        self.dao.list_by(&sc, filter)
    }

    /// Active cluster named `name` in the given pod.
    pub fn find_by_name_in(
        &self,
        tx: &Transaction<'_>,
        zone_id: i64,
        pod_id: i64,
        name: &str,
    ) -> NimbusResult<Option<Cluster>> {
        let mut sc = self.name_search.create();
        sc.set_parameters("zoneId", zone_id)?
            .set_parameters("podId", pod_id)?
            .set_parameters("name", name)?;
        self.dao.find_one_by_in(tx, &sc, None)
    }

    pub fn persist_in(&self, tx: &Transaction<'_>, cluster: &Cluster) -> NimbusResult<Cluster> {
        self.dao.persist_in(tx, cluster)
    }
}
