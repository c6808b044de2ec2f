use crate::db::{Database, Transaction};
use crate::error::NimbusResult;
use crate::model::Host;
use crate::search::{Direction, Filter, Op, SearchTemplate};
use crate::store::GenericDao;
use std::sync::Arc;

pub struct HostDao {
    dao: GenericDao<Host>,
    cluster_search: SearchTemplate<Host>,
    url_search: SearchTemplate<Host>,
}

impl HostDao {
    pub fn new(db: Arc<Database>) -> NimbusResult<Self> {
        let dao = GenericDao::new(db);

        let mut cluster_search = dao.create_search_builder();
        cluster_search.and("clusterId", Host::CLUSTER_ID, Op::Eq)?;

        let mut url_search = dao.create_search_builder();
        url_search.and("url", Host::URL, Op::Eq)?;

        Ok(Self {
            cluster_search: cluster_search.done()?,
            url_search: url_search.done()?,
            dao,
        })
    }

    pub fn base(&self) -> &GenericDao<Host> {
        &self.dao
    }

    pub fn list_by_cluster(&self, cluster_id: i64) -> NimbusResult<Vec<Host>> {
        let mut sc = self.cluster_search.create();
        sc.set_parameters("clusterId", cluster_id)?;
        let filter = Filter::new().order_by(Host::ID, Direction::Asc);
        self.dao.list_by(&sc, Some(&filter))
    }

    /// Active host registered under `url`.
    pub fn find_by_url(&self, url: &str) -> NimbusResult<Option<Host>> {
        let mut sc = self.url_search.create();
        sc.set_parameters("url", url)?;
        self.dao.find_one_by(&sc, None)
    }

    pub fn find_by_url_in(&self, tx: &Transaction<'_>, url: &str) -> NimbusResult<Option<Host>> {
        let mut sc = self.url_search.create();
        sc.set_parameters("url", url)?;
        self.dao.find_one_by_in(tx, &sc, None)
    }

    pub fn persist_in(&self, tx: &Transaction<'_>, host: &Host) -> NimbusResult<Host> {
        self.dao.persist_in(tx, host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HostStatus;

    #[test]
    fn test_list_by_cluster_and_url() {
        let dao = HostDao::new(Arc::new(Database::open_in_memory().unwrap())).unwrap();
        let mut host = Host::new("kvm-1", 1, "http://10.0.0.1");
        host.cluster_id = Some(5);
        host.status = HostStatus::Up;
        let stored = dao.base().persist(&host).unwrap();
        dao.base()
            .persist(&Host::new("kvm-2", 1, "http://10.0.0.2"))
            .unwrap();

        let in_cluster = dao.list_by_cluster(5).unwrap();
        assert_eq!(in_cluster.len(), 1);
        assert_eq!(in_cluster[0].status, HostStatus::Up);

        assert_eq!(dao.find_by_url("http://10.0.0.1").unwrap(), Some(stored.clone()));
        dao.base().remove(stored.id).unwrap();
        assert!(dao.find_by_url("http://10.0.0.1").unwrap().is_none());
    }
}
