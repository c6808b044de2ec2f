//! Host and cluster resource management

use crate::api::commands::{AddHostCmd, ListClustersCmd};
use crate::dao::{ClusterDao, HostDao};
use crate::db::Database;
use crate::error::{NimbusError, NimbusResult};
use crate::manager::discovery::{DiscoveredHost, DiscoveryRequest, HostDiscoverer};
use crate::model::{Cluster, Host, HostStatus};
use crate::search::{Direction, Filter};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Backend of `discoverHosts` and `searchForClusters`.
pub struct ResourceManager {
    db: Arc<Database>,
    hosts: HostDao,
    clusters: ClusterDao,
    discoverer: Arc<dyn HostDiscoverer>,
}

impl ResourceManager {
    pub fn new(db: Arc<Database>, discoverer: Arc<dyn HostDiscoverer>) -> NimbusResult<Self> {
        Ok(Self {
            hosts: HostDao::new(Arc::clone(&db))?,
            clusters: ClusterDao::new(Arc::clone(&db))?,
            db,
            discoverer,
        })
    }

    pub fn hosts(&self) -> &HostDao {
        &self.hosts
    }

    pub fn clusters(&self) -> &ClusterDao {
        &self.clusters
    }

    /// Discover the hosts behind `cmd.url` and register them.
    ///
    /// Returns `Ok(None)` when discovery found nothing. Clusters named by
    /// `clustername` are created on first use; hosts are persisted together
    /// with that cluster in one transaction.
    #[instrument(skip(self, cmd), fields(zone_id = cmd.zone_id, url = %cmd.url))]
    pub fn discover_hosts(&self, cmd: &AddHostCmd) -> NimbusResult<Option<Vec<Host>>> {
        let mut pod_id = cmd.pod_id;

        if let Some(cluster_id) = cmd.cluster_id {
            let cluster = self
                .clusters
                .find_by_id(cluster_id)?
                .ok_or_else(|| NimbusError::not_found("cluster", format!("id {cluster_id}")))?;
            if cluster.zone_id != cmd.zone_id {
                return Err(NimbusError::InvalidParameterValue {
                    name: "clusterid".to_string(),
                    reason: format!("cluster {cluster_id} is not in zone {}", cmd.zone_id),
                });
            }
            if pod_id.is_some_and(|pod| pod != cluster.pod_id) {
                return Err(NimbusError::InvalidParameterValue {
                    name: "podid".to_string(),
                    reason: format!("cluster {cluster_id} is not in pod {}", cluster.pod_id),
                });
            }
            pod_id = Some(cluster.pod_id);
        } else if cmd.cluster_name.is_some() && pod_id.is_none() {
            return Err(NimbusError::MissingParameter("podid".to_string()));
        }

        ensure_url_unused(self.hosts.find_by_url(&cmd.url)?, &cmd.url)?;

        let request = DiscoveryRequest {
            zone_id: cmd.zone_id,
            pod_id,
            cluster_id: cmd.cluster_id,
            cluster_name: cmd.cluster_name.clone(),
            url: cmd.url.clone(),
            username: cmd.username.clone(),
            password: cmd.password.clone(),
        };
        let discovered = self.discoverer.discover(&request)?;
        if discovered.is_empty() {
            warn!("no hosts discovered");
            return Ok(None);
        }

        let hosts = self.db.transaction(|tx| {
            // discovery ran without the lock; another request may have won
            ensure_url_unused(self.hosts.find_by_url_in(tx, &cmd.url)?, &cmd.url)?;

            let cluster_id = match (cmd.cluster_id, &cmd.cluster_name, pod_id) {
                (Some(id), _, _) => Some(id),
                (None, Some(name), Some(pod)) => {
                    let existing = self.clusters.find_by_name_in(tx, cmd.zone_id, pod, name)?;
                    let cluster = match existing {
                        Some(cluster) => cluster,
                        None => {
                            let fresh = Cluster::new(name.as_str(), cmd.zone_id, pod)
                                .with_hypervisor(discovered[0].hypervisor_type.as_str());
                            let cluster = self.clusters.persist_in(tx, &fresh)?;
                            info!(cluster_id = cluster.id, name = %cluster.name, "cluster created");
                            cluster
                        }
                    };
                    Some(cluster.id)
                }
                _ => None,
            };

            discovered
                .iter()
                .map(|found| self.hosts.persist_in(tx, &new_host(cmd, pod_id, cluster_id, found)))
                .collect::<NimbusResult<Vec<_>>>()
        })?;

        info!(count = hosts.len(), "hosts added");
        Ok(Some(hosts))
    }

    /// Clusters matching the command's terms, ordered by id.
    pub fn search_for_clusters(&self, cmd: &ListClustersCmd) -> NimbusResult<Vec<Cluster>> {
        let filter = cmd.list.page_filter(
            Filter::new().order_by(Cluster::ID, Direction::Asc),
            self.db.config().default_page_size,
        );
        self.clusters.search(&cmd.query(), Some(&filter))
    }
}

fn ensure_url_unused(existing: Option<Host>, url: &str) -> NimbusResult<()> {
    match existing {
        Some(host) => Err(NimbusError::InvalidParameterValue {
            name: "url".to_string(),
            reason: format!("{url} is already registered as host {}", host.id),
        }),
        None => Ok(()),
    }
}

fn new_host(
    cmd: &AddHostCmd,
    pod_id: Option<i64>,
    cluster_id: Option<i64>,
    found: &DiscoveredHost,
) -> Host {
    let mut host = Host::new(found.name.as_str(), cmd.zone_id, cmd.url.as_str());
    host.pod_id = pod_id;
    host.cluster_id = cluster_id;
    host.hypervisor_type = Some(found.hypervisor_type.clone());
    host.status = HostStatus::Up;
    host
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::command::ListParams;
    use crate::manager::discovery::StaticDiscoverer;

    fn setup() -> (ResourceManager, Arc<StaticDiscoverer>) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let discoverer = Arc::new(StaticDiscoverer::new());
        discoverer.insert(
            "http://10.0.0.1",
            vec![
                DiscoveredHost::new("kvm-1", "KVM"),
                DiscoveredHost::new("kvm-2", "KVM"),
            ],
        );
        let manager = ResourceManager::new(db, discoverer.clone()).unwrap();
        (manager, discoverer)
    }

    fn add_host(url: &str) -> AddHostCmd {
        AddHostCmd {
            cluster_id: None,
            cluster_name: Some("c1".into()),
            password: "p".into(),
            pod_id: Some(4),
            url: url.into(),
            username: "root".into(),
            zone_id: 1,
        }
    }

    #[test]
    fn test_discover_creates_cluster_and_hosts() {
        let (manager, _) = setup();
        let hosts = manager.discover_hosts(&add_host("http://10.0.0.1")).unwrap().unwrap();
        assert_eq!(hosts.len(), 2);
        assert!(hosts.iter().all(|h| h.status == HostStatus::Up && h.pod_id == Some(4)));

        let cluster_id = hosts[0].cluster_id.unwrap();
        let cluster = manager.clusters().find_by_id(cluster_id).unwrap().unwrap();
        assert_eq!(cluster.name, "c1");
        assert_eq!(cluster.hypervisor_type.as_deref(), Some("KVM"));
        assert_eq!(manager.hosts().list_by_cluster(cluster_id).unwrap().len(), 2);
    }

    #[test]
    fn test_discover_nothing_is_none() {
        let (manager, _) = setup();
        assert_eq!(manager.discover_hosts(&add_host("http://10.9.9.9")).unwrap(), None);
        assert!(manager.clusters().base().list_all(None).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_url_rejected() {
        let (manager, _) = setup();
        manager.discover_hosts(&add_host("http://10.0.0.1")).unwrap();
        let err = manager.discover_hosts(&add_host("http://10.0.0.1")).unwrap_err();
        assert!(matches!(err, NimbusError::InvalidParameterValue { ref name, .. } if name == "url"));
    }

    #[test]
    fn test_cluster_checks() {
        let (manager, _) = setup();

        let mut cmd = add_host("http://10.0.0.1");
        cmd.pod_id = None;
        assert!(matches!(
            manager.discover_hosts(&cmd),
            Err(NimbusError::MissingParameter(ref name)) if name == "podid"
        ));

        let mut cmd = add_host("http://10.0.0.1");
        cmd.cluster_id = Some(99);
        assert!(matches!(
            manager.discover_hosts(&cmd),
            Err(NimbusError::NotFound { .. })
        ));

        let other_zone = manager
            .clusters()
            .base()
            .persist(&Cluster::new("far", 2, 4))
            .unwrap();
        let mut cmd = add_host("http://10.0.0.1");
        cmd.cluster_id = Some(other_zone.id);
        assert!(matches!(
            manager.discover_hosts(&cmd),
            Err(NimbusError::InvalidParameterValue { ref name, .. }) if name == "clusterid"
        ));
    }

    #[test]
    fn test_existing_cluster_reused() {
        let (manager, discoverer) = setup();
        discoverer.insert("http://10.0.0.2", vec![DiscoveredHost::new("kvm-3", "KVM")]);

        let first = manager.discover_hosts(&add_host("http://10.0.0.1")).unwrap().unwrap();
        let second = manager.discover_hosts(&add_host("http://10.0.0.2")).unwrap().unwrap();
        assert_eq!(first[0].cluster_id, second[0].cluster_id);
        assert_eq!(manager.clusters().base().list_all(None).unwrap().len(), 1);
    }

    #[test]
    fn test_search_for_clusters_paged() {
        let (manager, _) = setup();
        for name in ["a", "b", "c"] {
            manager.clusters().base().persist(&Cluster::new(name, 1, 1)).unwrap();
        }
        let cmd = ListClustersCmd {
            id: None,
            name: None,
            pod_id: None,
            zone_id: Some(1),
            list: ListParams {
                keyword: None,
                page: 2,
                page_size: Some(2),
            },
        };
        let page = manager.search_for_clusters(&cmd).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "c");
    }
}
