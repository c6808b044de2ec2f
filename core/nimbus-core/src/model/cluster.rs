use crate::db::now_millis;
use nimbus_derive::Entity;
use serde::Serialize;

/// Group of hosts inside one pod of a zone.
#[derive(Entity, Debug, Clone, PartialEq, Serialize)]
#[entity(table = "clusters")]
pub struct Cluster {
    #[entity(id)]
    pub id: i64,
    pub name: String,
    pub zone_id: i64,
    pub pod_id: i64,
    pub hypervisor_type: Option<String>,
    pub created: i64,
    #[entity(removed)]
    pub removed: Option<i64>,
}

impl Cluster {
    /// Unsaved cluster; the key is assigned on persist.
    pub fn new(name: impl Into<String>, zone_id: i64, pod_id: i64) -> Self {
        Self {
            id: 0,
            name: name.into(),
            zone_id,
            pod_id,
            hypervisor_type: None,
            created: now_millis(),
            removed: None,
        }
    }

    pub fn with_hypervisor(mut self, hypervisor_type: impl Into<String>) -> Self {
        self.hypervisor_type = Some(hypervisor_type.into());
        self
    }
}
