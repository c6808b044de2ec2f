//! Wire response objects
//!
//! 응답 이름(`listclustersresponse`)과 항목 객체 이름(`cluster`)은
//! 소비자가 키로 사용하는 계약입니다.

use crate::error::{NimbusError, NimbusResult};
use crate::model::{Cluster, Host, Snapshot, SnapshotType};
use serde::Serialize;
use serde_json::{Map, Value};

/// A response carrying its wire naming contract.
pub trait ResponseObject {
    fn response_name(&self) -> &str;
    fn set_response_name(&mut self, name: &str);
    fn object_name(&self) -> &str;
    fn set_object_name(&mut self, name: &str);

    /// `{"<responsename>": ...}` document for serialization.
    fn to_wire(&self) -> NimbusResult<Value>;
}

fn wrap(key: &str, inner: Value) -> Value {
    let mut root = Map::new();
    root.insert(key.to_string(), inner);
    Value::Object(root)
}

macro_rules! response_object {
    ($($ty:ty),* $(,)?) => {$(
        impl ResponseObject for $ty {
            fn response_name(&self) -> &str {
                &self.response_name
            }

            fn set_response_name(&mut self, name: &str) {
                self.response_name = name.to_string();
            }

            fn object_name(&self) -> &str {
                &self.object_name
            }

            fn set_object_name(&mut self, name: &str) {
                self.object_name = name.to_string();
            }

            fn to_wire(&self) -> NimbusResult<Value> {
                let body = serde_json::to_value(self)?;
                Ok(wrap(&self.response_name, wrap(&self.object_name, body)))
            }
        }
    )*};
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostResponse {
    #[serde(skip)]
    response_name: String,
    #[serde(skip)]
    object_name: String,
    pub id: i64,
    pub name: String,
    #[serde(rename = "zoneid")]
    pub zone_id: i64,
    #[serde(rename = "podid", skip_serializing_if = "Option::is_none")]
    pub pod_id: Option<i64>,
    #[serde(rename = "clusterid", skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<i64>,
    #[serde(rename = "hypervisor", skip_serializing_if = "Option::is_none")]
    pub hypervisor_type: Option<String>,
    #[serde(rename = "state")]
    pub status: String,
    pub created: i64,
}

impl From<Host> for HostResponse {
    fn from(host: Host) -> Self {
        Self {
            response_name: String::new(),
            object_name: String::new(),
            id: host.id,
            name: host.name,
            zone_id: host.zone_id,
            pod_id: host.pod_id,
            cluster_id: host.cluster_id,
            hypervisor_type: host.hypervisor_type,
            status: host.status.to_string(),
            created: host.created,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterResponse {
    #[serde(skip)]
    response_name: String,
    #[serde(skip)]
    object_name: String,
    pub id: i64,
    pub name: String,
    #[serde(rename = "zoneid")]
    pub zone_id: i64,
    #[serde(rename = "podid")]
    pub pod_id: i64,
    #[serde(rename = "hypervisortype", skip_serializing_if = "Option::is_none")]
    pub hypervisor_type: Option<String>,
}

impl From<Cluster> for ClusterResponse {
    fn from(cluster: Cluster) -> Self {
        Self {
            response_name: String::new(),
            object_name: String::new(),
            id: cluster.id,
            name: cluster.name,
            zone_id: cluster.zone_id,
            pod_id: cluster.pod_id,
            hypervisor_type: cluster.hypervisor_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotResponse {
    #[serde(skip)]
    response_name: String,
    #[serde(skip)]
    object_name: String,
    pub id: i64,
    #[serde(rename = "volumeid")]
    pub volume_id: i64,
    pub name: String,
    #[serde(rename = "snapshottype")]
    pub snapshot_type: String,
    #[serde(rename = "intervaltype")]
    pub interval_type: String,
    pub version: String,
    pub created: i64,
}

impl From<Snapshot> for SnapshotResponse {
    fn from(snapshot: Snapshot) -> Self {
        // manual snapshots have no schedule interval
        let interval = match snapshot.snapshot_type {
            SnapshotType::Manual => "NONE".to_string(),
            other => other.to_string(),
        };
        Self {
            response_name: String::new(),
            object_name: String::new(),
            id: snapshot.id,
            volume_id: snapshot.volume_id,
            name: snapshot.name,
            snapshot_type: snapshot.snapshot_type.to_string(),
            interval_type: interval,
            version: snapshot.version,
            created: snapshot.created,
        }
    }
}

response_object!(HostResponse, ClusterResponse, SnapshotResponse);

/// Named list of response objects.
#[derive(Debug, Clone, PartialEq)]
pub struct ListResponse<R> {
    response_name: String,
    object_name: String,
    items: Vec<R>,
}

impl<R: ResponseObject + Serialize> ListResponse<R> {
    pub fn new(response_name: &str, object_name: &str, items: Vec<R>) -> Self {
        let mut list = Self {
            response_name: response_name.to_string(),
            object_name: String::new(),
            items,
        };
        list.set_object_name(object_name);
        list
    }

    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn into_items(self) -> Vec<R> {
        self.items
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<R: ResponseObject + Serialize> ResponseObject for ListResponse<R> {
    fn response_name(&self) -> &str {
        &self.response_name
    }

    fn set_response_name(&mut self, name: &str) {
        self.response_name = name.to_string();
    }

    fn object_name(&self) -> &str {
        &self.object_name
    }

    fn set_object_name(&mut self, name: &str) {
        self.object_name = name.to_string();
        for item in &mut self.items {
            item.set_object_name(name);
        }
    }

    /// `{"<responsename>": {"count": n, "<objectname>": [...]}}`
    fn to_wire(&self) -> NimbusResult<Value> {
        let mut body = Map::new();
        body.insert("count".to_string(), Value::from(self.items.len()));
        body.insert(self.object_name.clone(), serde_json::to_value(&self.items)?);
        Ok(wrap(&self.response_name, Value::Object(body)))
    }
}

/// Turns backend results into named responses.
#[derive(Debug, Clone, Copy)]
pub struct Materializer {
    response_name: &'static str,
    object_name: &'static str,
}

impl Materializer {
    pub const fn new(response_name: &'static str, object_name: &'static str) -> Self {
        Self {
            response_name,
            object_name,
        }
    }

    /// A list result; empty is a valid answer.
    pub fn list<T, R, F>(&self, items: Vec<T>, map: F) -> ListResponse<R>
    where
        R: ResponseObject + Serialize,
        F: FnMut(T) -> R,
    {
        ListResponse::new(
            self.response_name,
            self.object_name,
            items.into_iter().map(map).collect(),
        )
    }

    /// A list the operation promised to produce; `None` is a failure.
    pub fn required_list<T, R, F>(
        &self,
        operation: &str,
        failure: &str,
        result: Option<Vec<T>>,
        map: F,
    ) -> NimbusResult<ListResponse<R>>
    where
        R: ResponseObject + Serialize,
        F: FnMut(T) -> R,
    {
        let items = result.ok_or_else(|| NimbusError::operation_failure(operation, failure))?;
        Ok(self.list(items, map))
    }

    /// A single result the operation promised to produce.
    pub fn one<T, R, F>(
        &self,
        operation: &str,
        failure: &str,
        result: Option<T>,
        map: F,
    ) -> NimbusResult<R>
    where
        R: ResponseObject,
        F: FnOnce(T) -> R,
    {
        let value = result.ok_or_else(|| NimbusError::operation_failure(operation, failure))?;
        let mut response = map(value);
        response.set_response_name(self.response_name);
        response.set_object_name(self.object_name);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CLUSTERS: Materializer = Materializer::new("listclustersresponse", "cluster");

    fn cluster(id: i64, name: &str) -> Cluster {
        let mut cluster = Cluster::new(name, 1, 2);
        cluster.id = id;
        cluster
    }

    #[test]
    fn test_list_wire_shape() {
        let response = CLUSTERS.list(vec![cluster(5, "c5")], ClusterResponse::from);
        assert_eq!(response.items()[0].object_name(), "cluster");
        assert_eq!(
            response.to_wire().unwrap(),
            json!({
                "listclustersresponse": {
                    "count": 1,
                    "cluster": [{"id": 5, "name": "c5", "zoneid": 1, "podid": 2}]
                }
            })
        );
    }

    #[test]
    fn test_empty_list_is_success() {
        let response: ListResponse<ClusterResponse> = CLUSTERS
            .required_list("searchForClusters", "Failed", Some(Vec::<Cluster>::new()), ClusterResponse::from)
            .unwrap();
        assert!(response.is_empty());
        assert_eq!(response.response_name(), "listclustersresponse");
        assert_eq!(
            response.to_wire().unwrap(),
            json!({"listclustersresponse": {"count": 0, "cluster": []}})
        );
    }

    #[test]
    fn test_missing_result_is_failure() {
        let err = CLUSTERS
            .required_list::<Cluster, ClusterResponse, _>(
                "searchForClusters",
                "Failed to list clusters",
                None,
                ClusterResponse::from,
            )
            .unwrap_err();
        assert!(matches!(err, NimbusError::OperationFailure { .. }));

        let err = CLUSTERS
            .one::<Cluster, ClusterResponse, _>("x", "gone", None, ClusterResponse::from)
            .unwrap_err();
        assert!(matches!(err, NimbusError::OperationFailure { .. }));
    }

    #[test]
    fn test_single_wire_shape() {
        let response = Materializer::new("createclusterresponse", "cluster")
            .one("x", "gone", Some(cluster(1, "a")), ClusterResponse::from)
            .unwrap();
        let wire = response.to_wire().unwrap();
        assert_eq!(wire["createclusterresponse"]["cluster"]["name"], "a");
    }
}
