//! Host discovery seam
//!
//! 실제 하이퍼바이저/에이전트 통신은 외부 구현이 담당합니다.

use crate::error::NimbusResult;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;

/// Everything a discoverer needs to reach the hosts behind a URL.
#[derive(Clone, PartialEq)]
pub struct DiscoveryRequest {
    pub zone_id: i64,
    pub pod_id: Option<i64>,
    pub cluster_id: Option<i64>,
    pub cluster_name: Option<String>,
    pub url: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for DiscoveryRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveryRequest")
            .field("zone_id", &self.zone_id)
            .field("pod_id", &self.pod_id)
            .field("cluster_id", &self.cluster_id)
            .field("cluster_name", &self.cluster_name)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A host reported by a discoverer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredHost {
    pub name: String,
    pub hypervisor_type: String,
}

impl DiscoveredHost {
    pub fn new(name: impl Into<String>, hypervisor_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hypervisor_type: hypervisor_type.into(),
        }
    }
}

/// Contacts a URL and reports the hosts found there.
///
/// An empty result means nothing answered; errors are reserved for
/// failures the caller should see.
pub trait HostDiscoverer: Send + Sync {
    fn discover(&self, request: &DiscoveryRequest) -> NimbusResult<Vec<DiscoveredHost>>;
}

/// Discoverer answering from a fixed URL → hosts table.
#[derive(Debug, Default)]
pub struct StaticDiscoverer {
    hosts: Mutex<HashMap<String, Vec<DiscoveredHost>>>,
}

impl StaticDiscoverer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, hosts: Vec<DiscoveredHost>) {
        self.hosts.lock().insert(url.into(), hosts);
    }
}

impl HostDiscoverer for StaticDiscoverer {
    fn discover(&self, request: &DiscoveryRequest) -> NimbusResult<Vec<DiscoveredHost>> {
        Ok(self
            .hosts
            .lock()
            .get(&request.url)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> DiscoveryRequest {
        DiscoveryRequest {
            zone_id: 1,
            pod_id: Some(2),
            cluster_id: None,
            cluster_name: Some("c1".into()),
            url: url.into(),
            username: "root".into(),
            password: "hunter2".into(),
        }
    }

    #[test]
    fn test_static_discoverer() {
        let discoverer = StaticDiscoverer::new();
        discoverer.insert("http://10.0.0.1", vec![DiscoveredHost::new("kvm-1", "KVM")]);

        let found = discoverer.discover(&request("http://10.0.0.1")).unwrap();
        assert_eq!(found, vec![DiscoveredHost::new("kvm-1", "KVM")]);
        assert!(discoverer.discover(&request("http://10.0.0.9")).unwrap().is_empty());
    }

    #[test]
    fn test_request_debug_redacts_password() {
        assert!(!format!("{:?}", request("u")).contains("hunter2"));
    }
}
