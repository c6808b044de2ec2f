use crate::db::{IntoParam, ScalarValue, now_millis};
use nimbus_derive::Entity;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use serde::Serialize;
use std::fmt;

/// Agent connection state of a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HostStatus {
    Creating,
    Connecting,
    Up,
    Down,
    Disconnected,
    Alert,
}

impl HostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HostStatus::Creating => "Creating",
            HostStatus::Connecting => "Connecting",
            HostStatus::Up => "Up",
            HostStatus::Down => "Down",
            HostStatus::Disconnected => "Disconnected",
            HostStatus::Alert => "Alert",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        [
            HostStatus::Creating,
            HostStatus::Connecting,
            HostStatus::Up,
            HostStatus::Down,
            HostStatus::Disconnected,
            HostStatus::Alert,
        ]
        .into_iter()
        .find(|status| status.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IntoParam for HostStatus {
    fn into_scalar(self) -> ScalarValue {
        ScalarValue::Utf8(self.as_str().to_string())
    }
}

impl FromSql for HostStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        HostStatus::parse(text).ok_or_else(|| FromSqlError::Other(format!("unknown host status '{text}'").into()))
    }
}

/// Hypervisor host managed by the control plane.
#[derive(Entity, Debug, Clone, PartialEq, Serialize)]
#[entity(table = "hosts")]
pub struct Host {
    #[entity(id)]
    pub id: i64,
    pub name: String,
    pub zone_id: i64,
    pub pod_id: Option<i64>,
    pub cluster_id: Option<i64>,
    pub url: String,
    pub hypervisor_type: Option<String>,
    pub status: HostStatus,
    pub created: i64,
    #[entity(removed)]
    pub removed: Option<i64>,
}

impl Host {
    pub fn new(name: impl Into<String>, zone_id: i64, url: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            zone_id,
            pod_id: None,
            cluster_id: None,
            url: url.into(),
            hypervisor_type: None,
            status: HostStatus::Creating,
            created: now_millis(),
            removed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(HostStatus::parse("up"), Some(HostStatus::Up));
        assert_eq!(HostStatus::parse("Alert"), Some(HostStatus::Alert));
        assert_eq!(HostStatus::parse("Maintenance"), None);
        assert_eq!(HostStatus::Up.into_scalar(), ScalarValue::Utf8("Up".into()));
    }
}
