use crate::api::binder::BoundParams;
use crate::api::command::ApiCommand;
use crate::api::param::{CommandType, ParameterSpec};
use crate::api::response::{HostResponse, ListResponse, Materializer};
use crate::error::NimbusResult;
use crate::model::Host;
use std::fmt;

const RESPONSE: Materializer = Materializer::new(AddHostCmd::RESPONSE_NAME, "host");

/// Adds a new host.
#[derive(Clone, PartialEq)]
pub struct AddHostCmd {
    pub cluster_id: Option<i64>,
    pub cluster_name: Option<String>,
    pub password: String,
    pub pod_id: Option<i64>,
    pub url: String,
    pub username: String,
    pub zone_id: i64,
}

impl ApiCommand for AddHostCmd {
    const API_NAME: &'static str = "addHost";
    const RESPONSE_NAME: &'static str = "addhostresponse";
    const OPERATION: &'static str = "discoverHosts";
    const PARAMETERS: &'static [ParameterSpec] = &[
        ParameterSpec::optional("clusterid", CommandType::Long, "the cluster ID for the host"),
        ParameterSpec::optional("clustername", CommandType::String, "the cluster name for the host"),
        ParameterSpec::required("password", CommandType::String, "the password for the host"),
        ParameterSpec::optional("podid", CommandType::Long, "the Pod ID for the host"),
        ParameterSpec::required("url", CommandType::String, "the host URL"),
        ParameterSpec::required("username", CommandType::String, "the username for the host"),
        ParameterSpec::required("zoneid", CommandType::Long, "the Zone ID for the host"),
    ];

    /// Hosts added; `None` when discovery produced nothing.
    type Output = Option<Vec<Host>>;
    type Response = ListResponse<HostResponse>;

    fn from_params(params: &BoundParams) -> NimbusResult<Self> {
        Ok(Self {
            cluster_id: params.long("clusterid"),
            cluster_name: params.string("clustername"),
            password: params.require_string("password")?,
            pod_id: params.long("podid"),
            url: params.require_string("url")?,
            username: params.require_string("username")?,
            zone_id: params.require_long("zoneid")?,
        })
    }

    fn build_response(&self, output: Self::Output) -> NimbusResult<Self::Response> {
        RESPONSE.required_list(Self::OPERATION, "Failed to add host", output, HostResponse::from)
    }
}

impl fmt::Debug for AddHostCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddHostCmd")
            .field("cluster_id", &self.cluster_id)
            .field("cluster_name", &self.cluster_name)
            .field("password", &"<redacted>")
            .field("pod_id", &self.pod_id)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("zone_id", &self.zone_id)
            .finish()
    }
}
