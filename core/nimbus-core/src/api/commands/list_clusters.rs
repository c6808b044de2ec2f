use crate::api::binder::BoundParams;
use crate::api::command::{ApiCommand, KEYWORD, ListParams, PAGE, PAGE_SIZE};
use crate::api::param::{CommandType, ParameterSpec};
use crate::api::response::{ClusterResponse, ListResponse, Materializer};
use crate::dao::ClusterQuery;
use crate::error::NimbusResult;
use crate::model::Cluster;

const RESPONSE: Materializer = Materializer::new(ListClustersCmd::RESPONSE_NAME, "cluster");

/// Lists clusters.
#[derive(Debug, Clone, PartialEq)]
pub struct ListClustersCmd {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub pod_id: Option<i64>,
    pub zone_id: Option<i64>,
    pub list: ListParams,
}

impl ListClustersCmd {
    pub fn query(&self) -> ClusterQuery {
        ClusterQuery {
            id: self.id,
            name: self.name.clone(),
            pod_id: self.pod_id,
            zone_id: self.zone_id,
            keyword: self.list.keyword.clone(),
        }
    }
}

impl ApiCommand for ListClustersCmd {
    const API_NAME: &'static str = "listClusters";
    const RESPONSE_NAME: &'static str = "listclustersresponse";
    const OPERATION: &'static str = "searchForClusters";
    const PARAMETERS: &'static [ParameterSpec] = &[
        ParameterSpec::optional("id", CommandType::Long, "lists clusters by the cluster ID"),
        ParameterSpec::optional("name", CommandType::String, "lists clusters by the cluster name"),
        ParameterSpec::optional("podid", CommandType::Long, "lists clusters by Pod ID"),
        ParameterSpec::optional("zoneid", CommandType::Long, "lists clusters by Zone ID"),
        KEYWORD,
        PAGE,
        PAGE_SIZE,
    ];

    type Output = Vec<Cluster>;
    type Response = ListResponse<ClusterResponse>;

    fn from_params(params: &BoundParams) -> NimbusResult<Self> {
        Ok(Self {
            id: params.long("id"),
            name: params.string("name"),
            pod_id: params.long("podid"),
            zone_id: params.long("zoneid"),
            list: ListParams::from_params(params)?,
        })
    }

    fn build_response(&self, output: Self::Output) -> NimbusResult<Self::Response> {
        Ok(RESPONSE.list(output, ClusterResponse::from))
    }
}
