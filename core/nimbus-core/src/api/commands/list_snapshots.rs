use crate::api::binder::BoundParams;
use crate::api::command::{ApiCommand, KEYWORD, ListParams, PAGE, PAGE_SIZE};
use crate::api::param::{CommandType, ParameterSpec};
use crate::api::response::{ListResponse, Materializer, SnapshotResponse};
use crate::error::{NimbusError, NimbusResult};
use crate::model::{Snapshot, SnapshotType};

const RESPONSE: Materializer = Materializer::new(ListSnapshotsCmd::RESPONSE_NAME, "snapshot");

/// Lists the active snapshots of a volume.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshotsCmd {
    pub volume_id: i64,
    pub snapshot_type: Option<SnapshotType>,
    pub list: ListParams,
}

impl ApiCommand for ListSnapshotsCmd {
    const API_NAME: &'static str = "listSnapshots";
    const RESPONSE_NAME: &'static str = "listsnapshotsresponse";
    const OPERATION: &'static str = "listSnapshots";
    const PARAMETERS: &'static [ParameterSpec] = &[
        ParameterSpec::required("volumeid", CommandType::Long, "the ID of the disk volume"),
        ParameterSpec::optional(
            "snapshottype",
            CommandType::String,
            "valid values are MANUAL, RECURRING, TEMPLATE, HOURLY, DAILY, WEEKLY and MONTHLY",
        ),
        KEYWORD,
        PAGE,
        PAGE_SIZE,
    ];

    type Output = Vec<Snapshot>;
    type Response = ListResponse<SnapshotResponse>;

    fn from_params(params: &BoundParams) -> NimbusResult<Self> {
        let snapshot_type = params
            .string("snapshottype")
            .map(|raw| {
                SnapshotType::parse(&raw).ok_or_else(|| NimbusError::InvalidParameterValue {
                    name: "snapshottype".to_string(),
                    reason: format!("unknown snapshot type '{raw}'"),
                })
            })
            .transpose()?;
        Ok(Self {
            volume_id: params.require_long("volumeid")?,
            snapshot_type,
            list: ListParams::from_params(params)?,
        })
    }

    fn build_response(&self, output: Self::Output) -> NimbusResult<Self::Response> {
        Ok(RESPONSE.list(output, SnapshotResponse::from))
    }
}
