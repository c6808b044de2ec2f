//! Command declarations

use crate::api::binder::BoundParams;
use crate::api::param::{CommandType, ParamDefault, ParameterSpec};
use crate::api::response::ResponseObject;
use crate::error::{NimbusError, NimbusResult};
use crate::search::Filter;

/// An API command: its wire names, parameter schema, and the backend
/// operation it is routed to.
pub trait ApiCommand: Sized + Send + Sync + 'static {
    /// API name on the wire, e.g. `addHost`
    const API_NAME: &'static str;
    /// Top-level key of the response document
    const RESPONSE_NAME: &'static str;
    /// Logical name of the backend operation
    const OPERATION: &'static str;
    const PARAMETERS: &'static [ParameterSpec];

    /// Result of the backend operation
    type Output: Send + 'static;
    type Response: ResponseObject;

    fn from_params(params: &BoundParams) -> NimbusResult<Self>;

    fn build_response(&self, output: Self::Output) -> NimbusResult<Self::Response>;
}

pub const KEYWORD: ParameterSpec =
    ParameterSpec::optional("keyword", CommandType::String, "List by keyword");
pub const PAGE: ParameterSpec = ParameterSpec::optional("page", CommandType::Integer, "Page number")
    .with_default(ParamDefault::Integer(1));
pub const PAGE_SIZE: ParameterSpec =
    ParameterSpec::optional("pagesize", CommandType::Integer, "Items per page");

/// Paging parameters shared by every list command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub keyword: Option<String>,
    /// 1-based
    pub page: u64,
    /// `None` means the configured default page size
    pub page_size: Option<u64>,
}

impl ListParams {
    pub fn from_params(params: &BoundParams) -> NimbusResult<Self> {
        let page = params.long(PAGE.name).unwrap_or(1);
        let page = positive(PAGE.name, page)?;
        let page_size = params
            .long(PAGE_SIZE.name)
            .map(|size| positive(PAGE_SIZE.name, size))
            .transpose()?;
        Ok(Self {
            keyword: params.string(KEYWORD.name),
            page,
            page_size,
        })
    }

    /// Apply paging to `filter`, falling back to `default_page_size`.
    pub fn page_filter<E>(&self, filter: Filter<E>, default_page_size: u32) -> Filter<E> {
        let size = self.page_size.unwrap_or(u64::from(default_page_size));
        filter.page(self.page, size)
    }
}

fn positive(name: &str, value: i64) -> NimbusResult<u64> {
    u64::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| NimbusError::InvalidParameterValue {
            name: name.to_string(),
            reason: format!("must be greater than zero, got {value}"),
        })
}
