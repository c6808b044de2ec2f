//! Command binding, dispatch and response materialization

pub mod binder;
pub mod command;
pub mod commands;
pub mod dispatcher;
pub mod error;
pub mod param;
pub mod response;

pub use binder::{BoundParams, RawParams, bind};
pub use command::{ApiCommand, ListParams};
pub use dispatcher::{BackendOperation, DispatchMetrics, Dispatcher, OperationStats, TypedOperation};
pub use error::ApiError;
pub use param::{CommandType, ParamDefault, ParamValue, ParameterSpec};
pub use response::{ListResponse, Materializer, ResponseObject};
