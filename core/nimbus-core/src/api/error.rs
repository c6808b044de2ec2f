//! Caller-facing error rendering

use crate::error::{ErrorCategory, NimbusError};
use serde::Serialize;
use thiserror::Error;

/// Parameter missing, or the named entity does not exist
pub const PARAM_ERROR: u16 = 431;
/// Parameter present but malformed
pub const MALFORMED_PARAMETER_ERROR: u16 = 430;
/// Everything the caller cannot fix
pub const INTERNAL_ERROR: u16 = 530;

/// Error returned by [`Dispatcher::dispatch`](crate::api::Dispatcher::dispatch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{code} {category:?}: {message}")]
pub struct ApiError {
    pub category: ErrorCategory,
    #[serde(rename = "errorcode")]
    pub code: u16,
    #[serde(rename = "errortext")]
    pub message: String,
}

impl ApiError {
    /// Render `err` for the caller of `api`. Statement text and other
    /// internals never reach the message.
    pub fn from_error(api: &str, err: &NimbusError) -> Self {
        let category = err.category();
        let code = match err {
            NimbusError::InvalidParameterValue { .. } => MALFORMED_PARAMETER_ERROR,
            _ if category.is_caller_facing() => PARAM_ERROR,
            _ => INTERNAL_ERROR,
        };
        let message = match err {
            NimbusError::OperationFailure { message, .. } => message.clone(),
            _ if category.is_caller_facing() => err.to_string(),
            _ => format!("internal error executing command {api}"),
        };
        Self {
            category,
            code,
            message,
        }
    }
}
