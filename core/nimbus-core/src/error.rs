//! Error types for the Nimbus control-plane core.
//!
//! All public APIs return `NimbusResult<T>`; no panics in library code.

use thiserror::Error;

/// Unified error type for all Nimbus operations.
#[derive(Debug, Error)]
pub enum NimbusError {
    /// Required wire parameter is absent
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    /// Wire parameter present but not convertible to its declared type
    #[error("invalid value for parameter '{name}': {reason}")]
    InvalidParameterValue { name: String, reason: String },

    /// Lookup found nothing where existence was required
    #[error("{entity} not found: {detail}")]
    NotFound { entity: String, detail: String },

    /// Predicate name declared twice in one template
    #[error("duplicate predicate name '{0}' in search template")]
    DuplicateName(String),

    /// Builder was already closed by `done()`
    #[error("search template on '{0}' is closed")]
    TemplateClosed(String),

    /// Parameter name never declared in the originating template
    #[error("unknown search parameter '{0}'")]
    UnknownParameter(String),

    /// Column does not exist on the entity
    #[error("unknown field '{field}' on '{table}'")]
    UnknownField { table: String, field: String },

    /// Criteria handed to a DAO of another table
    #[error("search criteria built for '{actual}' used against '{expected}'")]
    TemplateMismatch { expected: String, actual: String },

    /// Value shape does not fit the predicate operator
    #[error("invalid binding for '{name}': {reason}")]
    InvalidBinding { name: String, reason: String },

    /// `end_group()` without a matching open group, or an unclosed group at `done()`
    #[error("unbalanced predicate group in template on '{0}'")]
    UnbalancedGroup(String),

    /// Operation not valid for this entity or state
    #[error("invalid operation: {message}\nContext: {context}")]
    InvalidOperation { message: String, context: String },

    /// Snapshot chain would stop being a linear sequence
    #[error("snapshot lineage violation: {0}")]
    LineageViolation(String),

    /// Statement execution error
    #[error("persistence error: {source}")]
    Persistence {
        #[from]
        source: rusqlite::Error,
    },

    /// Backend operation produced a result inconsistent with its contract
    #[error("operation '{operation}' failed: {message}")]
    OperationFailure { operation: String, message: String },

    /// No backend operation registered under this name
    #[error("backend operation '{0}' not found")]
    OperationNotFound(String),

    /// Duplicate backend operation registration
    #[error("backend operation '{0}' already registered")]
    DuplicateOperation(String),

    /// Configuration loading error
    #[error("config error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Standard I/O error
    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Result type alias for all Nimbus operations.
pub type NimbusResult<T> = Result<T, NimbusError>;

impl From<serde_json::Error> for NimbusError {
    fn from(err: serde_json::Error) -> Self {
        NimbusError::Serialization(err.to_string())
    }
}

/// Stable error category surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Template,
    Persistence,
    OperationFailure,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Template => "template",
            ErrorCategory::Persistence => "persistence",
            ErrorCategory::OperationFailure => "operation_failure",
        }
    }

    /// Whether the message may be shown to the caller verbatim.
    pub fn is_caller_facing(&self) -> bool {
        matches!(self, ErrorCategory::Validation | ErrorCategory::NotFound)
    }
}

impl NimbusError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            NimbusError::MissingParameter(_) | NimbusError::InvalidParameterValue { .. } => {
                ErrorCategory::Validation
            }
            NimbusError::NotFound { .. } => ErrorCategory::NotFound,
            NimbusError::DuplicateName(_)
            | NimbusError::TemplateClosed(_)
            | NimbusError::UnknownParameter(_)
            | NimbusError::UnknownField { .. }
            | NimbusError::TemplateMismatch { .. }
            | NimbusError::InvalidBinding { .. }
            | NimbusError::UnbalancedGroup(_)
            | NimbusError::InvalidOperation { .. } => ErrorCategory::Template,
            NimbusError::Persistence { .. } | NimbusError::Io { .. } => {
                ErrorCategory::Persistence
            }
            NimbusError::OperationFailure { .. }
            | NimbusError::LineageViolation(_)
            | NimbusError::OperationNotFound(_)
            | NimbusError::DuplicateOperation(_)
            | NimbusError::Config(_)
            | NimbusError::Serialization(_) => ErrorCategory::OperationFailure,
        }
    }

    pub(crate) fn not_found(entity: &str, detail: impl Into<String>) -> Self {
        NimbusError::NotFound {
            entity: entity.to_string(),
            detail: detail.into(),
        }
    }

    pub(crate) fn operation_failure(operation: &str, message: impl Into<String>) -> Self {
        NimbusError::OperationFailure {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}
