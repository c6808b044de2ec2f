//! Command dispatch
//!
//! 바인딩 → 백엔드 연산 조회 → 실행 → 응답 생성 순서로 처리합니다.
//! 파라미터 검증이 실패하면 백엔드 연산은 호출되지 않습니다.

use crate::api::binder::{RawParams, bind};
use crate::api::command::ApiCommand;
use crate::api::error::ApiError;
use crate::error::{NimbusError, NimbusResult};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// A backend operation reachable by logical name.
pub trait BackendOperation: Send + Sync {
    fn name(&self) -> &str;

    /// Run with a bound command; the boxed value is the command's `Output`.
    fn invoke(&self, command: &dyn Any) -> NimbusResult<Box<dyn Any + Send>>;
}

/// [`BackendOperation`] serving one command type through a closure.
pub struct TypedOperation<C, F> {
    name: String,
    handler: F,
    _command: PhantomData<fn(&C)>,
}

impl<C, F> TypedOperation<C, F>
where
    C: ApiCommand,
    F: Fn(&C) -> NimbusResult<C::Output> + Send + Sync,
{
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
            _command: PhantomData,
        }
    }
}

impl<C, F> BackendOperation for TypedOperation<C, F>
where
    C: ApiCommand,
    F: Fn(&C) -> NimbusResult<C::Output> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, command: &dyn Any) -> NimbusResult<Box<dyn Any + Send>> {
        let command = command.downcast_ref::<C>().ok_or_else(|| {
            NimbusError::operation_failure(&self.name, format!("expected a {} command", C::API_NAME))
        })?;
        let output = (self.handler)(command)?;
        Ok(Box::new(output))
    }
}

/// Per-operation call statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationStats {
    pub calls: u64,
    pub errors: u64,
    pub total: Duration,
}

impl OperationStats {
    pub fn avg_duration(&self) -> Option<Duration> {
        let calls = u32::try_from(self.calls).ok().filter(|c| *c > 0)?;
        Some(self.total / calls)
    }

    pub fn success_rate(&self) -> Option<f64> {
        if self.calls == 0 {
            return None;
        }
        Some((self.calls - self.errors) as f64 / self.calls as f64)
    }
}

/// Dispatch metrics keyed by operation name.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    stats: DashMap<String, OperationStats>,
}

impl DispatchMetrics {
    pub fn record(&self, operation: &str, duration: Duration, success: bool) {
        let mut entry = self.stats.entry(operation.to_string()).or_default();
        entry.calls += 1;
        entry.total += duration;
        if !success {
            entry.errors += 1;
        }
    }

    pub fn get(&self, operation: &str) -> Option<OperationStats> {
        self.stats.get(operation).map(|entry| *entry)
    }
}

/// Routes bound commands to registered backend operations.
#[derive(Default)]
pub struct Dispatcher {
    operations: RwLock<HashMap<String, Arc<dyn BackendOperation>>>,
    metrics: DispatchMetrics,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, operation: Arc<dyn BackendOperation>) -> NimbusResult<()> {
        let name = operation.name().to_string();
        let mut operations = self.operations.write();
        if operations.contains_key(&name) {
            return Err(NimbusError::DuplicateOperation(name));
        }
        debug!(operation = %name, "backend operation registered");
        operations.insert(name, operation);
        Ok(())
    }

    /// Register `handler` as the operation `C::OPERATION`.
    pub fn register_handler<C, F>(&self, handler: F) -> NimbusResult<()>
    where
        C: ApiCommand,
        F: Fn(&C) -> NimbusResult<C::Output> + Send + Sync + 'static,
    {
        self.register(Arc::new(TypedOperation::<C, F>::new(C::OPERATION, handler)))
    }

    pub fn unregister(&self, name: &str) -> NimbusResult<()> {
        self.operations
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| NimbusError::OperationNotFound(name.to_string()))
    }

    /// Registered operation names, sorted.
    pub fn operations(&self) -> Vec<String> {
        let mut names: Vec<String> = self.operations.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }

    /// Handle one request for command `C`, rendering failures for the caller.
    #[instrument(skip(self, raw), fields(api = C::API_NAME))]
    pub fn dispatch<C: ApiCommand>(&self, raw: &RawParams) -> Result<C::Response, ApiError> {
        self.execute::<C>(raw).map_err(|err| {
            if err.category().is_caller_facing() {
                debug!(error = %err, "request rejected");
            } else {
                warn!(error = %err, "request failed");
            }
            ApiError::from_error(C::API_NAME, &err)
        })
    }

    /// Bind, invoke and materialize, returning the internal error on failure.
    pub fn execute<C: ApiCommand>(&self, raw: &RawParams) -> NimbusResult<C::Response> {
        let params = bind(C::PARAMETERS, raw)?;
        let command = C::from_params(&params)?;

        let operation = self
            .operations
            .read()
            .get(C::OPERATION)
            .cloned()
            .ok_or_else(|| NimbusError::OperationNotFound(C::OPERATION.to_string()))?;

        let start = Instant::now();
        let result = operation.invoke(&command);
        self.metrics
            .record(C::OPERATION, start.elapsed(), result.is_ok());

        let output = result?.downcast::<C::Output>().map_err(|_| {
            NimbusError::operation_failure(C::OPERATION, "backend returned an unexpected result type")
        })?;
        command.build_response(*output)
    }
}
