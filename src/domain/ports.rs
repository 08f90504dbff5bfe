use crate::domain::failure::{NormalizedError, RawFailure};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

/// Per-call context threaded through every submit/confirm invocation and
/// merged into every classified error derived from one.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub correlation_id: String,
    pub operation: String,
    pub attempt: u32,
    /// Identity of the remote program the operation targets, when known.
    /// Used to resolve program-specific contract error codes.
    pub program: Option<String>,
    pub extra: BTreeMap<String, String>,
}

impl CallContext {
    pub fn new(correlation_id: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            operation: operation.into(),
            ..Default::default()
        }
    }

    /// Folds this context into a classified error's key-value bag.
    pub fn apply(&self, mut error: NormalizedError) -> NormalizedError {
        if !self.correlation_id.is_empty() {
            error = error.with_context("correlation_id", self.correlation_id.clone());
        }
        if !self.operation.is_empty() {
            error = error.with_context("operation", self.operation.clone());
        }
        if self.attempt > 0 {
            error = error.with_context("attempt", self.attempt.to_string());
        }
        if let Some(program) = &self.program {
            error = error.with_context("program", program.clone());
        }
        for (key, value) in &self.extra {
            error = error.with_context(key.clone(), value.clone());
        }
        error
    }
}

/// Result of a successful submission: the opaque handle used to poll for
/// settlement, plus whatever payload the backend attached.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReceipt {
    pub handle: String,
    pub data: Option<Value>,
}

impl SubmitReceipt {
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            data: None,
        }
    }
}

/// Settlement status reported by a confirmation poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmStatus {
    Pending,
    Confirmed,
    Failed,
}

/// One confirmation poll response.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmOutcome {
    pub status: ConfirmStatus,
    pub confirmations: Option<u64>,
    /// Failure attached by the backend when `status` is `Failed`.
    pub error: Option<RawFailure>,
}

impl ConfirmOutcome {
    pub fn pending() -> Self {
        Self {
            status: ConfirmStatus::Pending,
            confirmations: None,
            error: None,
        }
    }

    pub fn confirmed(confirmations: u64) -> Self {
        Self {
            status: ConfirmStatus::Confirmed,
            confirmations: Some(confirmations),
            error: None,
        }
    }

    pub fn failed(error: Option<RawFailure>) -> Self {
        Self {
            status: ConfirmStatus::Failed,
            confirmations: None,
            error,
        }
    }
}

/// Turns validated input into a pending operation handle.
///
/// Implementations must be safe to retry under the active retry policy: a
/// failed call must not leave partial effects a second call would duplicate.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, input: &Value, ctx: &CallContext) -> Result<SubmitReceipt, RawFailure>;
}

/// Polls for settlement of a previously submitted operation.
///
/// Implementations must be read-only: the orchestrator calls this repeatedly
/// at a fixed interval until a terminal status or its deadline.
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, handle: &str, ctx: &CallContext)
    -> Result<ConfirmOutcome, RawFailure>;
}

/// Advisory input validator: a non-`None` result short-circuits the
/// execution before `submit` is ever invoked.
pub type InputValidator = Box<dyn Fn(&Value) -> Option<NormalizedError> + Send + Sync>;

/// Advisory precondition check, run before input validation.
pub type PreconditionCheck = Box<dyn Fn() -> Option<NormalizedError> + Send + Sync>;
