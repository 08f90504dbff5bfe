use crate::domain::failure::RawFailure;
use crate::domain::ports::{ConfirmOutcome, ConfirmStatus, SubmitReceipt};
use crate::domain::request::{
    DEFAULT_CONFIRMATION_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS, RetryPolicy, TransactionRequest,
};
use crate::infrastructure::scripted::{ScriptedConfirmer, ScriptedSubmitter};
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

/// One scripted submission outcome: either a receipt or a raw failure.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitStep {
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<RawFailure>,
}

impl From<SubmitStep> for Result<SubmitReceipt, RawFailure> {
    fn from(step: SubmitStep) -> Self {
        match step.error {
            Some(raw) => Err(raw),
            None => Ok(SubmitReceipt {
                handle: step.handle.unwrap_or_default(),
                data: step.data,
            }),
        }
    }
}

/// One scripted confirmation poll: a status response, or a thrown failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmStep {
    #[serde(default)]
    pub status: Option<ConfirmStatus>,
    #[serde(default)]
    pub confirmations: Option<u64>,
    #[serde(default)]
    pub error: Option<RawFailure>,
    /// A transport-level failure thrown by the poll itself, as opposed to a
    /// response that reports the operation failed.
    #[serde(default)]
    pub throw: Option<RawFailure>,
}

impl From<ConfirmStep> for Result<ConfirmOutcome, RawFailure> {
    fn from(step: ConfirmStep) -> Self {
        match step.throw {
            Some(raw) => Err(raw),
            None => Ok(ConfirmOutcome {
                status: step.status.unwrap_or(ConfirmStatus::Pending),
                confirmations: step.confirmations,
                error: step.error,
            }),
        }
    }
}

/// A replayable transaction scenario: the request configuration plus the
/// scripted collaborator outcomes.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub operation: String,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub submit: Vec<SubmitStep>,
    #[serde(default)]
    pub confirm: Vec<ConfirmStep>,
    #[serde(default)]
    pub retry: Option<RetryPolicy>,
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
    #[serde(default)]
    pub confirmation_timeout_ms: Option<u64>,
}

impl Scenario {
    /// Reads a scenario from any JSON source (e.g. a file or stdin).
    pub fn from_reader<R: Read>(source: R) -> serde_json::Result<Self> {
        serde_json::from_reader(source)
    }

    /// Builds the executable request, wiring scripted adapters for the
    /// submit and confirm ports.
    pub fn into_request(self) -> TransactionRequest {
        let submitter = Arc::new(ScriptedSubmitter::new(
            self.submit.into_iter().map(Result::from),
        ));
        let confirmer = Arc::new(ScriptedConfirmer::new(
            self.confirm.into_iter().map(Result::from),
        ));

        let mut request = TransactionRequest::new(self.operation, self.input, submitter, confirmer)
            .with_retry_policy(self.retry.unwrap_or_default())
            .with_poll_interval(Duration::from_millis(
                self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            ))
            .with_confirmation_timeout(Duration::from_millis(
                self.confirmation_timeout_ms
                    .unwrap_or(DEFAULT_CONFIRMATION_TIMEOUT_MS),
            ));
        if let Some(program) = self.program {
            request = request.with_program(program);
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_parsing_with_defaults() {
        let json = r#"{
            "operation": "pool.fund",
            "input": { "amount": "100" },
            "submit": [
                { "error": "connection refused" },
                { "handle": "tx-42" }
            ],
            "confirm": [
                { "status": "pending" },
                { "status": "confirmed", "confirmations": 1 }
            ]
        }"#;
        let scenario = Scenario::from_reader(json.as_bytes()).unwrap();
        assert_eq!(scenario.operation, "pool.fund");
        assert_eq!(scenario.submit.len(), 2);
        assert_eq!(scenario.confirm.len(), 2);
        assert!(scenario.retry.is_none());

        let request = scenario.into_request();
        assert_eq!(request.poll_interval, Duration::from_millis(2000));
        assert_eq!(request.confirmation_timeout, Duration::from_millis(30_000));
    }

    #[test]
    fn test_submit_step_conversion() {
        let failing = SubmitStep {
            handle: None,
            data: None,
            error: Some(RawFailure::text("boom")),
        };
        assert!(Result::<SubmitReceipt, RawFailure>::from(failing).is_err());

        let succeeding = SubmitStep {
            handle: Some("tx-1".to_string()),
            data: None,
            error: None,
        };
        let receipt = Result::<SubmitReceipt, RawFailure>::from(succeeding).unwrap();
        assert_eq!(receipt.handle, "tx-1");
    }

    #[test]
    fn test_confirm_step_throw_takes_precedence() {
        let step = ConfirmStep {
            status: Some(ConfirmStatus::Pending),
            confirmations: None,
            error: None,
            throw: Some(RawFailure::text("rpc hiccup")),
        };
        assert!(Result::<ConfirmOutcome, RawFailure>::from(step).is_err());
    }

    #[test]
    fn test_scenario_overrides() {
        let json = r#"{
            "operation": "pool.fund",
            "retry": { "max_attempts": 5, "initial_backoff_ms": 1, "backoff_multiplier": 1.0 },
            "poll_interval_ms": 10,
            "confirmation_timeout_ms": 250
        }"#;
        let scenario = Scenario::from_reader(json.as_bytes()).unwrap();
        let request = scenario.into_request();
        assert_eq!(request.retry_policy.max_attempts, 5);
        assert_eq!(request.poll_interval, Duration::from_millis(10));
        assert_eq!(request.confirmation_timeout, Duration::from_millis(250));
    }
}
