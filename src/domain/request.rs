use crate::domain::ports::{Confirmer, InputValidator, PreconditionCheck, Submitter};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_CONFIRMATION_TIMEOUT_MS: u64 = 30_000;

/// Bounded exponential backoff for the submission phase.
///
/// Governs submission only; confirmation is bounded by a wall-clock deadline
/// and a fixed poll interval instead of an attempt budget.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_initial_backoff_ms() -> u64 {
    DEFAULT_INITIAL_BACKOFF_MS
}

fn default_backoff_multiplier() -> f64 {
    DEFAULT_BACKOFF_MULTIPLIER
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after the given failed attempt (1-based):
    /// `initial_backoff_ms × multiplier^(attempt-1)`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(exponent);
        Duration::from_millis(millis as u64)
    }
}

/// Everything one `execute()` call needs, immutable for its duration.
pub struct TransactionRequest {
    pub operation: String,
    pub input: Value,
    /// Remote program identity for contract error resolution, when known.
    pub program: Option<String>,
    pub validate_input: Option<InputValidator>,
    pub validate_preconditions: Option<PreconditionCheck>,
    pub submitter: Arc<dyn Submitter>,
    pub confirmer: Arc<dyn Confirmer>,
    pub retry_policy: RetryPolicy,
    pub poll_interval: Duration,
    pub confirmation_timeout: Duration,
}

impl TransactionRequest {
    pub fn new(
        operation: impl Into<String>,
        input: Value,
        submitter: Arc<dyn Submitter>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        Self {
            operation: operation.into(),
            input,
            program: None,
            validate_input: None,
            validate_preconditions: None,
            submitter,
            confirmer,
            retry_policy: RetryPolicy::default(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            confirmation_timeout: Duration::from_millis(DEFAULT_CONFIRMATION_TIMEOUT_MS),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    pub fn with_input_validator(mut self, validator: InputValidator) -> Self {
        self.validate_input = Some(validator);
        self
    }

    pub fn with_precondition_check(mut self, check: PreconditionCheck) -> Self {
        self.validate_preconditions = Some(check);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_progression() {
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_backoff_ms: 500,
            backoff_multiplier: 2.0,
        };
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(2000));
    }

    #[test]
    fn test_flat_backoff_with_unit_multiplier() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff_ms: 1,
            backoff_multiplier: 1.0,
        };
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(1));
        assert_eq!(policy.backoff_delay(4), Duration::from_millis(1));
    }

    #[test]
    fn test_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_backoff_ms, 500);
        assert_eq!(policy.backoff_multiplier, 2.0);
    }

    #[test]
    fn test_policy_deserialization_fills_defaults() {
        let policy: RetryPolicy = serde_json::from_str("{\"max_attempts\": 5}").unwrap();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_backoff_ms, 500);
        assert_eq!(policy.backoff_multiplier, 2.0);
    }
}
