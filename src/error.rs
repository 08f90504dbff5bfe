use crate::domain::failure::{ErrorDomain, NormalizedError, Severity};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Failure codes produced by the orchestrator itself, as opposed to the
/// classified codes carried by the underlying `NormalizedError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrchestratorCode {
    InvalidInput,
    PreconditionFailed,
    InvalidState,
    DuplicateInFlight,
    SubmissionFailed,
    ConfirmationFailed,
    Timeout,
}

impl OrchestratorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestratorCode::InvalidInput => "INVALID_INPUT",
            OrchestratorCode::PreconditionFailed => "PRECONDITION_FAILED",
            OrchestratorCode::InvalidState => "INVALID_STATE",
            OrchestratorCode::DuplicateInFlight => "DUPLICATE_IN_FLIGHT",
            OrchestratorCode::SubmissionFailed => "SUBMISSION_FAILED",
            OrchestratorCode::ConfirmationFailed => "CONFIRMATION_FAILED",
            OrchestratorCode::Timeout => "TIMEOUT",
        }
    }
}

impl std::fmt::Display for OrchestratorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A terminal orchestration failure: a classified cause plus the
/// orchestrator code and the correlation id of the execution that produced it.
#[derive(Debug, Clone, Error)]
#[error("{code} [{correlation_id}]: {}", .cause.message)]
pub struct OrchestratorError {
    pub code: OrchestratorCode,
    pub correlation_id: String,
    pub cause: NormalizedError,
}

impl OrchestratorError {
    pub fn new(
        code: OrchestratorCode,
        correlation_id: impl Into<String>,
        cause: NormalizedError,
    ) -> Self {
        Self {
            code,
            correlation_id: correlation_id.into(),
            cause,
        }
    }

    /// Builds an error with no collaborator failure behind it, synthesizing
    /// the normalized cause from the code itself.
    pub fn bare(
        code: OrchestratorCode,
        correlation_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let severity = match code {
            OrchestratorCode::InvalidState => Severity::Fatal,
            OrchestratorCode::Timeout => Severity::Retryable,
            _ => Severity::UserActionable,
        };
        let cause = NormalizedError::new(code.as_str(), ErrorDomain::Unknown, severity, message);
        Self::new(code, correlation_id, cause)
    }
}
