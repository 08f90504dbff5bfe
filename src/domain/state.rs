use crate::domain::failure::NormalizedError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle phase of one orchestrated transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxPhase {
    Idle,
    Validating,
    Submitting,
    Submitted,
    Confirming,
    Retrying,
    Confirmed,
    Failed,
}

impl TxPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxPhase::Idle => "IDLE",
            TxPhase::Validating => "VALIDATING",
            TxPhase::Submitting => "SUBMITTING",
            TxPhase::Submitted => "SUBMITTED",
            TxPhase::Confirming => "CONFIRMING",
            TxPhase::Retrying => "RETRYING",
            TxPhase::Confirmed => "CONFIRMED",
            TxPhase::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TxPhase::Confirmed | TxPhase::Failed)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, TxPhase::Idle)
    }

    /// Whether `next` is a legal successor of this phase.
    ///
    /// Re-entering `Confirming` on a poll tick is legal and is not a new
    /// edge. Terminal phases have no successors.
    pub fn can_transition(&self, next: TxPhase) -> bool {
        match self {
            TxPhase::Idle => matches!(next, TxPhase::Validating),
            TxPhase::Validating => matches!(next, TxPhase::Submitting | TxPhase::Failed),
            TxPhase::Submitting => {
                matches!(next, TxPhase::Submitted | TxPhase::Retrying | TxPhase::Failed)
            }
            TxPhase::Submitted => matches!(next, TxPhase::Confirming | TxPhase::Failed),
            TxPhase::Confirming => {
                matches!(next, TxPhase::Confirming | TxPhase::Confirmed | TxPhase::Failed)
            }
            TxPhase::Retrying => matches!(next, TxPhase::Submitting | TxPhase::Failed),
            TxPhase::Confirmed | TxPhase::Failed => false,
        }
    }
}

impl std::fmt::Display for TxPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full snapshot of one orchestrator's state.
///
/// Exactly one instance exists per orchestrator; transitions replace it
/// wholesale so observers can never see an inconsistent phase/attempt pair.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorState {
    pub phase: TxPhase,
    pub operation: String,
    pub correlation_id: String,
    pub handle: Option<String>,
    pub attempt: u32,
    pub confirmations: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub settled_at: Option<DateTime<Utc>>,
    pub last_error: Option<NormalizedError>,
}

impl OrchestratorState {
    /// The snapshot an orchestrator holds before any execution.
    pub fn idle() -> Self {
        Self {
            phase: TxPhase::Idle,
            operation: String::new(),
            correlation_id: String::new(),
            handle: None,
            attempt: 0,
            confirmations: 0,
            started_at: None,
            settled_at: None,
            last_error: None,
        }
    }

    /// Fresh state for a new execution, already in `Validating`.
    ///
    /// Resetting the counters and entering validation happen as one
    /// replacement so no observer sees a half-initialized snapshot.
    pub fn begin(operation: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self {
            phase: TxPhase::Validating,
            operation: operation.into(),
            correlation_id: correlation_id.into(),
            handle: None,
            attempt: 0,
            confirmations: 0,
            started_at: Some(Utc::now()),
            settled_at: None,
            last_error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}

impl Default for OrchestratorState {
    fn default() -> Self {
        Self::idle()
    }
}
