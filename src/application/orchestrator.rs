use crate::classify::{ProgramErrorTables, classify};
use crate::domain::failure::{ErrorDomain, NormalizedError, Severity};
use crate::domain::ports::{CallContext, ConfirmStatus};
use crate::domain::request::TransactionRequest;
use crate::domain::state::{OrchestratorState, TxPhase};
use crate::error::{OrchestratorCode, OrchestratorError};
use chrono::Utc;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

type ObserverFn = Box<dyn Fn(&OrchestratorState) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(u64);

/// Outcome of one completed `execute()` call.
#[derive(Debug)]
pub struct TransactionResult {
    pub success: bool,
    pub tx_hash: Option<String>,
    pub confirmations: u64,
    pub error: Option<OrchestratorError>,
    pub state: OrchestratorState,
}

impl TransactionResult {
    fn confirmed(state: OrchestratorState) -> Self {
        Self {
            success: true,
            tx_hash: state.handle.clone(),
            confirmations: state.confirmations,
            error: None,
            state,
        }
    }

    fn failed(error: OrchestratorError, state: OrchestratorState) -> Self {
        Self {
            success: false,
            tx_hash: None,
            confirmations: 0,
            error: Some(error),
            state,
        }
    }
}

/// Drives one transaction at a time through its lifecycle phases.
///
/// The orchestrator owns exactly one logical execution slot: a second
/// `execute()` while the first is non-terminal is rejected synchronously
/// and never reaches `submit`. Running N operations concurrently requires
/// N instances; each instance's state is its own, never shared.
pub struct Orchestrator {
    state: Mutex<OrchestratorState>,
    observers: Mutex<Vec<(ObserverId, ObserverFn)>>,
    next_observer: AtomicU64,
    tables: ProgramErrorTables,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::with_tables(ProgramErrorTables::new())
    }

    /// Builds an orchestrator resolving contract codes against `tables`.
    pub fn with_tables(tables: ProgramErrorTables) -> Self {
        Self {
            state: Mutex::new(OrchestratorState::idle()),
            observers: Mutex::new(Vec::new()),
            next_observer: AtomicU64::new(1),
            tables,
        }
    }

    /// Current state snapshot.
    pub fn get_state(&self) -> OrchestratorState {
        self.state.lock().expect("state lock poisoned").clone()
    }

    /// Registers an observer. The current snapshot is delivered
    /// synchronously before this returns; every later transition follows in
    /// order. Observers must not subscribe or unsubscribe from inside a
    /// callback.
    pub fn subscribe(
        &self,
        callback: impl Fn(&OrchestratorState) + Send + Sync + 'static,
    ) -> ObserverId {
        let id = ObserverId(self.next_observer.fetch_add(1, Ordering::Relaxed));
        let boxed: ObserverFn = Box::new(callback);
        let snapshot = self.get_state();
        let _ = catch_unwind(AssertUnwindSafe(|| boxed(&snapshot)));
        self.observers
            .lock()
            .expect("observer registry poisoned")
            .push((id, boxed));
        id
    }

    pub fn unsubscribe(&self, id: ObserverId) {
        self.observers
            .lock()
            .expect("observer registry poisoned")
            .retain(|(observer_id, _)| *observer_id != id);
    }

    /// Forces the instance back to `Idle`, discarding a terminal snapshot.
    /// Calling this mid-flight is a caller responsibility, not guarded here.
    pub fn reset(&self) {
        let snapshot = {
            let mut state = self.state.lock().expect("state lock poisoned");
            *state = OrchestratorState::idle();
            state.clone()
        };
        self.notify(&snapshot);
    }

    /// Runs one transaction to exactly one terminal outcome.
    pub async fn execute(&self, request: TransactionRequest) -> TransactionResult {
        let begin = {
            let mut state = self.state.lock().expect("state lock poisoned");
            if !state.phase.is_idle() && !state.phase.is_terminal() {
                let err = OrchestratorError::bare(
                    OrchestratorCode::DuplicateInFlight,
                    state.correlation_id.clone(),
                    format!("operation {} is already in flight", state.operation),
                );
                warn!(
                    operation = %request.operation,
                    in_flight = %state.operation,
                    "execution rejected: instance busy"
                );
                return TransactionResult::failed(err, state.clone());
            }
            // Discards a previous terminal snapshot and enters Validating as
            // one replacement, so observers never see a half-reset state.
            *state = OrchestratorState::begin(&request.operation, Uuid::new_v4().to_string());
            state.clone()
        };
        debug!(
            correlation_id = %begin.correlation_id,
            operation = %begin.operation,
            "execution started"
        );
        self.notify(&begin);

        let mut ctx = CallContext::new(begin.correlation_id.clone(), request.operation.clone());
        ctx.program = request.program.clone();

        match self.drive(&request, &mut ctx).await {
            Ok(confirmations) => {
                if let Err(err) = self.transition(TxPhase::Confirmed, |state| {
                    state.confirmations = confirmations;
                }) {
                    return TransactionResult::failed(err, self.get_state());
                }
                let state = self.get_state();
                info!(
                    correlation_id = %ctx.correlation_id,
                    handle = state.handle.as_deref().unwrap_or(""),
                    confirmations,
                    "transaction confirmed"
                );
                TransactionResult::confirmed(state)
            }
            Err(err) => {
                self.settle_failure(&err);
                TransactionResult::failed(err, self.get_state())
            }
        }
    }

    /// Validation, submission, and confirmation; returns the confirmation
    /// count on success. Every failure is already normalized by the time it
    /// leaves this function.
    async fn drive(
        &self,
        request: &TransactionRequest,
        ctx: &mut CallContext,
    ) -> crate::error::Result<u64> {
        if let Some(check) = &request.validate_preconditions
            && let Some(cause) = check()
        {
            return Err(OrchestratorError::new(
                OrchestratorCode::PreconditionFailed,
                ctx.correlation_id.clone(),
                cause,
            ));
        }
        if let Some(validate) = &request.validate_input
            && let Some(cause) = validate(&request.input)
        {
            return Err(OrchestratorError::new(
                OrchestratorCode::InvalidInput,
                ctx.correlation_id.clone(),
                cause,
            ));
        }

        let handle = self.submit_with_retry(request, ctx).await?;
        self.await_confirmation(request, &handle, ctx).await
    }

    /// Submission loop, bounded by the retry policy's attempt budget.
    async fn submit_with_retry(
        &self,
        request: &TransactionRequest,
        ctx: &mut CallContext,
    ) -> crate::error::Result<String> {
        let policy = &request.retry_policy;
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 1u32;

        loop {
            ctx.attempt = attempt;
            self.transition(TxPhase::Submitting, |state| {
                state.attempt = attempt;
            })?;

            match request.submitter.submit(&request.input, ctx).await {
                Ok(receipt) if !receipt.handle.trim().is_empty() => {
                    debug!(
                        correlation_id = %ctx.correlation_id,
                        handle = %receipt.handle,
                        attempt,
                        "submission accepted"
                    );
                    self.transition(TxPhase::Submitted, |state| {
                        state.handle = Some(receipt.handle.clone());
                    })?;
                    return Ok(receipt.handle);
                }
                Ok(_) => {
                    // submit must either fail loudly or return a usable
                    // handle; a blank handle is unconfirmable.
                    let cause = NormalizedError::new(
                        "SUBMIT_EMPTY_HANDLE",
                        ErrorDomain::Unknown,
                        Severity::Fatal,
                        "submit succeeded without a usable handle",
                    );
                    return Err(OrchestratorError::new(
                        OrchestratorCode::SubmissionFailed,
                        ctx.correlation_id.clone(),
                        cause,
                    ));
                }
                Err(raw) => {
                    let classified = classify(&raw, None, &self.tables, ctx);
                    if classified.is_retryable() && attempt < max_attempts {
                        warn!(
                            correlation_id = %ctx.correlation_id,
                            code = %classified.code,
                            attempt,
                            "submission failed, will retry"
                        );
                        self.transition(TxPhase::Retrying, |state| {
                            state.last_error = Some(classified.clone());
                        })?;
                        sleep(policy.backoff_delay(attempt)).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(OrchestratorError::new(
                        OrchestratorCode::SubmissionFailed,
                        ctx.correlation_id.clone(),
                        classified,
                    ));
                }
            }
        }
    }

    /// Confirmation loop, bounded by a wall-clock deadline rather than an
    /// attempt budget. Transient polling failures are swallowed; the
    /// deadline is what ends an unlucky streak.
    async fn await_confirmation(
        &self,
        request: &TransactionRequest,
        handle: &str,
        ctx: &mut CallContext,
    ) -> crate::error::Result<u64> {
        let deadline = Instant::now() + request.confirmation_timeout;
        self.transition(TxPhase::Confirming, |_| {})?;

        loop {
            match request.confirmer.confirm(handle, ctx).await {
                Ok(outcome) => match outcome.status {
                    ConfirmStatus::Confirmed => {
                        return Ok(outcome.confirmations.unwrap_or(0));
                    }
                    ConfirmStatus::Failed => {
                        let cause = match &outcome.error {
                            Some(raw) => classify(raw, None, &self.tables, ctx),
                            None => ctx.apply(NormalizedError::new(
                                "CONFIRMATION_REJECTED",
                                ErrorDomain::Unknown,
                                Severity::Fatal,
                                "operation reported failed during confirmation",
                            )),
                        };
                        return Err(OrchestratorError::new(
                            OrchestratorCode::ConfirmationFailed,
                            ctx.correlation_id.clone(),
                            cause,
                        ));
                    }
                    ConfirmStatus::Pending => {
                        self.transition(TxPhase::Confirming, |state| {
                            if let Some(confirmations) = outcome.confirmations {
                                state.confirmations = confirmations;
                            }
                        })?;
                    }
                },
                Err(raw) => {
                    let classified = classify(&raw, None, &self.tables, ctx);
                    if !classified.is_retryable() {
                        return Err(OrchestratorError::new(
                            OrchestratorCode::ConfirmationFailed,
                            ctx.correlation_id.clone(),
                            classified,
                        ));
                    }
                    debug!(
                        correlation_id = %ctx.correlation_id,
                        code = %classified.code,
                        "transient confirmation failure, polling continues"
                    );
                }
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            sleep(request.poll_interval.min(deadline - now)).await;
            if Instant::now() >= deadline {
                break;
            }
        }

        Err(OrchestratorError::bare(
            OrchestratorCode::Timeout,
            ctx.correlation_id.clone(),
            format!(
                "no terminal status within {}ms",
                request.confirmation_timeout.as_millis()
            ),
        ))
    }

    /// Replaces the state wholesale with `next` applied, after checking the
    /// transition table. An illegal transition is a programming defect:
    /// the machine jumps straight to `Failed` with `INVALID_STATE` instead
    /// of tolerating corruption.
    fn transition(
        &self,
        next: TxPhase,
        apply: impl FnOnce(&mut OrchestratorState),
    ) -> crate::error::Result<()> {
        let (snapshot, illegal) = {
            let mut state = self.state.lock().expect("state lock poisoned");
            if state.phase.can_transition(next) {
                let mut replaced = state.clone();
                replaced.phase = next;
                apply(&mut replaced);
                if next.is_terminal() {
                    replaced.settled_at = Some(Utc::now());
                }
                *state = replaced;
                (state.clone(), None)
            } else {
                let err = OrchestratorError::bare(
                    OrchestratorCode::InvalidState,
                    state.correlation_id.clone(),
                    format!("illegal transition {} -> {}", state.phase, next),
                );
                let mut replaced = state.clone();
                replaced.phase = TxPhase::Failed;
                replaced.last_error = Some(err.cause.clone());
                replaced.settled_at = Some(Utc::now());
                *state = replaced;
                (state.clone(), Some(err))
            }
        };

        match illegal {
            None => {
                debug!(
                    correlation_id = %snapshot.correlation_id,
                    phase = %snapshot.phase,
                    "phase transition"
                );
                self.notify(&snapshot);
                Ok(())
            }
            Some(err) => {
                error!(correlation_id = %snapshot.correlation_id, %err, "state machine corrupted");
                self.notify(&snapshot);
                Err(err)
            }
        }
    }

    /// Terminal failure: stamps `settled_at`, records the cause, notifies.
    /// A no-op when the machine already failed via the illegal-transition
    /// escalation.
    fn settle_failure(&self, err: &OrchestratorError) {
        let snapshot = {
            let mut state = self.state.lock().expect("state lock poisoned");
            if state.phase.is_terminal() {
                None
            } else {
                let mut replaced = state.clone();
                replaced.phase = TxPhase::Failed;
                replaced.last_error = Some(err.cause.clone());
                replaced.settled_at = Some(Utc::now());
                *state = replaced;
                Some(state.clone())
            }
        };
        if let Some(snapshot) = snapshot {
            error!(
                correlation_id = %snapshot.correlation_id,
                code = %err.code,
                cause = %err.cause.code,
                "transaction failed"
            );
            self.notify(&snapshot);
        }
    }

    /// Synchronous, ordered fan-out. A panicking observer is isolated so it
    /// cannot block the others or corrupt the run.
    fn notify(&self, snapshot: &OrchestratorState) {
        let observers = self.observers.lock().expect("observer registry poisoned");
        for (_, callback) in observers.iter() {
            let _ = catch_unwind(AssertUnwindSafe(|| callback(snapshot)));
        }
    }
}
