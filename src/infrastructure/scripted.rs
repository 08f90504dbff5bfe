use crate::domain::failure::RawFailure;
use crate::domain::ports::{CallContext, ConfirmOutcome, Confirmer, SubmitReceipt, Submitter};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A submitter that replays pre-programmed outcomes in order.
///
/// Once the script is exhausted the final outcome repeats, so a scenario
/// only has to spell out the interesting prefix. Used by the scenario
/// binary and the integration tests; never by production callers.
pub struct ScriptedSubmitter {
    script: Mutex<VecDeque<Result<SubmitReceipt, RawFailure>>>,
    last: Mutex<Option<Result<SubmitReceipt, RawFailure>>>,
    calls: Mutex<u32>,
}

impl ScriptedSubmitter {
    pub fn new(outcomes: impl IntoIterator<Item = Result<SubmitReceipt, RawFailure>>) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            last: Mutex::new(None),
            calls: Mutex::new(0),
        }
    }

    /// Number of submit invocations so far.
    pub fn calls(&self) -> u32 {
        *self.calls.lock().expect("scripted submitter poisoned")
    }

    fn next(&self) -> Result<SubmitReceipt, RawFailure> {
        *self.calls.lock().expect("scripted submitter poisoned") += 1;
        let mut script = self.script.lock().expect("scripted submitter poisoned");
        let mut last = self.last.lock().expect("scripted submitter poisoned");
        match script.pop_front() {
            Some(outcome) => {
                *last = Some(outcome.clone());
                outcome
            }
            None => last
                .clone()
                .unwrap_or_else(|| Err(RawFailure::text("scripted submitter has no outcomes"))),
        }
    }
}

#[async_trait]
impl Submitter for ScriptedSubmitter {
    async fn submit(&self, _input: &Value, _ctx: &CallContext) -> Result<SubmitReceipt, RawFailure> {
        self.next()
    }
}

/// A confirmer that replays pre-programmed poll responses in order,
/// repeating the final one once exhausted.
pub struct ScriptedConfirmer {
    script: Mutex<VecDeque<Result<ConfirmOutcome, RawFailure>>>,
    last: Mutex<Option<Result<ConfirmOutcome, RawFailure>>>,
    calls: Mutex<u32>,
}

impl ScriptedConfirmer {
    pub fn new(outcomes: impl IntoIterator<Item = Result<ConfirmOutcome, RawFailure>>) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            last: Mutex::new(None),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().expect("scripted confirmer poisoned")
    }

    fn next(&self) -> Result<ConfirmOutcome, RawFailure> {
        *self.calls.lock().expect("scripted confirmer poisoned") += 1;
        let mut script = self.script.lock().expect("scripted confirmer poisoned");
        let mut last = self.last.lock().expect("scripted confirmer poisoned");
        match script.pop_front() {
            Some(outcome) => {
                *last = Some(outcome.clone());
                outcome
            }
            None => last.clone().unwrap_or_else(|| Ok(ConfirmOutcome::pending())),
        }
    }
}

#[async_trait]
impl Confirmer for ScriptedConfirmer {
    async fn confirm(
        &self,
        _handle: &str,
        _ctx: &CallContext,
    ) -> Result<ConfirmOutcome, RawFailure> {
        self.next()
    }
}
