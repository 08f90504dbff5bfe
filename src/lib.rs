pub mod application;
pub mod classify;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;

pub use application::guard::{InFlightRegistry, InFlightTicket, in_flight_key};
pub use application::orchestrator::{ObserverId, Orchestrator, TransactionResult};
pub use classify::{ContractCodeEntry, ProgramErrorTables, classify};
pub use domain::failure::{ErrorDomain, NormalizedError, RawFailure, Severity};
pub use domain::ports::{
    CallContext, ConfirmOutcome, ConfirmStatus, Confirmer, SubmitReceipt, Submitter,
};
pub use domain::request::{RetryPolicy, TransactionRequest};
pub use domain::state::{OrchestratorState, TxPhase};
pub use error::{OrchestratorCode, OrchestratorError};
