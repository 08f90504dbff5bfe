use crate::domain::failure::{ErrorDomain, NormalizedError, RawFailure, Severity};
use crate::domain::ports::CallContext;
use std::collections::HashMap;

/// Resolution of one contract execution code.
#[derive(Debug, Clone)]
pub struct ContractCodeEntry {
    pub code: String,
    pub message: String,
    pub severity: Severity,
}

impl ContractCodeEntry {
    pub fn new(code: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity,
        }
    }
}

/// Per-program contract error code tables.
///
/// The same small integer means different things for different deployed
/// programs, so resolution consults the program's own table first. Only the
/// low-numbered codes every program shares ship by default; deployments
/// register their program tables on top.
#[derive(Debug, Clone)]
pub struct ProgramErrorTables {
    shared: HashMap<u32, ContractCodeEntry>,
    programs: HashMap<String, HashMap<u32, ContractCodeEntry>>,
}

impl Default for ProgramErrorTables {
    fn default() -> Self {
        let shared = HashMap::from([
            (
                1,
                ContractCodeEntry::new(
                    "CONTRACT_ALREADY_INITIALIZED",
                    "contract is already initialized",
                    Severity::Fatal,
                ),
            ),
            (
                2,
                ContractCodeEntry::new(
                    "CONTRACT_NOT_INITIALIZED",
                    "contract is not initialized",
                    Severity::UserActionable,
                ),
            ),
            (
                3,
                ContractCodeEntry::new(
                    "CONTRACT_NOT_AUTHORIZED",
                    "not authorized",
                    Severity::UserActionable,
                ),
            ),
        ]);
        Self {
            shared,
            programs: HashMap::new(),
        }
    }
}

impl ProgramErrorTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or extends) the code table for one program identity.
    pub fn register(
        &mut self,
        program: impl Into<String>,
        entries: impl IntoIterator<Item = (u32, ContractCodeEntry)>,
    ) {
        self.programs
            .entry(program.into())
            .or_default()
            .extend(entries);
    }

    /// Looks up a code, program table first, then the shared table.
    pub fn resolve(&self, program: Option<&str>, code: u32) -> Option<&ContractCodeEntry> {
        if let Some(program) = program
            && let Some(entry) = self.programs.get(program).and_then(|t| t.get(&code))
        {
            return Some(entry);
        }
        self.shared.get(&code)
    }
}

/// Classifies a remote program execution failure.
///
/// The execution code comes from a pre-parsed field or the textual
/// diagnostic pattern; codes with no table entry collapse into the single
/// unknown/fatal fallback.
pub fn classify_contract(
    raw: &RawFailure,
    program: Option<&str>,
    tables: &ProgramErrorTables,
    ctx: &CallContext,
) -> NormalizedError {
    let error = match raw.contract_error_code() {
        Some(number) => {
            let resolved = match tables.resolve(program, number) {
                Some(entry) => NormalizedError::new(
                    entry.code.clone(),
                    ErrorDomain::Contract,
                    entry.severity,
                    entry.message.clone(),
                ),
                None => NormalizedError::new(
                    "CONTRACT_UNKNOWN",
                    ErrorDomain::Contract,
                    Severity::Fatal,
                    format!("unrecognized contract execution code #{number}"),
                ),
            };
            resolved.with_context("contract_code", number.to_string())
        }
        None => NormalizedError::new(
            "CONTRACT_UNKNOWN",
            ErrorDomain::Contract,
            Severity::Fatal,
            format!("no contract execution code in failure: {}", raw.message()),
        ),
    };

    ctx.apply(error.with_original(raw))
}
