//! Error classification subsystem.
//!
//! Total functions mapping an arbitrary collaborator failure, plus optional
//! caller context, into a `NormalizedError` with a stable code, origin
//! domain, and severity. Nothing above this layer inspects raw failures
//! directly, and nothing in this layer can itself fail.

pub mod api;
pub mod contract;
pub mod network;
pub mod signer;

pub use api::classify_api;
pub use contract::{ContractCodeEntry, ProgramErrorTables, classify_contract};
pub use network::classify_network;
pub use signer::classify_signer;

use crate::classify::network::contains_any;
use crate::domain::failure::{ErrorDomain, NormalizedError, RawFailure, Severity};
use crate::domain::ports::CallContext;

const SIGNER_KEYWORDS: &[&str] = &[
    "wallet",
    "signer",
    "extension",
    "user declined",
    "rejected the request",
    "signature",
];

const TRANSPORT_KEYWORDS: &[&str] = &[
    "timeout",
    "timed out",
    "network",
    "connection",
    "abort",
    "unreachable",
    "fetch",
    "socket",
    "refused",
];

/// Unified classification entry point.
///
/// A supplied domain hint delegates directly to that domain's classifier.
/// Without one, probes run in a fixed priority: contract diagnostic, signer
/// phrasing, transport keyword (split Api/Rpc on whether the payload carries
/// an HTTP-response shape), then any numeric status field. The order is
/// observable behavior: some raw shapes satisfy more than one probe, and a
/// bare small integer deliberately classifies as a contract code.
pub fn classify(
    raw: &RawFailure,
    hint: Option<ErrorDomain>,
    tables: &ProgramErrorTables,
    ctx: &CallContext,
) -> NormalizedError {
    match hint {
        Some(ErrorDomain::Rpc) => return classify_network(raw, ctx),
        Some(ErrorDomain::Api) => return classify_api(raw, ctx),
        Some(ErrorDomain::Wallet) => return classify_signer(raw, ctx),
        Some(ErrorDomain::Contract) => {
            return classify_contract(raw, ctx.program.as_deref(), tables, ctx);
        }
        Some(ErrorDomain::Unknown) | None => {}
    }

    if raw.contract_error_code().is_some() {
        return classify_contract(raw, ctx.program.as_deref(), tables, ctx);
    }

    let lowered = raw.message().to_lowercase();
    if contains_any(&lowered, SIGNER_KEYWORDS) {
        return classify_signer(raw, ctx);
    }
    if contains_any(&lowered, TRANSPORT_KEYWORDS) {
        return if raw.has_http_response_shape() {
            classify_api(raw, ctx)
        } else {
            classify_network(raw, ctx)
        };
    }
    if raw.status_code().is_some() {
        return classify_api(raw, ctx);
    }

    ctx.apply(
        NormalizedError::new(
            "UNKNOWN_ERROR",
            ErrorDomain::Unknown,
            Severity::Fatal,
            raw.message(),
        )
        .with_original(raw),
    )
}
