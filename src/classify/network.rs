use crate::domain::failure::{ErrorDomain, NormalizedError, RawFailure, Severity};
use crate::domain::ports::CallContext;

/// Classifies a network/transport failure into the RPC domain.
///
/// Defaults toward `Retryable`: blocking a legitimate retry is worse than
/// spending one extra attempt on a failure that turns out to be permanent.
pub fn classify_network(raw: &RawFailure, ctx: &CallContext) -> NormalizedError {
    let message = raw.message();
    let lowered = message.to_lowercase();

    let (code, severity, detail) = if contains_any(&lowered, &["expired", "too late to be valid"])
    {
        (
            "RPC_TX_EXPIRED",
            Severity::Retryable,
            "transaction expired before inclusion",
        )
    } else if contains_any(&lowered, &["resource limit", "exceeds resource", "budget exceeded"]) {
        (
            "RPC_RESOURCE_LIMIT",
            Severity::Fatal,
            "transaction exceeds a resource limit",
        )
    } else if contains_any(&lowered, &["rejected", "failed rule", "malformed"]) {
        (
            "RPC_TX_REJECTED",
            Severity::Fatal,
            "transaction rejected by the ledger",
        )
    } else if contains_any(&lowered, &["timeout", "timed out", "deadline"]) {
        ("RPC_TIMEOUT", Severity::Retryable, "request timed out")
    } else if contains_any(
        &lowered,
        &[
            "abort",
            "connection refused",
            "connection reset",
            "unreachable",
            "socket",
            "network",
        ],
    ) {
        (
            "RPC_UNAVAILABLE",
            Severity::Retryable,
            "transport unavailable",
        )
    } else {
        ("RPC_UNKNOWN", Severity::Retryable, "unrecognized RPC failure")
    };

    let rendered = if message.is_empty() {
        detail.to_string()
    } else {
        format!("{detail}: {message}")
    };
    ctx.apply(
        NormalizedError::new(code, ErrorDomain::Rpc, severity, rendered).with_original(raw),
    )
}

pub(crate) fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
