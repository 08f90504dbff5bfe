use crate::classify::network::contains_any;
use crate::domain::failure::{ErrorDomain, NormalizedError, RawFailure, Severity};
use crate::domain::ports::CallContext;

/// Ordered phrase table for signing-device failures. First match wins.
const SIGNER_PHRASES: &[(&[&str], &str, &str)] = &[
    (
        &["not installed", "no extension", "extension is missing"],
        "WALLET_NOT_INSTALLED",
        "wallet extension is not installed",
    ),
    (
        &["not connected", "connect your wallet", "no active wallet"],
        "WALLET_NOT_CONNECTED",
        "wallet is not connected",
    ),
    (
        &["declined", "denied", "user rejected", "rejected the request"],
        "WALLET_REJECTED",
        "request declined in the wallet",
    ),
    (
        &["wrong network", "network mismatch", "different network"],
        "WALLET_WRONG_NETWORK",
        "wallet is on the wrong network",
    ),
    (
        &["insufficient balance", "insufficient funds", "underfunded"],
        "WALLET_INSUFFICIENT_FUNDS",
        "insufficient balance to cover the operation",
    ),
    (
        &["signing failed", "failed to sign", "signature failed"],
        "WALLET_SIGNING_FAILED",
        "wallet failed to sign the transaction",
    ),
];

/// Classifies a signing-device failure by its human-readable phrasing.
///
/// Signer failures are almost always something the end user can act on
/// (install, connect, switch network, fund the account), so unrecognized
/// phrasing stays `UserActionable` rather than escalating to `Fatal`.
pub fn classify_signer(raw: &RawFailure, ctx: &CallContext) -> NormalizedError {
    let message = raw.message();
    let lowered = message.to_lowercase();

    let (code, detail) = SIGNER_PHRASES
        .iter()
        .find(|(phrases, _, _)| contains_any(&lowered, phrases))
        .map(|(_, code, detail)| (*code, *detail))
        .unwrap_or(("WALLET_UNKNOWN", "unrecognized wallet failure"));

    let rendered = if message.is_empty() {
        detail.to_string()
    } else {
        format!("{detail}: {message}")
    };
    ctx.apply(
        NormalizedError::new(code, ErrorDomain::Wallet, Severity::UserActionable, rendered)
            .with_original(raw),
    )
}
