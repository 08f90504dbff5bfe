use serde_json::json;
use txflow::{
    CallContext, ContractCodeEntry, ErrorDomain, ProgramErrorTables, RawFailure, Severity,
    classify,
};

fn auto(raw: RawFailure) -> txflow::NormalizedError {
    classify(
        &raw,
        None,
        &ProgramErrorTables::new(),
        &CallContext::default(),
    )
}

#[test]
fn test_rate_limit_payload_auto_detects() {
    let error = auto(RawFailure::payload(json!({ "status": 429 })));
    assert_eq!(error.code, "API_RATE_LIMITED");
    assert_eq!(error.domain, ErrorDomain::Api);
    assert_eq!(error.severity, Severity::Retryable);
    assert!(error.retry_after_ms.unwrap() > 0);
}

#[test]
fn test_shared_contract_code_resolves_for_any_program() {
    let mut tables = ProgramErrorTables::new();
    tables.register(
        "pool",
        [(
            10,
            ContractCodeEntry::new(
                "POOL_INSUFFICIENT_LIQUIDITY",
                "pool has insufficient liquidity",
                Severity::UserActionable,
            ),
        )],
    );

    let raw = RawFailure::text("Error(Contract, #3)");
    for program in [None, Some("pool"), Some("anything-else")] {
        let mut ctx = CallContext::default();
        ctx.program = program.map(str::to_string);
        let error = classify(&raw, None, &tables, &ctx);
        assert_eq!(error.domain, ErrorDomain::Contract);
        assert_eq!(error.code, "CONTRACT_NOT_AUTHORIZED");
        assert_eq!(error.message, "not authorized");
    }
}

#[test]
fn test_program_identity_changes_code_meaning() {
    let mut tables = ProgramErrorTables::new();
    tables.register(
        "pool",
        [(
            10,
            ContractCodeEntry::new(
                "POOL_INSUFFICIENT_LIQUIDITY",
                "pool has insufficient liquidity",
                Severity::UserActionable,
            ),
        )],
    );
    tables.register(
        "token",
        [(
            10,
            ContractCodeEntry::new(
                "TOKEN_ALLOWANCE_EXCEEDED",
                "transfer exceeds the approved allowance",
                Severity::UserActionable,
            ),
        )],
    );

    let raw = RawFailure::text("Error(Contract, #10)");
    let mut ctx = CallContext::default();
    ctx.program = Some("pool".to_string());
    assert_eq!(
        classify(&raw, None, &tables, &ctx).code,
        "POOL_INSUFFICIENT_LIQUIDITY"
    );
    ctx.program = Some("token".to_string());
    assert_eq!(
        classify(&raw, None, &tables, &ctx).code,
        "TOKEN_ALLOWANCE_EXCEEDED"
    );
}

#[test]
fn test_detection_priority_is_fixed() {
    // Contract diagnostic wins even when signer phrasing is present.
    let error = auto(RawFailure::text("wallet call failed: Error(Contract, #2)"));
    assert_eq!(error.domain, ErrorDomain::Contract);

    // Signer phrasing wins over transport keywords.
    let error = auto(RawFailure::text("wallet connection dropped"));
    assert_eq!(error.domain, ErrorDomain::Wallet);

    // Transport keyword without an HTTP response shape is RPC.
    let error = auto(RawFailure::text("connection refused by peer"));
    assert_eq!(error.domain, ErrorDomain::Rpc);

    // The same keyword with a response-shaped payload is API.
    let error = auto(RawFailure::payload(json!({
        "message": "network request failed",
        "status": 502,
        "body": {}
    })));
    assert_eq!(error.domain, ErrorDomain::Api);
}

#[test]
fn test_context_is_threaded_into_classified_errors() {
    let mut ctx = CallContext::new("corr-3", "pool.fund");
    ctx.attempt = 2;
    let error = classify(
        &RawFailure::text("request timed out"),
        None,
        &ProgramErrorTables::new(),
        &ctx,
    );
    assert_eq!(error.context.get("correlation_id").unwrap(), "corr-3");
    assert_eq!(error.context.get("operation").unwrap(), "pool.fund");
    assert_eq!(error.context.get("attempt").unwrap(), "2");
}

#[test]
fn test_unknown_payload_is_fatal_but_preserved() {
    let raw = RawFailure::payload(json!({ "weird": true }));
    let error = auto(raw.clone());
    assert_eq!(error.code, "UNKNOWN_ERROR");
    assert_eq!(error.domain, ErrorDomain::Unknown);
    assert_eq!(error.severity, Severity::Fatal);
    assert_eq!(error.original, Some(raw));
}
