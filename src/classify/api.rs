use crate::domain::failure::{ErrorDomain, NormalizedError, RawFailure, Severity};
use crate::domain::ports::CallContext;

/// Fallback retry-after hint when a 429 carries no usable header or field.
const DEFAULT_RETRY_AFTER_MS: u64 = 1000;

/// Classifies a backend REST failure, keyed on its HTTP-style status.
///
/// The status nested inside an error body wins over a top-level field; a
/// missing status means the transport failed before any response arrived.
pub fn classify_api(raw: &RawFailure, ctx: &CallContext) -> NormalizedError {
    let message = raw.message();

    let error = match raw.status_code() {
        None => NormalizedError::new(
            "API_NETWORK",
            ErrorDomain::Api,
            Severity::Retryable,
            format!("request failed before a response: {message}"),
        ),
        Some(status @ (400 | 422)) => NormalizedError::new(
            "API_VALIDATION",
            ErrorDomain::Api,
            Severity::UserActionable,
            format!("request rejected as invalid ({status}): {message}"),
        ),
        Some(401) => NormalizedError::new(
            "API_UNAUTHORIZED",
            ErrorDomain::Api,
            Severity::UserActionable,
            format!("authentication required: {message}"),
        ),
        Some(403) => NormalizedError::new(
            "API_FORBIDDEN",
            ErrorDomain::Api,
            Severity::UserActionable,
            format!("access forbidden: {message}"),
        ),
        Some(404) => NormalizedError::new(
            "API_NOT_FOUND",
            ErrorDomain::Api,
            Severity::Fatal,
            format!("resource not found: {message}"),
        ),
        Some(429) => {
            let retry_after = raw.retry_after_ms().unwrap_or(DEFAULT_RETRY_AFTER_MS);
            NormalizedError::new(
                "API_RATE_LIMITED",
                ErrorDomain::Api,
                Severity::Retryable,
                format!("rate limited: {message}"),
            )
            .with_retry_after(retry_after)
        }
        Some(status @ 500..=599) => NormalizedError::new(
            "API_SERVER",
            ErrorDomain::Api,
            Severity::Retryable,
            format!("server error ({status}): {message}"),
        ),
        Some(status) => NormalizedError::new(
            "API_UNKNOWN",
            ErrorDomain::Api,
            Severity::Retryable,
            format!("unexpected status ({status}): {message}"),
        ),
    };

    ctx.apply(error.with_original(raw))
}
