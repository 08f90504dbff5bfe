use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Origin domain of a classified failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorDomain {
    Rpc,
    Api,
    Wallet,
    Contract,
    Unknown,
}

impl ErrorDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorDomain::Rpc => "RPC",
            ErrorDomain::Api => "API",
            ErrorDomain::Wallet => "WALLET",
            ErrorDomain::Contract => "CONTRACT",
            ErrorDomain::Unknown => "UNKNOWN",
        }
    }
}

/// How the orchestrator should react to a failure. Assigned once at
/// classification time and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Retryable,
    UserActionable,
    Fatal,
}

/// An arbitrary collaborator failure, before classification.
///
/// Collaborators surface failures either as plain text or as a structured
/// payload (an HTTP response body, an RPC diagnostic, a signer message).
/// The probe methods below are total: they answer shape questions without
/// ever failing, so classification never has to touch raw JSON directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFailure {
    Text(String),
    Payload(Value),
}

impl RawFailure {
    pub fn text(message: impl Into<String>) -> Self {
        RawFailure::Text(message.into())
    }

    pub fn payload(value: Value) -> Self {
        RawFailure::Payload(value)
    }

    /// Best-effort human-readable message for the failure.
    pub fn message(&self) -> String {
        match self {
            RawFailure::Text(text) => text.clone(),
            RawFailure::Payload(value) => {
                if let Some(message) = value.get("message").and_then(Value::as_str) {
                    return message.to_string();
                }
                if let Some(error) = value.get("error") {
                    if let Some(message) = error.as_str() {
                        return message.to_string();
                    }
                    if let Some(message) = error.get("message").and_then(Value::as_str) {
                        return message.to_string();
                    }
                }
                value.to_string()
            }
        }
    }

    /// HTTP-style status carried by the failure, preferring a status nested
    /// inside an error body over a top-level field.
    pub fn status_code(&self) -> Option<u16> {
        let RawFailure::Payload(value) = self else {
            return None;
        };
        let nested = value
            .get("error")
            .and_then(|e| e.get("status"))
            .or_else(|| value.get("response").and_then(|r| r.get("status")));
        nested
            .or_else(|| value.get("status"))
            .or_else(|| value.get("statusCode"))
            .and_then(Value::as_u64)
            .and_then(|status| u16::try_from(status).ok())
    }

    /// Whether the payload looks like a full HTTP response (a status plus a
    /// body-shaped sibling), as opposed to a bare transport diagnostic.
    pub fn has_http_response_shape(&self) -> bool {
        let RawFailure::Payload(value) = self else {
            return false;
        };
        self.status_code().is_some()
            && (value.get("body").is_some()
                || value.get("response").is_some()
                || value.get("headers").is_some()
                || value.get("error").is_some())
    }

    /// Contract execution code, from a pre-parsed numeric field, a textual
    /// `Error(Contract, #N)` diagnostic, or a bare small integer payload.
    ///
    /// A bare number below 1000 is indistinguishable from an unrelated
    /// numeric payload; it is treated as a contract code on purpose, so the
    /// auto-detect priority stays stable.
    pub fn contract_error_code(&self) -> Option<u32> {
        if let RawFailure::Payload(value) = self {
            if let Some(code) = value.get("contract_code").and_then(Value::as_u64) {
                return u32::try_from(code).ok();
            }
            if let Some(code) = value.as_u64() {
                return if code < 1000 {
                    Some(code as u32)
                } else {
                    None
                };
            }
        }
        parse_contract_diagnostic(&self.message())
    }

    /// Retry-after hint in milliseconds, probed from the payload body or a
    /// captured header map.
    pub fn retry_after_ms(&self) -> Option<u64> {
        let RawFailure::Payload(value) = self else {
            return None;
        };
        if let Some(ms) = value.get("retryAfterMs").and_then(Value::as_u64) {
            return Some(ms);
        }
        let headers = value.get("headers")?;
        if let Some(ms) = header_number(headers, "retry-after-ms") {
            return Some(ms);
        }
        header_number(headers, "retry-after").map(|seconds| seconds * 1000)
    }
}

fn header_number(headers: &Value, name: &str) -> Option<u64> {
    let header = headers.get(name)?;
    header
        .as_u64()
        .or_else(|| header.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Parses the `Error(Contract, #N)` diagnostic pattern out of free text.
fn parse_contract_diagnostic(message: &str) -> Option<u32> {
    let start = message.find("Error(Contract,")?;
    let rest = &message[start + "Error(Contract,".len()..];
    let rest = rest.trim_start().strip_prefix('#')?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// A classified failure with a stable code, origin domain, and severity.
///
/// The original failure is retained opaquely for diagnostics; nothing above
/// the classification subsystem inspects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedError {
    pub code: String,
    pub domain: ErrorDomain,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<RawFailure>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
}

impl NormalizedError {
    pub fn new(
        code: impl Into<String>,
        domain: ErrorDomain,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            domain,
            severity,
            message: message.into(),
            original: None,
            context: BTreeMap::new(),
            retry_after_ms: None,
        }
    }

    pub fn with_original(mut self, raw: &RawFailure) -> Self {
        self.original = Some(raw.clone());
        self
    }

    pub fn with_retry_after(mut self, ms: u64) -> Self {
        self.retry_after_ms = Some(ms);
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.severity == Severity::Retryable
    }
}
