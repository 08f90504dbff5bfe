use std::fs::File;
use std::io::{Error, Write};
use std::path::{Path, PathBuf};

/// Writes a scenario JSON file into `dir` and returns its path.
pub fn write_scenario(dir: &Path, name: &str, contents: &str) -> Result<PathBuf, Error> {
    let path = dir.join(name);
    let mut file = File::create(&path)?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(path)
}

/// A scenario that retries twice on transport failures, then confirms.
pub fn retry_then_confirm_scenario() -> &'static str {
    r#"{
        "operation": "pool.fund",
        "input": { "amount": "100", "asset": "XLM" },
        "submit": [
            { "error": "connection refused" },
            { "error": "request timed out" },
            { "handle": "tx-42" }
        ],
        "confirm": [
            { "status": "confirmed", "confirmations": 1 }
        ],
        "retry": { "max_attempts": 3, "initial_backoff_ms": 1, "backoff_multiplier": 1.0 },
        "poll_interval_ms": 5,
        "confirmation_timeout_ms": 500
    }"#
}

/// A scenario whose submission fails on a user-declined signature.
pub fn declined_scenario() -> &'static str {
    r#"{
        "operation": "pool.fund",
        "input": { "amount": "100" },
        "submit": [
            { "error": "User declined the signature request" }
        ],
        "confirm": [],
        "retry": { "max_attempts": 3, "initial_backoff_ms": 1, "backoff_multiplier": 1.0 },
        "poll_interval_ms": 5,
        "confirmation_timeout_ms": 500
    }"#
}
