//! Child-process plumbing shared by all executors.
//!
//! Information Hiding:
//! - Temp-file naming and lifetime hidden behind RAII handles
//! - Kill semantics (`kill_on_drop`) hidden from executor implementations
//! - Stream interpretation rules centralized in one place

use serde_json::Value;
use std::io::Write;
use std::process::{Output, Stdio};
use tempfile::NamedTempFile;
use tokio::process::Command;

use super::ExecutorError;

/// Write a wrapped harness program to a uniquely-named temp file.
///
/// The name is random and unguessable, so concurrent invocations of the same
/// function never collide. Dropping the handle removes the file, which covers
/// success, failure, and cancellation paths alike.
pub fn materialize(source: &str, suffix: &str) -> Result<NamedTempFile, ExecutorError> {
    let mut file = tempfile::Builder::new()
        .prefix("toolsmith-")
        .suffix(suffix)
        .tempfile()?;
    file.write_all(source.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Spawn an interpreter and collect its full output.
///
/// No timeout is applied here; the orchestrator races this future against its
/// deadline. `kill_on_drop` guarantees the child is SIGKILLed if the race is
/// lost and this future is dropped mid-flight.
pub async fn run(interpreter: &str, args: &[&str]) -> Result<Output, ExecutorError> {
    let child = Command::new(interpreter)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ExecutorError::SpawnFailed {
            interpreter: interpreter.to_string(),
            message: e.to_string(),
        })?;

    child
        .wait_with_output()
        .await
        .map_err(|e| ExecutorError::SpawnFailed {
            interpreter: interpreter.to_string(),
            message: e.to_string(),
        })
}

/// Whether an interpreter responds on PATH. Used by tests to skip when a
/// runtime is not installed.
pub async fn interpreter_available(interpreter: &str) -> bool {
    Command::new(interpreter)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Turn captured process output into a JSON value or a classified error.
///
/// Zero exit: stdout parsed as JSON, falling back to trimmed text so
/// functions that print plain strings still work. Non-zero exit: stderr
/// parsed as `{"error": ...}` when possible, raw stderr otherwise, with a
/// generic message as the last resort. A missing entry point is signalled by
/// the harness with `"code": "entry_point"`, never inferred from the message
/// text, so user errors that happen to match the prose stay runtime errors.
pub fn interpret(output: &Output, entry_point: &str) -> Result<Value, ExecutorError> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if output.status.success() {
        return Ok(serde_json::from_str(stdout.trim())
            .unwrap_or_else(|_| Value::String(stdout.trim().to_string())));
    }

    let structured = serde_json::from_str::<Value>(stderr.trim()).ok();
    if let Some(v) = &structured {
        if v.get("code").and_then(|c| c.as_str()) == Some("entry_point") {
            return Err(ExecutorError::EntryPointNotFound(entry_point.to_string()));
        }
    }

    let message = structured
        .as_ref()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| {
            let raw = stderr.trim();
            if raw.is_empty() {
                format!("process exited with {}", output.status)
            } else {
                raw.to_string()
            }
        });
    Err(ExecutorError::Runtime(message))
}
