//! Execution Orchestrator
//!
//! Information Hiding:
//! - Timeout racing and duration accounting internalized
//! - Argument-validation aggregation hidden behind one message format
//! - Never raises: every path collapses into an `ExecutionOutcome`
//!
//! Single entry point used by the protocol front-end to run a registered
//! function. The orchestrator owns the deadline race; the executor owns the
//! child process, which `kill_on_drop` reaps when the race is lost.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use serde_json::Value;

use crate::core::function::{ExecutionOutcome, FunctionDefinition};
use crate::executors::ExecutorSet;
use crate::storage::FunctionStore;

pub struct Orchestrator {
    executors: ExecutorSet,
    store: Arc<dyn FunctionStore>,
    default_timeout_ms: u64,
}

impl Orchestrator {
    pub fn new(executors: ExecutorSet, store: Arc<dyn FunctionStore>, default_timeout_ms: u64) -> Self {
        Self {
            executors,
            store,
            default_timeout_ms,
        }
    }

    /// Run a registered function against caller-supplied arguments.
    ///
    /// Always returns an outcome; unexpected internal errors are converted
    /// into `is_error` outcomes rather than propagated.
    pub async fn execute(&self, definition: &FunctionDefinition, args: Value) -> ExecutionOutcome {
        let started = Instant::now();
        match self.run(definition, args, started).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Internal error executing '{}': {:#}", definition.name, e);
                ExecutionOutcome::failure(
                    format!("internal error: {e}"),
                    started.elapsed().as_millis() as u64,
                )
            }
        }
    }

    async fn run(
        &self,
        definition: &FunctionDefinition,
        args: Value,
        started: Instant,
    ) -> Result<ExecutionOutcome> {
        let elapsed_ms = || started.elapsed().as_millis() as u64;

        // 1. Validate arguments, reporting every violation.
        if let Some(message) = validate_arguments(&definition.parameter_schema, &args)? {
            return Ok(ExecutionOutcome::failure(message, elapsed_ms()));
        }

        // 2. Resolve source code through the store.
        let code = self.store.load_code(definition).await?;

        // 3. Select the executor. Unreachable for definitions that passed
        // registration, but surfaced as a configuration error if it happens.
        let executor = self
            .executors
            .get(definition.language)
            .ok_or_else(|| anyhow!("no executor registered for language '{}'", definition.language))?;

        // 4/5. Race execution against the effective timeout.
        let timeout_ms = definition.effective_timeout_ms(self.default_timeout_ms);
        let deadline = Duration::from_millis(timeout_ms);
        let entry_point = definition.entry_point();

        tracing::debug!(
            "Executing '{}' ({}, entry '{}', timeout {}ms)",
            definition.name,
            definition.language,
            entry_point,
            timeout_ms
        );

        let outcome = match tokio::time::timeout(deadline, executor.execute(&code, entry_point, &args)).await
        {
            Ok(Ok(output)) => ExecutionOutcome::success(output, elapsed_ms()),
            Ok(Err(e)) => ExecutionOutcome::failure(e.to_string(), elapsed_ms()),
            // Timer won: the dropped execution future kills the child and
            // removes the harness file on its way out.
            Err(_) => ExecutionOutcome::failure(
                format!("execution timed out after {timeout_ms}ms"),
                elapsed_ms(),
            ),
        };
        Ok(outcome)
    }
}

/// Validate `args` against the parameter schema, returning an aggregated
/// message (one line per violation: instance path + reason) when invalid.
fn validate_arguments(schema: &Value, args: &Value) -> Result<Option<String>> {
    let compiled = jsonschema::JSONSchema::compile(schema)
        .map_err(|e| anyhow!("parameter schema does not compile: {e}"))?;

    let violations: Vec<String> = match compiled.validate(args) {
        Ok(()) => return Ok(None),
        Err(errors) => errors
            .map(|e| {
                let path = e.instance_path.to_string();
                let location = if path.is_empty() { "/".to_string() } else { path };
                format!("{location}: {e}")
            })
            .collect(),
    };
    Ok(Some(format!(
        "invalid arguments:\n{}",
        violations.join("\n")
    )))
}
