//! Function Validator
//!
//! Information Hiding:
//! - Check ordering and identifier rules internalized
//! - Schema engine choice hidden from callers
//!
//! Registration-time structural/policy gate, complementary to the security
//! gate in `security.rs` (which runs first for file-based functions). Checks
//! run in a fixed order and the first failure is returned.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use thiserror::Error;

use crate::core::function::{FunctionSpec, Language, MAX_TIMEOUT_MS};
use crate::executors::ExecutorSet;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap());

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("function name must be a non-empty identifier ([A-Za-z][A-Za-z0-9_]*), got '{0}'")]
    InvalidName(String),

    #[error("description must not be empty")]
    EmptyDescription,

    #[error("exactly one of inlineCode and codePath must be provided; both were")]
    BothSources,

    #[error("exactly one of inlineCode and codePath must be provided; neither was")]
    NoSource,

    #[error("invalid extension for {language}: expected one of {expected:?}")]
    InvalidExtension {
        language: Language,
        expected: Vec<String>,
    },

    #[error("parameterSchema must be an object schema (\"type\": \"object\")")]
    SchemaNotObject,

    #[error("parameterSchema does not compile: {0}")]
    SchemaInvalid(String),

    #[error("no executor registered for language '{0}'")]
    UnsupportedLanguage(Language),

    #[error("syntax error in inline code: {0}")]
    Syntax(String),

    #[error("syntax check could not run: {0}")]
    SyntaxCheckUnavailable(String),

    #[error("timeoutMs must be in (0, {max}], got {value}")]
    InvalidTimeout { value: u64, max: u64 },

    #[error("entryPoint must be an identifier ([A-Za-z][A-Za-z0-9_]*), got '{0}'")]
    InvalidEntryPoint(String),
}

/// Accept/reject a [`FunctionSpec`] before persistence.
pub struct FunctionValidator {
    executors: ExecutorSet,
    max_timeout_ms: u64,
}

impl FunctionValidator {
    /// `max_timeout_ms` is the operator-configured ceiling for `timeoutMs`
    /// ([`MAX_TIMEOUT_MS`] when unconfigured).
    pub fn new(executors: ExecutorSet, max_timeout_ms: u64) -> Self {
        Self {
            executors,
            max_timeout_ms,
        }
    }

    /// Run all registration checks in order; first failure wins.
    pub async fn validate(&self, spec: &FunctionSpec) -> Result<(), ValidationError> {
        // 1. Name.
        if !IDENTIFIER.is_match(&spec.name) {
            return Err(ValidationError::InvalidName(spec.name.clone()));
        }

        // 2. Description.
        if spec.description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription);
        }

        // 3. Language membership is enforced by the enum at deserialization.

        // 4. Exactly one source, with both/neither distinguished.
        match (&spec.inline_code, &spec.code_path) {
            (Some(_), Some(_)) => return Err(ValidationError::BothSources),
            (None, None) => return Err(ValidationError::NoSource),
            _ => {}
        }

        // 5. File extension matches the declared language.
        if let Some(code_path) = &spec.code_path {
            let ext = Path::new(code_path)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_lowercase();
            let expected = spec.language.valid_extensions();
            if !expected.contains(&ext.as_str()) {
                return Err(ValidationError::InvalidExtension {
                    language: spec.language,
                    expected: expected.iter().map(|s| s.to_string()).collect(),
                });
            }
        }

        // 6. Parameter schema is an object schema and compiles.
        let schema_type = spec
            .parameter_schema
            .get("type")
            .and_then(|t| t.as_str());
        if schema_type != Some("object") {
            return Err(ValidationError::SchemaNotObject);
        }
        jsonschema::JSONSchema::compile(&spec.parameter_schema)
            .map_err(|e| ValidationError::SchemaInvalid(e.to_string()))?;

        // Custom entry points are interpolated into harness templates, so
        // they must be plain identifiers before any harness is built.
        if let Some(entry) = &spec.entry_point {
            if !IDENTIFIER.is_match(entry) {
                return Err(ValidationError::InvalidEntryPoint(entry.clone()));
            }
        }

        // 7. Inline code must pass the executor's syntax check.
        if let Some(inline) = &spec.inline_code {
            let executor = self
                .executors
                .get(spec.language)
                .ok_or(ValidationError::UnsupportedLanguage(spec.language))?;
            let errors = executor
                .validate_syntax(inline, spec.entry_point())
                .await
                .map_err(|e| ValidationError::SyntaxCheckUnavailable(e.to_string()))?;
            if !errors.is_empty() {
                return Err(ValidationError::Syntax(errors.join("; ")));
            }
        }

        // 8. Timeout bounds against the configured ceiling.
        if let Some(timeout_ms) = spec.timeout_ms {
            if timeout_ms == 0 || timeout_ms > self.max_timeout_ms {
                return Err(ValidationError::InvalidTimeout {
                    value: timeout_ms,
                    max: self.max_timeout_ms,
                });
            }
        }

        Ok(())
    }
}
