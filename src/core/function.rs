//! Function Data Model
//!
//! Information Hiding:
//! - Wire format (camelCase JSON) hidden behind serde attributes
//! - Language-specific details (extensions, executor family) kept on the enum
//! - Outcome construction rules hidden behind constructors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Default per-invocation timeout when a function does not configure one.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Hard ceiling for a configured timeout (5 minutes).
pub const MAX_TIMEOUT_MS: u64 = 300_000;

/// Default entry point symbol invoked inside user code.
pub const DEFAULT_ENTRY_POINT: &str = "main";

/// Supported scripting languages.
///
/// `node` is an alias accepted on the wire; it shares executor behavior with
/// `javascript`. TypeScript sources are expected to be pre-transpiled (or
/// type-strippable) and also run under the JavaScript executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Bash,
    Ruby,
    Node,
}

impl Language {
    /// File extensions accepted for file-based registrations of this language.
    pub fn valid_extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py"],
            Language::JavaScript | Language::Node => &["js", "mjs", "cjs"],
            Language::TypeScript => &["ts", "mts", "cts"],
            Language::Bash => &["sh", "bash"],
            Language::Ruby => &["rb"],
        }
    }

    /// Canonical language whose executor handles this language.
    ///
    /// `node` and `typescript` collapse onto the JavaScript executor.
    pub fn executor_family(&self) -> Language {
        match self {
            Language::Node | Language::TypeScript => Language::JavaScript,
            other => *other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Bash => "bash",
            Language::Ruby => "ruby",
            Language::Node => "node",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registration request as submitted by a caller.
///
/// Exactly one of `inline_code` / `code_path` must be set; the validator
/// enforces this before anything is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,
    pub parameter_schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl FunctionSpec {
    /// Entry point symbol, defaulting to `main`.
    pub fn entry_point(&self) -> &str {
        self.entry_point.as_deref().unwrap_or(DEFAULT_ENTRY_POINT)
    }

    /// Whether the caller declared a custom (non-default) entry point.
    pub fn has_custom_entry_point(&self) -> bool {
        self.entry_point
            .as_deref()
            .map(|e| e != DEFAULT_ENTRY_POINT)
            .unwrap_or(false)
    }
}

/// A validated, persisted function definition.
///
/// For file-based functions `code_path` holds the managed-relative path
/// assigned by the store, never the caller's original path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,
    pub parameter_schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FunctionDefinition {
    /// Entry point symbol, defaulting to `main`.
    pub fn entry_point(&self) -> &str {
        self.entry_point.as_deref().unwrap_or(DEFAULT_ENTRY_POINT)
    }

    pub fn is_file_based(&self) -> bool {
        self.code_path.is_some()
    }

    /// Configured timeout, clamped to the system default when absent.
    pub fn effective_timeout_ms(&self, default_ms: u64) -> u64 {
        self.timeout_ms.unwrap_or(default_ms)
    }
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// The structured result of one invocation.
///
/// Always returned as a value; never both `output` and `error` at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_error: bool,
    pub execution_time_ms: u64,
}

impl ExecutionOutcome {
    pub fn success(output: Value, execution_time_ms: u64) -> Self {
        Self {
            output: Some(output),
            error: None,
            is_error: false,
            execution_time_ms,
        }
    }

    pub fn failure(error: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            output: None,
            error: Some(error.into()),
            is_error: true,
            execution_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_language_wire_names() {
        let lang: Language = serde_json::from_str("\"python\"").unwrap();
        assert_eq!(lang, Language::Python);
        let lang: Language = serde_json::from_str("\"node\"").unwrap();
        assert_eq!(lang, Language::Node);
        assert_eq!(serde_json::to_string(&Language::Bash).unwrap(), "\"bash\"");
    }

    #[test]
    fn test_executor_family_collapses_aliases() {
        assert_eq!(Language::Node.executor_family(), Language::JavaScript);
        assert_eq!(Language::TypeScript.executor_family(), Language::JavaScript);
        assert_eq!(Language::Python.executor_family(), Language::Python);
    }

    #[test]
    fn test_spec_entry_point_default() {
        let spec: FunctionSpec = serde_json::from_value(json!({
            "name": "add",
            "description": "Adds numbers",
            "language": "python",
            "inlineCode": "def main():\n    return 1",
            "parameterSchema": {"type": "object", "properties": {}}
        }))
        .unwrap();
        assert_eq!(spec.entry_point(), "main");
        assert!(!spec.has_custom_entry_point());
    }

    #[test]
    fn test_outcome_success_serialization_omits_error_fields() {
        let outcome = ExecutionOutcome::success(json!(8), 12);
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["output"], json!(8));
        assert!(value.get("error").is_none());
        assert!(value.get("isError").is_none());
        assert_eq!(value["executionTimeMs"], json!(12));
    }

    #[test]
    fn test_outcome_failure_sets_flag() {
        let outcome = ExecutionOutcome::failure("boom", 5);
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["isError"], json!(true));
        assert_eq!(value["error"], json!("boom"));
        assert!(value.get("output").is_none());
    }
}
