//! Language Executors
//!
//! Information Hiding:
//! - Harness templates and temp-file materialization hidden per executor
//! - Child-process mechanics shared through the `process` module
//! - Exit-code/stream interpretation internalized; callers see a JSON value
//!   or a classified error
//!
//! One executor per language family, all implementing [`LanguageExecutor`].
//! Executors do not enforce timeouts; the orchestrator owns the deadline race
//! and relies on `kill_on_drop` to reap a cancelled child.

pub mod bash;
pub mod javascript;
pub mod process;
pub mod python;
pub mod ruby;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::core::function::Language;

pub use bash::BashExecutor;
pub use javascript::JavaScriptExecutor;
pub use python::PythonExecutor;
pub use ruby::RubyExecutor;

/// Failure modes surfaced by an executor.
///
/// Output that fails to parse as JSON is not an error here; it degrades to a
/// plain-text value inside `execute`.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("function '{0}' not found")]
    EntryPointNotFound(String),

    #[error("{0}")]
    Runtime(String),

    #[error("failed to spawn {interpreter}: {message}")]
    SpawnFailed {
        interpreter: String,
        message: String,
    },

    #[error("failed to materialize harness: {0}")]
    Io(#[from] std::io::Error),

    #[error("argument serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Splice user source and the entry-point name into a harness template.
///
/// The entry substitution runs only over the template halves around the
/// user-code slot, so user source containing either marker literally is
/// carried through untouched.
pub(crate) fn render_harness(template: &str, user_code: &str, entry_point: &str) -> String {
    template
        .split("__USER_CODE__")
        .map(|part| part.replace("__ENTRY_POINT__", entry_point))
        .collect::<Vec<_>>()
        .join(user_code)
}

/// A language-specific execution strategy.
///
/// The shared flow lives in the default `execute`/`validate_syntax` methods:
/// wrap user code in the harness, materialize it to a uniquely-named temp
/// file, spawn the interpreter with the JSON argument blob, interpret the
/// captured streams. Implementations only supply the language-specific parts.
#[async_trait]
pub trait LanguageExecutor: Send + Sync {
    /// Canonical language this executor serves.
    fn language(&self) -> Language;

    /// Interpreter binary expected on PATH.
    fn interpreter(&self) -> &str;

    /// Extension given to materialized harness files, with the dot.
    fn file_suffix(&self) -> &'static str;

    /// Wrap user source in the harness program. Pure; unit-testable without
    /// spawning anything.
    fn build_harness(&self, user_code: &str, entry_point: &str) -> String;

    /// Interpreter flags that parse-check a file without running it.
    fn syntax_check_args(&self) -> &'static [&'static str];

    /// Run the wrapped source against a JSON argument object.
    async fn execute(&self, user_code: &str, entry_point: &str, args: &Value) -> Result<Value, ExecutorError> {
        let harness = self.build_harness(user_code, entry_point);
        let file = process::materialize(&harness, self.file_suffix())?;
        let payload = serde_json::to_string(args)?;
        let path = file.path().to_string_lossy().to_string();

        let output = process::run(self.interpreter(), &[path.as_str(), payload.as_str()]).await?;
        // `file` drops here, removing the harness on every exit path.
        process::interpret(&output, entry_point)
    }

    /// Parse-check inline code without executing it. Returns the list of
    /// syntax errors; empty means valid.
    async fn validate_syntax(&self, user_code: &str, entry_point: &str) -> Result<Vec<String>, ExecutorError> {
        let harness = self.build_harness(user_code, entry_point);
        let file = process::materialize(&harness, self.file_suffix())?;
        let path = file.path().to_string_lossy().to_string();

        let mut argv: Vec<&str> = self.syntax_check_args().to_vec();
        argv.push(path.as_str());

        let output = process::run(self.interpreter(), &argv).await?;
        if output.status.success() {
            return Ok(Vec::new());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let errors: Vec<String> = stderr
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        if errors.is_empty() {
            Ok(vec!["syntax check failed".to_string()])
        } else {
            Ok(errors)
        }
    }
}

/// Closed lookup table mapping a language family to its executor.
#[derive(Clone)]
pub struct ExecutorSet {
    executors: HashMap<Language, Arc<dyn LanguageExecutor>>,
}

impl ExecutorSet {
    /// Build the full set of supported executors.
    pub fn with_defaults() -> Self {
        let mut executors: HashMap<Language, Arc<dyn LanguageExecutor>> = HashMap::new();
        executors.insert(Language::Python, Arc::new(PythonExecutor::new()));
        executors.insert(Language::JavaScript, Arc::new(JavaScriptExecutor::new()));
        executors.insert(Language::Bash, Arc::new(BashExecutor::new()));
        executors.insert(Language::Ruby, Arc::new(RubyExecutor::new()));
        Self { executors }
    }

    /// Look up the executor for a language, collapsing aliases
    /// (node/typescript resolve to the JavaScript executor).
    pub fn get(&self, language: Language) -> Option<Arc<dyn LanguageExecutor>> {
        self.executors.get(&language.executor_family()).cloned()
    }
}

impl Default for ExecutorSet {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_set_covers_all_languages() {
        let set = ExecutorSet::with_defaults();
        for lang in [
            Language::Python,
            Language::JavaScript,
            Language::TypeScript,
            Language::Bash,
            Language::Ruby,
            Language::Node,
        ] {
            let executor = set.get(lang).expect("executor registered");
            assert_eq!(executor.language(), lang.executor_family());
        }
    }

    #[test]
    fn test_render_harness_substitutes_template_only() {
        let template = "head __ENTRY_POINT__\n__USER_CODE__\ntail __ENTRY_POINT__";
        let rendered = render_harness(template, "x = '__ENTRY_POINT__'", "run");
        assert_eq!(rendered, "head run\nx = '__ENTRY_POINT__'\ntail run");
    }

    #[test]
    fn test_node_and_javascript_share_executor() {
        let set = ExecutorSet::with_defaults();
        let a = set.get(Language::Node).unwrap();
        let b = set.get(Language::JavaScript).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
