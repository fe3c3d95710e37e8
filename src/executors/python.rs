//! Python executor.
//!
//! The harness calls the entry point with the JSON object's keys as keyword
//! arguments and awaits coroutine results via `asyncio.run`. Syntax checking
//! compiles the wrapped source to bytecode without executing it.

use async_trait::async_trait;

use super::LanguageExecutor;
use crate::core::function::Language;

const HARNESS_TEMPLATE: &str = r#"import asyncio
import inspect
import json
import sys

__USER_CODE__

def _toolsmith_invoke():
    raw = sys.argv[1] if len(sys.argv) > 1 else sys.stdin.read()
    kwargs = json.loads(raw) if raw and raw.strip() else {}
    fn = globals().get("__ENTRY_POINT__")
    if not callable(fn):
        sys.stderr.write(json.dumps({"error": "function '__ENTRY_POINT__' not found", "code": "entry_point"}))
        sys.exit(1)
    result = fn(**kwargs)
    if inspect.isawaitable(result):
        result = asyncio.run(result)
    sys.stdout.write(json.dumps(result))

if __name__ == "__main__":
    try:
        _toolsmith_invoke()
    except Exception as exc:
        sys.stderr.write(json.dumps({"error": str(exc)}))
        sys.exit(1)
"#;

pub struct PythonExecutor {
    interpreter: String,
}

impl PythonExecutor {
    pub fn new() -> Self {
        Self {
            interpreter: "python3".to_string(),
        }
    }

    pub fn with_interpreter(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl Default for PythonExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageExecutor for PythonExecutor {
    fn language(&self) -> Language {
        Language::Python
    }

    fn interpreter(&self) -> &str {
        &self.interpreter
    }

    fn file_suffix(&self) -> &'static str {
        ".py"
    }

    fn build_harness(&self, user_code: &str, entry_point: &str) -> String {
        super::render_harness(HARNESS_TEMPLATE, user_code, entry_point)
    }

    fn syntax_check_args(&self) -> &'static [&'static str] {
        &["-m", "py_compile"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::process::interpreter_available;
    use serde_json::json;

    #[test]
    fn test_harness_embeds_code_and_entry() {
        let executor = PythonExecutor::new();
        let harness = executor.build_harness("def add(a, b):\n    return a + b", "add");
        assert!(harness.contains("def add(a, b):"));
        assert!(harness.contains("globals().get(\"add\")"));
        assert!(harness.contains("function 'add' not found"));
        assert!(!harness.contains("__ENTRY_POINT__"));
        assert!(!harness.contains("__USER_CODE__"));
    }

    #[test]
    fn test_harness_preserves_marker_text_inside_user_code() {
        let executor = PythonExecutor::new();
        let harness = executor.build_harness(
            "def main():\n    return '__ENTRY_POINT__ and __USER_CODE__'",
            "main",
        );
        assert!(harness.contains("return '__ENTRY_POINT__ and __USER_CODE__'"));
    }

    #[tokio::test]
    async fn test_execute_addition() {
        let executor = PythonExecutor::new();
        if !interpreter_available(executor.interpreter()).await {
            return;
        }
        let value = executor
            .execute(
                "def main(a, b):\n    return a + b",
                "main",
                &json!({"a": 5, "b": 3}),
            )
            .await
            .unwrap();
        assert_eq!(value, json!(8));
    }

    #[tokio::test]
    async fn test_execute_async_entry_point() {
        let executor = PythonExecutor::new();
        if !interpreter_available(executor.interpreter()).await {
            return;
        }
        let value = executor
            .execute(
                "async def main(x):\n    return x * 2",
                "main",
                &json!({"x": 21}),
            )
            .await
            .unwrap();
        assert_eq!(value, json!(42));
    }

    #[tokio::test]
    async fn test_execute_runtime_error_surfaces_message() {
        let executor = PythonExecutor::new();
        if !interpreter_available(executor.interpreter()).await {
            return;
        }
        let err = executor
            .execute(
                "def main():\n    raise ValueError('boom')",
                "main",
                &json!({}),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_execute_missing_entry_point() {
        let executor = PythonExecutor::new();
        if !interpreter_available(executor.interpreter()).await {
            return;
        }
        let err = executor
            .execute("def helper():\n    return 1", "main", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::executors::ExecutorError::EntryPointNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_user_exception_with_lookup_wording_is_runtime_error() {
        let executor = PythonExecutor::new();
        if !interpreter_available(executor.interpreter()).await {
            return;
        }
        let err = executor
            .execute(
                "def main():\n    raise RuntimeError(\"function 'main' not found\")",
                "main",
                &json!({}),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::executors::ExecutorError::Runtime(_)
        ));
    }

    #[tokio::test]
    async fn test_validate_syntax_rejects_bad_code() {
        let executor = PythonExecutor::new();
        if !interpreter_available(executor.interpreter()).await {
            return;
        }
        let errors = executor
            .validate_syntax("def main(:\n    pass", "main")
            .await
            .unwrap();
        assert!(!errors.is_empty());
    }

    #[tokio::test]
    async fn test_validate_syntax_accepts_good_code() {
        let executor = PythonExecutor::new();
        if !interpreter_available(executor.interpreter()).await {
            return;
        }
        let errors = executor
            .validate_syntax("def main():\n    return 1", "main")
            .await
            .unwrap();
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }
}
