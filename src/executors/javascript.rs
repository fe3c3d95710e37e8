//! JavaScript/Node executor.
//!
//! Also serves TypeScript registrations: the contract requires TS sources to
//! be pre-transpiled (or type-strippable) before execution, so only the
//! registration-time extension sets differ.
//!
//! Entry-point resolution probes, in order: a bare function with the entry
//! name, `module.exports.<entry>`, then a default function export. Promise
//! return values are awaited before serialization.

use async_trait::async_trait;

use super::LanguageExecutor;
use crate::core::function::Language;

const HARNESS_TEMPLATE: &str = r#"__USER_CODE__

(async () => {
  const raw = process.argv.length > 2 ? process.argv[2] : require("fs").readFileSync(0, "utf8");
  const args = raw && raw.trim() ? JSON.parse(raw) : {};

  let fn;
  try { fn = __ENTRY_POINT__; } catch (_) { fn = undefined; }
  if (typeof fn !== "function" && typeof module !== "undefined" && module.exports) {
    if (typeof module.exports.__ENTRY_POINT__ === "function") {
      fn = module.exports.__ENTRY_POINT__;
    } else if (typeof module.exports === "function") {
      fn = module.exports;
    }
  }
  if (typeof fn !== "function") {
    process.stderr.write(JSON.stringify({ error: "function '__ENTRY_POINT__' not found", code: "entry_point" }));
    process.exit(1);
  }

  let result = fn(args);
  if (result && typeof result.then === "function") {
    result = await result;
  }
  process.stdout.write(JSON.stringify(result === undefined ? null : result));
})().catch((err) => {
  const message = err && err.message ? err.message : String(err);
  process.stderr.write(JSON.stringify({ error: message }));
  process.exit(1);
});
"#;

pub struct JavaScriptExecutor {
    interpreter: String,
}

impl JavaScriptExecutor {
    pub fn new() -> Self {
        Self {
            interpreter: "node".to_string(),
        }
    }

    pub fn with_interpreter(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl Default for JavaScriptExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageExecutor for JavaScriptExecutor {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn interpreter(&self) -> &str {
        &self.interpreter
    }

    fn file_suffix(&self) -> &'static str {
        ".js"
    }

    fn build_harness(&self, user_code: &str, entry_point: &str) -> String {
        super::render_harness(HARNESS_TEMPLATE, user_code, entry_point)
    }

    fn syntax_check_args(&self) -> &'static [&'static str] {
        &["--check"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::process::interpreter_available;
    use serde_json::json;

    #[test]
    fn test_harness_probes_exports() {
        let executor = JavaScriptExecutor::new();
        let harness = executor.build_harness("function run(args) { return args; }", "run");
        assert!(harness.contains("function run(args)"));
        assert!(harness.contains("module.exports.run"));
        assert!(harness.contains("function 'run' not found"));
    }

    #[tokio::test]
    async fn test_execute_bare_function() {
        let executor = JavaScriptExecutor::new();
        if !interpreter_available(executor.interpreter()).await {
            return;
        }
        let value = executor
            .execute(
                "function main(args) { return args.a + args.b; }",
                "main",
                &json!({"a": 5, "b": 3}),
            )
            .await
            .unwrap();
        assert_eq!(value, json!(8));
    }

    #[tokio::test]
    async fn test_execute_commonjs_export() {
        let executor = JavaScriptExecutor::new();
        if !interpreter_available(executor.interpreter()).await {
            return;
        }
        let value = executor
            .execute(
                "module.exports.greet = (args) => `hi ${args.name}`;",
                "greet",
                &json!({"name": "ada"}),
            )
            .await
            .unwrap();
        assert_eq!(value, json!("hi ada"));
    }

    #[tokio::test]
    async fn test_execute_async_function() {
        let executor = JavaScriptExecutor::new();
        if !interpreter_available(executor.interpreter()).await {
            return;
        }
        let value = executor
            .execute(
                "async function main(args) { return args.x * 2; }",
                "main",
                &json!({"x": 21}),
            )
            .await
            .unwrap();
        assert_eq!(value, json!(42));
    }

    #[tokio::test]
    async fn test_execute_thrown_error() {
        let executor = JavaScriptExecutor::new();
        if !interpreter_available(executor.interpreter()).await {
            return;
        }
        let err = executor
            .execute(
                "function main() { throw new Error('kaput'); }",
                "main",
                &json!({}),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("kaput"));
    }

    #[tokio::test]
    async fn test_validate_syntax_rejects_bad_code() {
        let executor = JavaScriptExecutor::new();
        if !interpreter_available(executor.interpreter()).await {
            return;
        }
        let errors = executor
            .validate_syntax("function main( {", "main")
            .await
            .unwrap();
        assert!(!errors.is_empty());
    }
}
