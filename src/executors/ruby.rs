//! Ruby executor.
//!
//! The harness parses the JSON argument object with symbolized keys and calls
//! the entry-point method with keyword arguments. Top-level `def` methods are
//! private on Object, so presence is probed with `respond_to?(..., true)`.

use async_trait::async_trait;

use super::LanguageExecutor;
use crate::core::function::Language;

const HARNESS_TEMPLATE: &str = r#"require "json"

__USER_CODE__

begin
  raw = ARGV[0] || $stdin.read
  args = raw.to_s.strip.empty? ? {} : JSON.parse(raw, symbolize_names: true)
  unless respond_to?(:__ENTRY_POINT__, true)
    $stderr.write(JSON.generate({ "error" => "function '__ENTRY_POINT__' not found", "code" => "entry_point" }))
    exit 1
  end
  result = args.empty? ? __ENTRY_POINT__ : __ENTRY_POINT__(**args)
  $stdout.write(JSON.generate(result))
rescue => e
  $stderr.write(JSON.generate({ "error" => e.message }))
  exit 1
end
"#;

pub struct RubyExecutor {
    interpreter: String,
}

impl RubyExecutor {
    pub fn new() -> Self {
        Self {
            interpreter: "ruby".to_string(),
        }
    }

    pub fn with_interpreter(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl Default for RubyExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageExecutor for RubyExecutor {
    fn language(&self) -> Language {
        Language::Ruby
    }

    fn interpreter(&self) -> &str {
        &self.interpreter
    }

    fn file_suffix(&self) -> &'static str {
        ".rb"
    }

    fn build_harness(&self, user_code: &str, entry_point: &str) -> String {
        super::render_harness(HARNESS_TEMPLATE, user_code, entry_point)
    }

    fn syntax_check_args(&self) -> &'static [&'static str] {
        &["-c"]
    }
}
