//! Bash executor.
//!
//! The harness calls a shell function matching the entry-point name with the
//! JSON-encoded argument blob as its single positional parameter. The
//! function prints JSON (or plain text) on stdout; non-JSON output is carried
//! through as text by the shared interpreter of process output.

use async_trait::async_trait;

use super::LanguageExecutor;
use crate::core::function::Language;

const HARNESS_TEMPLATE: &str = r#"#!/usr/bin/env bash

__USER_CODE__

__toolsmith_args="${1:-}"
if ! declare -F "__ENTRY_POINT__" > /dev/null 2>&1; then
  echo "{\"error\":\"function '__ENTRY_POINT__' not found\",\"code\":\"entry_point\"}" >&2
  exit 1
fi
__ENTRY_POINT__ "$__toolsmith_args"
"#;

pub struct BashExecutor {
    interpreter: String,
}

impl BashExecutor {
    pub fn new() -> Self {
        Self {
            interpreter: "bash".to_string(),
        }
    }

    pub fn with_interpreter(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl Default for BashExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageExecutor for BashExecutor {
    fn language(&self) -> Language {
        Language::Bash
    }

    fn interpreter(&self) -> &str {
        &self.interpreter
    }

    fn file_suffix(&self) -> &'static str {
        ".sh"
    }

    fn build_harness(&self, user_code: &str, entry_point: &str) -> String {
        super::render_harness(HARNESS_TEMPLATE, user_code, entry_point)
    }

    fn syntax_check_args(&self) -> &'static [&'static str] {
        &["-n"]
    }
}
