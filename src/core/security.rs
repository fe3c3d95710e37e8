//! Security Validator
//!
//! Information Hiding:
//! - Deny-list contents and pattern table hidden behind the validator
//! - Filesystem probing details (stat flavor, resolution order) internalized
//! - Callers only see the first failing check, never later ones
//!
//! The validator is a static, pre-execution gate for file-based
//! registrations. It is deliberately blunt: the pattern scan is textual and
//! false-positive-tolerant, and the entry-point check is a surface heuristic,
//! not a parser. Both are part of the contract and must stay approximate.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::function::Language;

/// Maximum size accepted for a file-based function source (10 MiB).
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Error produced by the security gate. One variant per check so callers can
/// distinguish rejection categories.
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("path contains a parent-directory segment: {0}")]
    PathTraversal(String),

    #[error("cannot read file: {0}")]
    Unreadable(String),

    #[error("symbolic links are not allowed: {0}")]
    SymlinkRejected(String),

    #[error("not a regular file: {0}")]
    NotRegularFile(String),

    #[error("file is {size} bytes, exceeding the {max} byte limit")]
    FileTooLarge { size: u64, max: u64 },

    #[error("path is under a blocked directory: {0}")]
    BlockedPath(String),

    #[error("invalid extension for {language}: expected one of {expected:?}")]
    InvalidExtension {
        language: Language,
        expected: Vec<String>,
    },

    #[error("file is empty")]
    EmptyFile,

    #[error("dangerous pattern detected: {category}")]
    DangerousPattern { category: String },

    #[error("no recognizable '{entry}' entry point found for {language}")]
    MissingEntryPoint { entry: String, language: Language },
}

/// A named regex in the suspicious-content table.
#[derive(Debug, Clone)]
pub struct SuspiciousPattern {
    pub category: &'static str,
    pub regex: Regex,
}

impl SuspiciousPattern {
    fn new(category: &'static str, pattern: &str) -> Self {
        Self {
            category,
            // Patterns are compile-time constants; a bad one is a programming
            // error caught by the table test below.
            regex: Regex::new(pattern).unwrap_or_else(|e| panic!("bad pattern {category}: {e}")),
        }
    }
}

static DEFAULT_PATTERNS: Lazy<Vec<SuspiciousPattern>> = Lazy::new(|| {
    vec![
        SuspiciousPattern::new("dynamic eval", r"\beval\s*\("),
        SuspiciousPattern::new("dynamic exec", r"\bexec\s*\("),
        SuspiciousPattern::new("dynamic import", r"__import__"),
        SuspiciousPattern::new("non-literal require", r#"require\s*\(\s*[^'")\s]"#),
        SuspiciousPattern::new("recursive filesystem delete", r"rm\s+-rf\s+/"),
        SuspiciousPattern::new("world-writable chmod", r"chmod\s+777"),
        SuspiciousPattern::new("piped remote shell", r"(curl|wget)[^\n|]*\|\s*(ba)?sh"),
        SuspiciousPattern::new("os.system call", r"os\.system"),
        SuspiciousPattern::new(
            "subprocess with shell=True",
            r"subprocess\.[A-Za-z_]+\s*\([^)]*shell\s*=\s*True",
        ),
        SuspiciousPattern::new("child_process.exec", r"child_process\.exec\s*\("),
    ]
});

/// Surface patterns recognizing a default `main` entry point per language.
/// Only consulted when no custom entry point was declared.
static PY_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(async\s+)?def\s+main\s*\(").unwrap());
static JS_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)(function\s+main\s*\(|(const|let|var)\s+main\s*=|exports\.main\s*=|module\.exports\.main\s*=)",
    )
    .unwrap()
});
static BASH_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(main\s*\(\)\s*\{|function\s+main\b)").unwrap());
static RUBY_ENTRY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*def\s+main\b").unwrap());

/// Directories whose contents are never acceptable as function source.
const BLOCKED_SYSTEM_DIRS: &[&str] = &[
    "/etc",
    "/usr/bin",
    "/usr/sbin",
    "/bin",
    "/sbin",
    "C:\\Windows",
    "C:\\Program Files",
];

/// Dot-directories under the user's home that hold credentials or secrets.
const BLOCKED_HOME_DIRS: &[&str] = &[".ssh", ".aws", ".config", ".gnupg", ".docker"];

/// Pre-execution gatekeeper for file-based function registrations.
pub struct SecurityValidator {
    patterns: Vec<SuspiciousPattern>,
}

impl SecurityValidator {
    /// Build a validator with an explicit pattern table.
    pub fn new(patterns: Vec<SuspiciousPattern>) -> Self {
        Self { patterns }
    }

    /// Build a validator with the default suspicious-pattern table.
    pub fn with_default_patterns() -> Self {
        Self::new(DEFAULT_PATTERNS.clone())
    }

    /// Run all checks against a candidate source file, in order, stopping at
    /// the first failure.
    ///
    /// `custom_entry_point` disables the default entry-point heuristic, which
    /// only recognizes `main`.
    pub async fn validate_file_path(
        &self,
        raw_path: &str,
        language: Language,
        custom_entry_point: bool,
    ) -> Result<(), SecurityError> {
        // 1. Traversal: a textual check against the literal path string,
        // before any resolution.
        if raw_path.contains("../") || raw_path.contains("..\\") {
            return Err(SecurityError::PathTraversal(raw_path.to_string()));
        }

        let path = Path::new(raw_path);

        // 2. Existence/readability. symlink_metadata doubles as the
        // link-aware stat for the next check.
        let meta = tokio::fs::symlink_metadata(path)
            .await
            .map_err(|e| SecurityError::Unreadable(format!("{raw_path}: {e}")))?;

        // 3. Symlink rejection: never follow the link to decide safety.
        if meta.file_type().is_symlink() {
            return Err(SecurityError::SymlinkRejected(raw_path.to_string()));
        }

        // 4. Regular file only.
        if !meta.is_file() {
            return Err(SecurityError::NotRegularFile(raw_path.to_string()));
        }

        // 5. Size limit.
        if meta.len() > MAX_FILE_SIZE {
            return Err(SecurityError::FileTooLarge {
                size: meta.len(),
                max: MAX_FILE_SIZE,
            });
        }

        // 6. Blocked-path check against the resolved absolute path.
        let resolved = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| SecurityError::Unreadable(format!("{raw_path}: {e}")))?;
        if let Some(blocked) = blocked_prefix(&resolved) {
            return Err(SecurityError::BlockedPath(blocked));
        }

        // 7. Extension must match the declared language.
        let ext = resolved
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        let expected = language.valid_extensions();
        if !expected.contains(&ext.as_str()) {
            return Err(SecurityError::InvalidExtension {
                language,
                expected: expected.iter().map(|s| s.to_string()).collect(),
            });
        }

        // 8. Content scan.
        let content = tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|e| SecurityError::Unreadable(format!("{raw_path}: {e}")))?;
        self.scan_content(&content)?;

        // 9. Default entry-point presence heuristic.
        if !custom_entry_point && !has_default_entry_point(language, &content) {
            return Err(SecurityError::MissingEntryPoint {
                entry: crate::core::function::DEFAULT_ENTRY_POINT.to_string(),
                language,
            });
        }

        Ok(())
    }

    /// Reject empty content and scan for dangerous textual patterns.
    /// Case-sensitive by design.
    pub fn scan_content(&self, content: &str) -> Result<(), SecurityError> {
        if content.trim().is_empty() {
            return Err(SecurityError::EmptyFile);
        }
        for pattern in &self.patterns {
            if pattern.regex.is_match(content) {
                return Err(SecurityError::DangerousPattern {
                    category: pattern.category.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// If `path` lies under a deny-listed directory, return that directory.
fn blocked_prefix(path: &Path) -> Option<String> {
    for dir in BLOCKED_SYSTEM_DIRS {
        if path.starts_with(dir) {
            return Some(dir.to_string());
        }
    }
    if let Some(home) = dirs::home_dir() {
        for dot in BLOCKED_HOME_DIRS {
            let candidate: PathBuf = home.join(dot);
            if path.starts_with(&candidate) {
                return Some(candidate.display().to_string());
            }
        }
    }
    None
}

/// Surface check for a default `main` declaration. Known-approximate: it can
/// match inside comments or strings, and can miss unusual formatting.
fn has_default_entry_point(language: Language, content: &str) -> bool {
    match language.executor_family() {
        Language::Python => PY_ENTRY.is_match(content),
        Language::JavaScript => JS_ENTRY.is_match(content),
        Language::Bash => BASH_ENTRY.is_match(content),
        Language::Ruby => RUBY_ENTRY.is_match(content),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> String {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path.to_string_lossy().to_string()
    }

    const PY_OK: &str = "def main(a, b):\n    return a + b\n";

    #[tokio::test]
    async fn test_rejects_traversal_before_io() {
        let validator = SecurityValidator::with_default_patterns();
        let err = validator
            .validate_file_path("../../etc/passwd", Language::Python, false)
            .await
            .unwrap_err();
        assert!(matches!(err, SecurityError::PathTraversal(_)));
    }

    #[tokio::test]
    async fn test_rejects_missing_file() {
        let validator = SecurityValidator::with_default_patterns();
        let err = validator
            .validate_file_path("/nonexistent/fn.py", Language::Python, false)
            .await
            .unwrap_err();
        assert!(matches!(err, SecurityError::Unreadable(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rejects_symlink() {
        let dir = TempDir::new().unwrap();
        let target = write_file(&dir, "real.py", PY_OK);
        let link = dir.path().join("link.py");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let validator = SecurityValidator::with_default_patterns();
        let err = validator
            .validate_file_path(&link.to_string_lossy(), Language::Python, false)
            .await
            .unwrap_err();
        assert!(matches!(err, SecurityError::SymlinkRejected(_)));
    }

    #[tokio::test]
    async fn test_rejects_directory() {
        let dir = TempDir::new().unwrap();
        let validator = SecurityValidator::with_default_patterns();
        let err = validator
            .validate_file_path(&dir.path().to_string_lossy(), Language::Python, false)
            .await
            .unwrap_err();
        assert!(matches!(err, SecurityError::NotRegularFile(_)));
    }

    #[tokio::test]
    async fn test_rejects_oversized_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.py");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_FILE_SIZE + 1).unwrap();

        let validator = SecurityValidator::with_default_patterns();
        let err = validator
            .validate_file_path(&path.to_string_lossy(), Language::Python, false)
            .await
            .unwrap_err();
        assert!(matches!(err, SecurityError::FileTooLarge { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rejects_blocked_system_path() {
        let validator = SecurityValidator::with_default_patterns();
        let err = validator
            .validate_file_path("/etc/hostname", Language::Bash, false)
            .await
            .unwrap_err();
        assert!(matches!(err, SecurityError::BlockedPath(_)), "{err}");
    }

    #[tokio::test]
    async fn test_rejects_wrong_extension() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "fn.rb", PY_OK);
        let validator = SecurityValidator::with_default_patterns();
        let err = validator
            .validate_file_path(&path, Language::Python, false)
            .await
            .unwrap_err();
        match err {
            SecurityError::InvalidExtension { expected, .. } => {
                assert_eq!(expected, vec!["py".to_string()]);
            }
            other => panic!("expected InvalidExtension, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_rejects_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "fn.py", "   \n\t\n");
        let validator = SecurityValidator::with_default_patterns();
        let err = validator
            .validate_file_path(&path, Language::Python, false)
            .await
            .unwrap_err();
        assert!(matches!(err, SecurityError::EmptyFile));
    }

    #[tokio::test]
    async fn test_rejects_eval_pattern() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "fn.py", "def main():\n    return eval('1+1')\n");
        let validator = SecurityValidator::with_default_patterns();
        let err = validator
            .validate_file_path(&path, Language::Python, false)
            .await
            .unwrap_err();
        match err {
            SecurityError::DangerousPattern { category } => {
                assert_eq!(category, "dynamic eval");
            }
            other => panic!("expected DangerousPattern, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_accepts_clean_python_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "fn.py", PY_OK);
        let validator = SecurityValidator::with_default_patterns();
        validator
            .validate_file_path(&path, Language::Python, false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_entry_point_heuristic() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "fn.py", "def helper():\n    return 1\n");
        let validator = SecurityValidator::with_default_patterns();
        let err = validator
            .validate_file_path(&path, Language::Python, false)
            .await
            .unwrap_err();
        assert!(matches!(err, SecurityError::MissingEntryPoint { .. }));
    }

    #[tokio::test]
    async fn test_custom_entry_point_skips_heuristic() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "fn.py", "def helper():\n    return 1\n");
        let validator = SecurityValidator::with_default_patterns();
        validator
            .validate_file_path(&path, Language::Python, true)
            .await
            .unwrap();
    }

    #[test]
    fn test_default_pattern_table_compiles() {
        assert!(!DEFAULT_PATTERNS.is_empty());
    }

    #[test]
    fn test_scan_is_case_sensitive() {
        let validator = SecurityValidator::with_default_patterns();
        // Uppercase EVAL is not in the table; the scan is case-sensitive.
        assert!(validator.scan_content("EVAL('x')").is_ok());
        assert!(validator.scan_content("eval('x')").is_err());
    }

    #[test]
    fn test_exec_sync_not_flagged() {
        let validator = SecurityValidator::with_default_patterns();
        assert!(validator
            .scan_content("const { execSync } = require('node:child_process'); child_process.execSync('ls')")
            .is_ok());
        assert!(validator.scan_content("child_process.exec('ls')").is_err());
    }

    #[test]
    fn test_entry_point_patterns() {
        assert!(has_default_entry_point(Language::Python, "async def main(x):"));
        assert!(has_default_entry_point(Language::JavaScript, "const main = async () => 1"));
        assert!(has_default_entry_point(Language::JavaScript, "module.exports.main = fn"));
        assert!(has_default_entry_point(Language::Bash, "main() {\n  echo hi\n}"));
        assert!(has_default_entry_point(Language::Bash, "function main\n{\n:\n}"));
        assert!(has_default_entry_point(Language::Ruby, "def main(a:)\n  a\nend"));
        assert!(!has_default_entry_point(Language::Python, "def other():"));
    }
}
