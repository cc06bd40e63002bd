//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce the rules every
//! seqflow operator depends on:
//! - No thread-blocking sleeps in production code
//! - No blocking I/O inside async contexts
//! - Timing code reads tokio's clock, never the wall clock
//!
//! The helpers below walk the production source trees and classify each
//! line. They are line-based heuristics, not a parser: they know about
//! `#[cfg(test)]` modules, comments, function signatures, and the async
//! block forms used in this workspace.

use std::fs;
use std::path::{Path, PathBuf};

/// A single production source line
#[derive(Debug, Clone)]
pub struct SourceLine {
    /// File the line came from
    pub path: PathBuf,
    /// 1-based line number
    pub number: usize,
    /// The line with any `//` comment stripped
    pub code: String,
    /// Whether the line runs inside an async fn or async block
    pub in_async: bool,
}

impl SourceLine {
    /// Format a violation report for this line
    #[must_use]
    pub fn report(&self, what: &str) -> String {
        format!(
            "{}:{} - {}: {}",
            self.path.display(),
            self.number,
            what,
            self.code.trim()
        )
    }
}

/// Workspace root, two levels above this package
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

/// Production source directories subject to enforcement
#[must_use]
pub fn production_dirs() -> Vec<PathBuf> {
    let root = workspace_root();
    vec![
        root.join("seqflow").join("core").join("src"),
        root.join("seqflow").join("cli").join("src"),
    ]
}

/// Every production line under `dir`, with test modules and comments removed
///
/// # Panics
///
/// Panics if `dir` does not exist, so a moved tree cannot silently pass.
#[must_use]
pub fn production_lines(dir: &Path) -> Vec<SourceLine> {
    assert!(dir.exists(), "source directory {} is missing", dir.display());

    let mut out = Vec::new();
    for entry in walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("rs") {
            continue;
        }
        let Ok(content) = fs::read_to_string(path) else {
            continue;
        };
        out.extend(classify(path, &content));
    }
    out
}

/// Split `content` into production lines
///
/// Everything from the first `#[cfg(test)]` on is treated as test code,
/// matching the layout used throughout the workspace.
#[must_use]
pub fn classify(path: &Path, content: &str) -> Vec<SourceLine> {
    let lines: Vec<&str> = content
        .lines()
        .take_while(|line| !line.trim_start().starts_with("#[cfg(test)]"))
        .collect();

    lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| {
            let code = strip_comment(line);
            if code.trim().is_empty() {
                return None;
            }
            Some(SourceLine {
                path: path.to_path_buf(),
                number: idx + 1,
                code: code.to_string(),
                in_async: is_in_async_context(&lines, idx),
            })
        })
        .collect()
}

/// Drop a trailing `//` comment (doc comments included)
#[must_use]
pub fn strip_comment(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

/// `Some(is_async)` if `line` opens a function signature
#[must_use]
pub fn fn_signature(line: &str) -> Option<bool> {
    let mut rest = strip_comment(line).trim();
    let mut is_async = false;
    loop {
        if let Some(tail) = rest.strip_prefix("pub(crate) ") {
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("pub ") {
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("const ") {
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("unsafe ") {
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("async ") {
            is_async = true;
            rest = tail;
        } else {
            break;
        }
    }
    rest.starts_with("fn ").then_some(is_async)
}

/// Whether line `idx` sits in an async fn, a `stream!` body, or an async block
///
/// Scans backwards to the nearest enclosing construct.
#[must_use]
pub fn is_in_async_context(lines: &[&str], idx: usize) -> bool {
    for i in (0..=idx).rev() {
        let code = strip_comment(lines[i]);
        if code.contains("stream! {") || code.contains("async move {") || code.contains("async {")
        {
            return true;
        }
        if let Some(is_async) = fn_signature(code) {
            return is_async;
        }
        let trimmed = code.trim_start();
        if trimmed.starts_with("mod ") || (trimmed.starts_with("impl") && code.contains('{')) {
            return false;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_signature_detection() {
        assert_eq!(fn_signature("fn main() {"), Some(false));
        assert_eq!(fn_signature("    pub(crate) async fn shutdown(mut self) {"), Some(true));
        assert_eq!(fn_signature("pub fn sample_ctx<S, T>("), Some(false));
        assert_eq!(fn_signature("let f = |x| x;"), None);
        assert_eq!(fn_signature("// fn commented() {}"), None);
    }

    #[test]
    fn test_async_context_detection() {
        let code = vec![
            "pub fn delay_ctx<S, T>(token: &CancelToken) -> FlowStream<T> {",
            "    let token = token.clone();",
            "    stream! {",
            "        pause(&token, duration).await;",
            "    }",
        ];
        assert!(!is_in_async_context(&code, 1));
        assert!(is_in_async_context(&code, 3));

        let code = vec!["async fn run() {", "    let x = 1;", "}"];
        assert!(is_in_async_context(&code, 1));
    }

    #[test]
    fn test_classify_skips_tests_and_comments() {
        let content = "fn a() {}\n// only a comment\n#[cfg(test)]\nmod tests {\n    fn b() {}\n}\n";
        let lines = classify(Path::new("x.rs"), content);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].number, 1);
        assert!(!lines[0].in_async);
    }
}
