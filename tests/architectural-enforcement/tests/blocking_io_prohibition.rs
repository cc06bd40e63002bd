//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: code running on the runtime MUST NOT use blocking I/O.
//! **Required**: `tokio::fs`, `tokio::net`, `tokio::io::stdin`/`stdout`
//!
//! Blocking I/O in plain (non-async) functions is acceptable: configuration
//! is loaded that way before any pipeline starts.

use architectural_enforcement::{production_dirs, production_lines};

const FORBIDDEN: &[(&str, &str)] = &[
    ("std::fs::", "Blocking file I/O"),
    ("std::net::", "Blocking network I/O"),
    ("std::process::Command", "Blocking process I/O"),
    ("std::io::stdin()", "Blocking stdin"),
    ("std::io::stdout()", "Blocking stdout"),
    ("reqwest::blocking", "Blocking HTTP client"),
];

#[test]
fn test_no_blocking_io_in_async_code() {
    let mut violations = Vec::new();
    for dir in production_dirs() {
        for line in production_lines(&dir) {
            if !line.in_async {
                continue;
            }
            for (pattern, what) in FORBIDDEN {
                if line.code.contains(pattern) {
                    violations.push(line.report(what));
                }
            }
        }
    }

    if !violations.is_empty() {
        eprintln!("\n❌ Blocking I/O found in async code:\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ Use the tokio equivalents, or move the call before the runtime starts");
        panic!("Found {} blocking I/O call(s)", violations.len());
    }
}

#[test]
fn test_production_trees_are_scanned() {
    for dir in production_dirs() {
        assert!(
            !production_lines(&dir).is_empty(),
            "{} yielded no production lines",
            dir.display()
        );
    }
}
