//! Integration Test: Blocking Sleep Prohibition
//!
//! **Policy**: production code MUST NOT block a runtime thread to wait.
//! Every wait in an operator is a tokio timer raced against cancellation.
//!
//! **Forbidden**: `std::thread::sleep`, `thread::sleep`, `park_timeout`
//! **Required**: `tokio::time::sleep`, `tokio::time::interval`, or a fresh
//! `Sleep` per deadline

use architectural_enforcement::{production_dirs, production_lines};

const FORBIDDEN: &[&str] = &["thread::sleep(", "park_timeout("];

#[test]
fn test_no_blocking_sleep_in_production_code() {
    let mut violations = Vec::new();
    for dir in production_dirs() {
        for line in production_lines(&dir) {
            if FORBIDDEN.iter().any(|pattern| line.code.contains(pattern)) {
                violations.push(line.report("Blocking sleep"));
            }
        }
    }

    if !violations.is_empty() {
        eprintln!("\n❌ Blocking sleeps found in production code:\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ Use tokio::time::sleep raced against the pipeline's done signal");
        panic!("Found {} blocking sleep(s)", violations.len());
    }
}

#[test]
fn test_timing_code_uses_tokio_clock() {
    // std's Instant ignores tokio's paused clock, which breaks deterministic tests
    let mut violations = Vec::new();
    for dir in production_dirs() {
        for line in production_lines(&dir) {
            if line.code.contains("std::time::Instant") || line.code.contains("SystemTime::now") {
                violations.push(line.report("Wall clock read"));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Use tokio::time::Instant instead:\n{}",
        violations.join("\n")
    );
}
