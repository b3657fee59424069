//! Integration tests for the `quanta` fixture runner.
//!
//! These run the built binary and inspect its output.

use std::process::{Command, Output};

fn quanta(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_quanta"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run quanta")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_list_names_every_fixture() {
    let output = quanta(&["list"]);
    assert!(output.status.success());
    let out = stdout(&output);
    for name in [
        "call-pattern-vs-constructor",
        "construct-pattern",
        "heterogeneous-rows",
        "distributed-dispatch",
        "self-referential-destructuring",
        "correlated-use-sites",
    ] {
        assert!(out.contains(name), "missing {} in:\n{}", name, out);
    }
}

#[test]
fn test_check_all_fixtures_pass() {
    let output = quanta(&["check"]);
    let out = stdout(&output);
    assert!(output.status.success(), "stdout: {}\nstderr: {}", out, stderr(&output));
    assert!(!out.contains("FAIL"));
    assert!(out.contains("0 failed"));
}

#[test]
fn test_check_without_memoization() {
    let memo = quanta(&["check"]);
    let plain = quanta(&["--no-memo", "check"]);
    assert!(plain.status.success());
    assert_eq!(stdout(&memo), stdout(&plain));
}

#[test]
fn test_expected_diagnostic_is_rendered() {
    let output = quanta(&["check", "correlated-use-sites"]);
    assert!(output.status.success());
    let err = stderr(&output);
    assert!(err.contains("E2013"), "stderr: {}", err);
    assert!(stdout(&output).contains("ok    correlated-use-sites"));
}

#[test]
fn test_clean_fixture_renders_nothing() {
    let output = quanta(&["check", "distributed-dispatch"]);
    assert!(output.status.success());
    assert!(!stderr(&output).contains("Type error"));
    assert!(stdout(&output).contains("1 passed, 0 failed"));
}

#[test]
fn test_unknown_fixture_fails() {
    let output = quanta(&["check", "no-such-fixture"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unknown fixture: no-such-fixture"));
}

#[test]
fn test_show_prints_source_and_declared_types() {
    let output = quanta(&["show", "construct-pattern"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("type Ctor = { new (): string };"));
    assert!(out.contains("Ctor: { new (): string }"));
    assert!(out.contains("// expected diagnostics: none"));
}

#[test]
fn test_verbose_logs_to_stderr() {
    let output = quanta(&["--verbose", "check", "heterogeneous-rows"]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("row solved"));
}
