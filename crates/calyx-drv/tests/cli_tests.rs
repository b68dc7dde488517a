//! CLI end-to-end tests for the `calyx` binary.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn calyx() -> Command {
    Command::cargo_bin("calyx").expect("binary builds")
}

fn source_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write source");
    file
}

#[test]
fn test_cli_help() {
    calyx()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("calyx"));
}

#[test]
fn test_cli_version() {
    calyx()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("calyx"));
}

#[test]
fn test_file_mode_runs_program() {
    let file = source_file(
        "var n : int = 10;
         def fib(n : int) : int {
             var a : int = 1;
             var b : int = 1;
             var i : int = 1;
             while (i < n) {
                 print b;
                 var tmp : int = a;
                 a = b;
                 b = tmp + b;
                 i = i + 1
             }
             return b
         }
         print fib(n)",
    );
    calyx()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("55"));
}

#[test]
fn test_file_mode_no_optimize() {
    let file = source_file("var x : int = 1 + 0; print x");
    calyx()
        .arg(file.path())
        .arg("--no-optimize")
        .assert()
        .success()
        .stdout(predicate::str::contains("1"));
}

#[test]
fn test_emit_ast_dumps_tree() {
    let file = source_file("def f() : int { return 1 } print f()");
    calyx()
        .arg(file.path())
        .arg("--emit-ast")
        .assert()
        .success()
        .stdout(predicate::str::contains("fn-def f : int"))
        .stdout(predicate::str::contains("print"));
}

#[test]
fn test_syntax_error_logged_without_failing_exit() {
    let file = source_file("var x : = 3;");
    // Per-program errors are diagnostics, not process failures.
    calyx()
        .arg(file.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_runtime_error_logged_without_failing_exit() {
    let file = source_file("assert 1 == 2");
    calyx()
        .arg(file.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("assertion failed"));
}

#[test]
fn test_missing_file_is_a_driver_error() {
    calyx()
        .arg("definitely-not-here.cx")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn test_repl_evaluates_and_prompts() {
    calyx()
        .write_stdin("print 1 + 1\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("calc> "))
        .stdout(predicate::str::contains("2"));
}

#[test]
fn test_repl_continuation_prompt() {
    // A trailing space asks for a continuation line.
    calyx()
        .write_stdin("print 1 + \n2\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("... "))
        .stdout(predicate::str::contains("3"));
}

#[test]
fn test_repl_survives_bad_program() {
    calyx()
        .write_stdin("print ghost\nprint 7\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("7"))
        .stderr(predicate::str::contains("failed to resolve variable"));
}

#[test]
fn test_repl_exits_cleanly_on_eof() {
    calyx().write_stdin("").assert().success();
}
