use std::{fs, path::PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn frontal() -> Command {
    let mut cmd = Command::cargo_bin("frontal").expect("binary exists");
    cmd.arg("--automaton")
        .arg(fixture("decl.fa"))
        .arg("--grammar")
        .arg(fixture("decl.bnf"))
        .arg("--config")
        .arg(fixture("keywords.toml"));
    cmd
}

#[test]
fn accepts_valid_program() {
    frontal()
        .arg(fixture("valid.src"))
        .assert()
        .success()
        .stdout(predicate::str::contains("table global"))
        .stdout(predicate::str::contains("  class Point -> Point"))
        .stdout(predicate::str::contains("  parameter p: Point"))
        .stdout(predicate::str::ends_with("accepted\n"));
}

#[test]
fn reports_redeclarations() {
    frontal()
        .arg(fixture("redeclared.src"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "[ERROR] (2, 21): parameter `a` redeclared, previously declared at (2, 14)",
        ))
        .stdout(predicate::str::contains(
            "[ERROR] (5, 7): variable `total` redeclared, previously declared at (1, 5)",
        ))
        .stdout(predicate::str::contains("accepted\n"));
}

#[test]
fn reports_syntax_errors() {
    frontal()
        .arg(fixture("broken.src"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[ERROR] (2, 1): unexpected func `func`"))
        .stdout(predicate::str::ends_with("rejected\n"));
}

#[test]
fn reports_lexical_errors() {
    let dir = tempdir().expect("tempdir");
    let source = dir.path().join("bad.src");
    fs::write(&source, "int x;\nint @y;\n").expect("write source");

    frontal()
        .arg(&source)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[ERROR] (2, 5): invalid character `@`"))
        .stdout(predicate::str::contains("accepted\n"));
}

#[test]
fn prints_json() {
    let output = frontal()
        .arg("--format")
        .arg("json")
        .arg(fixture("valid.src"))
        .output()
        .expect("run frontal");

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["report"]["accepted"], serde_json::Value::Bool(true));
    assert_eq!(json["tables"]["tables"][0]["name"], "global");
}

#[test]
fn prints_dot_without_source() {
    frontal()
        .arg("--dot")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("digraph"))
        .stdout(predicate::str::contains("doublecircle"));
}

#[test]
fn prints_parse_table() {
    frontal()
        .arg("--table")
        .assert()
        .success()
        .stdout(predicate::str::contains("Type, float => Type -> 'float' begin_type"));
}

#[test]
fn snapshots_on_request() {
    frontal()
        .arg("--snapshots")
        .arg(fixture("valid.src"))
        .assert()
        .success()
        .stdout(predicate::str::contains("steps\n"))
        .stdout(predicate::str::contains("match 'class'"));
}

#[test]
fn missing_source_is_a_usage_error() {
    frontal().assert().failure().code(2);
}

#[test]
fn invalid_grammar_fails() {
    let dir = tempdir().expect("tempdir");
    let grammar = dir.path().join("bad.bnf");
    fs::write(&grammar, "Prog -> Missing\n").expect("write grammar");

    Command::cargo_bin("frontal")
        .expect("binary exists")
        .arg("--automaton")
        .arg(fixture("decl.fa"))
        .arg("--grammar")
        .arg(&grammar)
        .arg("--dot")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nonterminal Missing is used but never defined"));
}
