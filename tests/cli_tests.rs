// tests/cli_tests.rs
use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_program(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(text.as_bytes()).expect("write program");
    file
}

#[test]
fn test_run_prints_final_state_and_stats() {
    let program = write_program("ADD R1, R2, R3\nADD R4, R1, R5\n");

    let mut cmd = Command::cargo_bin("tomasulo_rust").expect("binary builds");
    cmd.arg("run")
        .arg("--input")
        .arg(program.path())
        .arg("--no-color")
        .arg("--reg")
        .arg("R2=5")
        .arg("--reg")
        .arg("R3=7")
        .arg("--reg")
        .arg("R5=1");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("R1: 12"))
        .stdout(predicate::str::contains("R4: 13"))
        .stdout(predicate::str::contains("Instructions Committed: 2"));
}

#[test]
fn test_run_emits_json_when_asked() {
    let program = write_program("ADD R1, R2, R3\n");

    let mut cmd = Command::cargo_bin("tomasulo_rust").expect("binary builds");
    cmd.arg("run")
        .arg("--input")
        .arg(program.path())
        .arg("--json")
        .arg("--no-color");

    let output = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(output).expect("utf-8 output");
    let value: serde_json::Value = serde_json::from_str(text.trim()).expect("valid JSON");
    assert!(value.get("registers").is_some());
    assert!(value.get("stats").is_some());
    assert_eq!(value["halted"], serde_json::json!(true));
}

#[test]
fn test_trace_reports_branch_events() {
    let program = write_program(
        "ADD R1, R0, R0\nBEQ R1, R0, 16\nADD R7, R4, R5\nADD R8, R4, R5\nADD R9, R4, R5\n",
    );

    let mut cmd = Command::cargo_bin("tomasulo_rust").expect("binary builds");
    cmd.arg("trace")
        .arg("--input")
        .arg(program.path())
        .arg("--no-color");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("PRED"))
        .stdout(predicate::str::contains("mispredicted"));
}

#[test]
fn test_invalid_register_preload_is_rejected() {
    let program = write_program("ADD R1, R2, R3\n");

    let mut cmd = Command::cargo_bin("tomasulo_rust").expect("binary builds");
    cmd.arg("run")
        .arg("--input")
        .arg(program.path())
        .arg("--reg")
        .arg("R99=5");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid preload"));
}

#[test]
fn test_missing_input_file_fails_cleanly() {
    let mut cmd = Command::cargo_bin("tomasulo_rust").expect("binary builds");
    cmd.arg("run").arg("--input").arg("does-not-exist.asm");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("I/O error"));
}
