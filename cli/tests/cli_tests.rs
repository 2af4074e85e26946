//! CLI binary integration tests using assert_cmd + predicates.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::cargo_bin("yangcast").expect("binary should exist")
}

fn simple_context() -> String {
    serde_json::json!({
        "modules": [{
            "name": "m",
            "namespace": "urn:m",
            "prefix": "m",
            "children": [
                {
                    "kind": "container",
                    "name": "top",
                    "children": [
                        {
                            "kind": "list",
                            "name": "item",
                            "key": ["id"],
                            "children": [
                                { "kind": "leaf", "name": "id", "type": { "name": "int32" } },
                                { "kind": "leaf", "name": "name", "type": { "name": "string" } }
                            ]
                        }
                    ]
                }
            ]
        }]
    })
    .to_string()
}

fn invalid_context() -> String {
    serde_json::json!({
        "modules": [],
        "diagnostics": [
            { "severity": "error", "message": "unresolved import" }
        ]
    })
    .to_string()
}

// ── XSD ─────────────────────────────────────────────────────────────────────

#[test]
fn test_xsd_writes_one_document_per_module() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("context.json");
    fs::write(&input, simple_context()).unwrap();

    cmd()
        .args(["xsd", input.to_str().unwrap()])
        .args(["--out-dir", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("m.xsd"));

    let text = fs::read_to_string(dir.path().join("m.xsd")).expect("m.xsd should exist");
    assert!(text.contains("<xs:complexType name=\"top_t\">"));
    assert!(text.contains("<xs:key name=\"top_item_k\">"));
}

// ── SQL ─────────────────────────────────────────────────────────────────────

#[test]
fn test_sql_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("context.json");
    fs::write(&input, simple_context()).unwrap();

    cmd()
        .args(["sql", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("CREATE TABLE top_item ("))
        .stdout(predicate::str::contains(
            "CONSTRAINT top_item_pk PRIMARY KEY(id_fk)",
        ));
}

#[test]
fn test_sql_headers_written_next_to_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("context.json");
    let output = dir.path().join("schema.sql");
    fs::write(&input, simple_context()).unwrap();

    cmd()
        .args(["sql", input.to_str().unwrap()])
        .args(["-o", output.to_str().unwrap()])
        .arg("--headers")
        .args(["--output-stem", "netdb"])
        .assert()
        .success();

    let ddl = fs::read_to_string(&output).expect("DDL file should exist");
    assert!(ddl.contains("CREATE TABLE top ("));

    let h = fs::read_to_string(dir.path().join("netdb.h")).expect("header should exist");
    assert!(h.contains("#define TOP_ITEM \"/top/item\""));
    assert!(h.contains("#define TOP_ITEM_KEYS \"id\""));
    let c = fs::read_to_string(dir.path().join("netdb.c")).expect("source should exist");
    assert!(c.contains("getKey"));
}

// ── Jtox ────────────────────────────────────────────────────────────────────

#[test]
fn test_jtox_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("context.json");
    fs::write(&input, simple_context()).unwrap();

    cmd()
        .args(["jtox", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"modules\""))
        .stdout(predicate::str::contains("\"tree\""));
}

#[test]
fn test_jtox_compact_format_round_trips() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("context.json");
    let output = dir.path().join("driver.json");
    fs::write(&input, simple_context()).unwrap();

    cmd()
        .args(["jtox", input.to_str().unwrap()])
        .args(["-o", output.to_str().unwrap()])
        .args(["--format", "compact"])
        .assert()
        .success();

    let text = fs::read_to_string(&output).expect("output file should exist");
    let doc: serde_json::Value = serde_json::from_str(&text).expect("output should be valid JSON");
    assert_eq!(doc["modules"]["m"][1], "urn:m");
    assert_eq!(doc["tree"]["top"][0], "container");
}

// ── Failure modes ───────────────────────────────────────────────────────────

#[test]
fn test_error_diagnostics_abort_with_message() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("context.json");
    fs::write(&input, invalid_context()).unwrap();

    cmd()
        .args(["sql", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error-severity diagnostic"));
}

#[test]
fn test_missing_input_file_fails() {
    cmd()
        .args(["jtox", "/nonexistent/context.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open input file"));
}

#[test]
fn test_malformed_context_fails() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("context.json");
    fs::write(&input, "{ not json").unwrap();

    cmd()
        .args(["xsd", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse schema context"));
}
