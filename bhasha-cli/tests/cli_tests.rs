mod common;

use common::{bhasha, write_file};
use predicates::prelude::*;

#[test]
fn test_run_prints_program_output() {
    let (_dir, path) = write_file("hello.txt", "छापें(\"नमस्ते\")\n");
    bhasha()
        .arg("run")
        .arg(&path)
        .assert()
        .success()
        .stdout("नमस्ते\n");
}

#[test]
fn test_run_failure_exits_with_two() {
    let (_dir, path) = write_file("div.txt", "छापें(\"पहले\")\nछापें(१० / ०)\n");
    bhasha()
        .args(["run", "--no-translate"])
        .arg(&path)
        .assert()
        .code(2)
        .stdout("पहले\n")
        .stderr(predicate::str::contains("शून्य से भाग नहीं कर सकते।"))
        .stderr(predicate::str::contains("ZeroDivisionError: division by zero"))
        .stderr(predicate::str::contains("> 2 |"));
}

#[test]
fn test_run_json_response() {
    let (_dir, path) = write_file("name.txt", "छापें(अज्ञात)\n");
    let output = bhasha()
        .args(["run", "--json"])
        .arg(&path)
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let response: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(response["is_error"], true);
    assert_eq!(response["error_kind"], "unresolved_name");
    assert_eq!(response["translated_code"], "print(अज्ञात)\n");
    assert_eq!(response["line"], 1);
    assert!(response["output"]
        .as_str()
        .unwrap()
        .starts_with("नाम त्रुटि"));
}

#[test]
fn test_transpile_subcommand() {
    let (_dir, path) = write_file("t.txt", "अगर सही:\n    छापें(१)\n");
    bhasha()
        .arg("transpile")
        .arg(&path)
        .assert()
        .success()
        .stdout("if True:\n    print(1)\n\n");
}

#[test]
fn test_explain_subcommand() {
    let (_dir, path) = write_file("e.txt", "छापें(1)\nx = 2\n");
    bhasha()
        .arg("explain")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("(print)"))
        .stdout(predicate::str::contains("ℹ️ यह एक सामान्य लाइन है।"));
}

#[test]
fn test_stdin_file_feeds_input() {
    let (dir, path) = write_file("in.txt", "नाम = इनपुट()\nछापें(\"नमस्ते\", नाम)\n");
    let stdin_path = dir.path().join("lines.txt");
    std::fs::write(&stdin_path, "सीता\n").unwrap();
    bhasha()
        .arg("run")
        .arg(&path)
        .arg("--stdin-file")
        .arg(&stdin_path)
        .assert()
        .success()
        .stdout("नमस्ते सीता\n");
}

#[test]
fn test_config_file_sets_limits() {
    let (dir, path) = write_file("loop.txt", "जबतक सही:\n    पास = 1\n");
    let config_path = dir.path().join("bhasha.json");
    std::fs::write(&config_path, r#"{"limits": {"max_steps": 1000}}"#).unwrap();
    bhasha()
        .arg("run")
        .arg(&path)
        .arg("--config")
        .arg(&config_path)
        .arg("--no-translate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("संसाधन"));
}

#[test]
fn test_missing_file_is_infrastructure_error() {
    bhasha()
        .args(["run", "/definitely/not/here.txt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn test_bad_config_is_infrastructure_error() {
    let (dir, path) = write_file("p.txt", "छापें(1)\n");
    let config_path = dir.path().join("bad.json");
    std::fs::write(&config_path, "{").unwrap();
    bhasha()
        .arg("run")
        .arg(&path)
        .arg("--config")
        .arg(&config_path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid config"));
}
