use assert_cmd::Command;
use serde_json::Value;
use std::io::Write;

const CAT_LOG: &str = "1,3,1,500c100a100t|1,1,500,0+c,100,1+a,100,2+t,";

fn racelog() -> Command {
    Command::cargo_bin("racelog").unwrap()
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).unwrap()
}

#[test]
fn decodes_a_positional_log() {
    let assert = racelog().arg(CAT_LOG).assert().success();
    let report = stdout_json(&assert.get_output().stdout);

    assert_eq!(report["quote"], "cat");
    assert_eq!(report["speeds"]["adjusted_wpm"], 120.0);
    assert!(report.get("segments").is_none());
}

#[test]
fn reads_the_log_from_stdin() {
    let assert = racelog().write_stdin(CAT_LOG).assert().success();
    let report = stdout_json(&assert.get_output().stdout);
    assert_eq!(report["quote"], "cat");
}

#[test]
fn reads_the_log_from_a_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{CAT_LOG}").unwrap();

    let assert = racelog()
        .arg("--file")
        .arg(file.path())
        .assert()
        .success();
    let report = stdout_json(&assert.get_output().stdout);
    assert_eq!(report["quote"], "cat");
}

#[test]
fn universe_changes_the_multiplier() {
    let assert = racelog()
        .args(["--universe", "lang_ko", CAT_LOG])
        .assert()
        .success();
    let report = stdout_json(&assert.get_output().stdout);
    assert_eq!(report["speeds"]["multiplier"], 24000.0);
    assert_eq!(report["speeds"]["adjusted_wpm"], 240.0);
}

#[test]
fn breakdown_flags_add_sections() {
    let assert = racelog()
        .args(["--segments", "--words", CAT_LOG])
        .assert()
        .success();
    let report = stdout_json(&assert.get_output().stdout);

    assert_eq!(report["segments"][0]["text"], "cat");
    assert_eq!(report["words"][0]["text"], "cat");
}

#[test]
fn rejects_an_empty_log() {
    racelog().write_stdin("\n").assert().failure();
}

#[test]
fn rejects_a_corrupt_action_half() {
    racelog()
        .arg("1,2,1,100a200b|1,1,100,0+a,200,1+")
        .assert()
        .failure();
}
