//! CLI integration tests.
//!
//! Run the `stackgen` binary against temporary projects.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const APP_CONFIG: &str = "[stack]\n\
                          [[generate_hcl]]\n\
                          name = \"main.tf\"\n\
                          [[generate_hcl.blocks]]\n\
                          type = \"terraform\"\n\
                          [generate_hcl.blocks.attributes]\n\
                          required_version = \"1.10\"\n";

fn stackgen(project: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("stackgen").unwrap();
    cmd.current_dir(project.path())
        .arg("--root")
        .arg(project.path())
        .env_remove("STACKGEN_LOG");
    cmd
}

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    temp.child("app/stackgen.toml").write_str(APP_CONFIG).unwrap();
    temp
}

#[test]
fn help_describes_tool() {
    Command::cargo_bin("stackgen")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn generate_then_up_to_date() {
    let temp = project();

    stackgen(&temp)
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("- /app"))
        .stdout(predicate::str::contains("[+] main.tf"));

    temp.child("app/main.tf")
        .assert(predicate::str::contains("required_version = \"1.10\""));

    stackgen(&temp)
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));
}

#[test]
fn check_detects_drift() {
    let temp = project();

    stackgen(&temp)
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("/app/main.tf"))
        .stderr(predicate::str::contains("outdated"));
    temp.child("app/main.tf").assert(predicate::path::missing());

    stackgen(&temp).arg("generate").assert().success();
    stackgen(&temp)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn check_continues_past_failing_stack() {
    let temp = TempDir::new().unwrap();
    temp.child("app/stackgen.toml")
        .write_str(&APP_CONFIG.replace("\"1.10\"", "\"${global.missing}\""))
        .unwrap();
    temp.child("web/stackgen.toml").write_str(APP_CONFIG).unwrap();

    stackgen(&temp)
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("/web/main.tf"))
        .stderr(predicate::str::contains("checking stack '/app'"))
        .stderr(predicate::str::contains("could not be checked"));

    let output = stackgen(&temp)
        .args(["--json", "check"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        value["outdated"]["/web"],
        serde_json::json!(["main.tf"])
    );
    assert!(value["errors"]["/app"].is_string());
    assert_eq!(value["outdated"].get("/app"), None);
}

#[test]
fn manual_code_fails_generate() {
    let temp = project();
    temp.child("app/main.tf").write_str("manual = true\n").unwrap();

    stackgen(&temp)
        .arg("generate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Failures:"))
        .stdout(predicate::str::contains("manually defined code"))
        .stderr(predicate::str::contains("code generation failed"));

    temp.child("app/main.tf").assert("manual = true\n");
}

#[test]
fn generate_json_output() {
    let temp = project();

    let output = stackgen(&temp)
        .args(["--json", "generate"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["bootstrap_error"], serde_json::Value::Null);
    assert_eq!(
        value["stacks"]["/app"]["created"],
        serde_json::json!(["main.tf"])
    );
}

#[test]
fn quiet_generate_prints_nothing() {
    let temp = project();

    stackgen(&temp)
        .args(["--quiet", "generate"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    temp.child("app/main.tf").assert(predicate::path::exists());
}

#[test]
fn list_shows_generated_files() {
    let temp = project();
    temp.child("app/notes.tf").write_str("x = 1\n").unwrap();

    stackgen(&temp).arg("generate").assert().success();
    stackgen(&temp)
        .arg("list")
        .assert()
        .success()
        .stdout("/app/main.tf\n");
}

#[test]
fn cwd_limits_stacks() {
    let temp = project();
    temp.child("other/stackgen.toml").write_str(APP_CONFIG).unwrap();

    stackgen(&temp)
        .arg("--cwd")
        .arg(temp.child("other").path())
        .arg("generate")
        .assert()
        .success();

    temp.child("other/main.tf").assert(predicate::path::exists());
    temp.child("app/main.tf").assert(predicate::path::missing());
}

#[test]
fn completion_script() {
    Command::cargo_bin("stackgen")
        .unwrap()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stackgen"));
}
