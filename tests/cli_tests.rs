//! # CLI Integration Tests / CLI 集成测试
//!
//! Runs the `farm-runner` binary end to end in the `local` environment, where
//! no remote service is contacted.
//!
//! 在 `local` 环境中端到端运行 `farm-runner` 二进制文件，此时不会访问任何远程服务。

mod common;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

fn runner_cmd() -> Command {
    let mut cmd = Command::cargo_bin("farm-runner").unwrap();
    cmd.env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .arg("--lang")
        .arg("en");
    cmd
}

/// This test checks that both subcommands are listed in the help text.
///
/// 这个测试检查帮助文本中列出了两个子命令。
#[test]
fn test_help_lists_subcommands() {
    runner_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn test_apk_is_required() {
    runner_cmd()
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--apk"));
}

#[test]
fn test_unknown_env_is_rejected() {
    runner_cmd()
        .args(["run", "--apk", "app.apk", "--env", "lab"])
        .assert()
        .failure();
}

/// A passing suite exits with code 0 and writes one JSON report per test.
///
/// 通过的套件以退出码 0 结束，并为每个测试写入一个 JSON 报告。
#[test]
fn test_passing_local_run() {
    let dir = tempdir().unwrap();
    let config = common::write_suite_config(
        &dir,
        r#"
[[cases]]
name = "test_open_wallet"
command = "true"

[[cases]]
name = "test_nightly_only"
command = "false"
marks = ["nightly"]
"#,
    );

    runner_cmd()
        .arg("run")
        .arg("--config")
        .arg(&config)
        .args(["--apk", "https://example.org/StatusIm-PR-1.apk", "--env", "local"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Testing StatusIm-PR-1.apk"))
        .stdout(predicate::str::contains("Skipping 1 nightly test(s)"))
        .stdout(predicate::str::contains("All tests passed!"));

    assert!(dir.path().join("reports").join("test_open_wallet.json").exists());
    assert!(!dir.path().join("reports").join("test_nightly_only.json").exists());
}

#[test]
fn test_failing_local_run_exits_with_failure() {
    let dir = tempdir().unwrap();
    let config = common::write_suite_config(
        &dir,
        r#"
[[cases]]
name = "test_balance"
command = "sh -c 'echo AssertionError: wrong balance; exit 1'"
"#,
    );

    runner_cmd()
        .arg("run")
        .arg("--config")
        .arg(&config)
        .args(["--apk", "app.apk", "--env", "local", "--rerun-count", "2"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("AssertionError: wrong balance"))
        .stdout(predicate::str::contains("1 attempt(s)"))
        .stdout(predicate::str::contains("1 test(s) failed."));
}

/// A transient failure followed by a pass is rerun and ends passed.
///
/// 瞬态失败之后通过的测试会被重跑，并以通过告终。
#[test]
fn test_transient_failure_is_rerun() {
    let dir = tempdir().unwrap();
    let config = common::write_suite_config(
        &dir,
        r#"
[[cases]]
name = "test_flaky"
command = "sh -c 'if [ -f seen ]; then exit 0; fi; touch seen; echo Sauce could not start your job; exit 1'"
"#,
    );

    runner_cmd()
        .arg("run")
        .arg("--config")
        .arg(&config)
        .args(["--apk", "app.apk", "--env", "local", "--rerun_count", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Passed on rerun"))
        .stdout(predicate::str::contains("2 attempt(s)"));

    let report = std::fs::read_to_string(dir.path().join("reports").join("test_flaky.json")).unwrap();
    let record: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(record["testruns"].as_array().unwrap().len(), 2);
}

#[test]
fn test_mark_filter_and_html_report() {
    let dir = tempdir().unwrap();
    let config = common::write_suite_config(
        &dir,
        r#"
[[cases]]
name = "test_smoke"
command = "true"
marks = ["smoke_1"]

[[cases]]
name = "test_other"
command = "false"
"#,
    );
    let html = dir.path().join("report.html");

    runner_cmd()
        .arg("run")
        .arg("--config")
        .arg(&config)
        .args(["--apk", "app.apk", "--env", "local", "-m", "smoke_1", "--html"])
        .arg(&html)
        .assert()
        .success();

    let page = std::fs::read_to_string(&html).unwrap();
    assert!(page.contains("test_smoke"));
    assert!(!page.contains("test_other"));
}

#[test]
fn test_sauce_env_requires_credentials() {
    let dir = tempdir().unwrap();
    let config = common::write_suite_config(&dir, "[[cases]]\nname = \"a\"\ncommand = \"true\"\n");

    runner_cmd()
        .env_remove("SAUCE_USERNAME")
        .env_remove("SAUCE_ACCESS_KEY")
        .arg("run")
        .arg("--config")
        .arg(&config)
        .args(["--apk", "app.apk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SAUCE_USERNAME"));
}

#[test]
fn test_non_interactive_init_writes_a_valid_config() {
    let dir = tempdir().unwrap();

    runner_cmd()
        .current_dir(dir.path())
        .args(["init", "--non-interactive"])
        .assert()
        .success();

    let config = farm_runner::core::config::load_suite_config(&dir.path().join("FarmSuite.toml")).unwrap();
    assert_eq!(config.cases.len(), 3);
    assert_eq!(config.language, "en");
}
