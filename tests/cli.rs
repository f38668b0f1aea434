use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn waynoted_cmd() -> Command {
    Command::cargo_bin("waynoted").expect("binary exists")
}

#[test]
fn waynoted_help_prints_usage() {
    waynoted_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Desktop notification daemon with stacked popups",
        ));
}

#[test]
fn no_flags_prints_signal_usage() {
    waynoted_cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("SIGUSR1"));
}

#[test]
fn init_config_writes_into_config_home_once() {
    let temp = TempDir::new().unwrap();

    waynoted_cmd()
        .env("XDG_CONFIG_HOME", temp.path())
        .arg("--init-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default config"));
    assert!(temp.path().join("waynoted").join("config.toml").is_file());

    waynoted_cmd()
        .env("XDG_CONFIG_HOME", temp.path())
        .arg("--init-config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn check_config_accepts_generated_file() {
    let temp = TempDir::new().unwrap();

    waynoted_cmd()
        .env("XDG_CONFIG_HOME", temp.path())
        .arg("--init-config")
        .assert()
        .success();

    waynoted_cmd()
        .env("XDG_CONFIG_HOME", temp.path())
        .arg("--check-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn check_config_rejects_bad_toml() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.toml");
    std::fs::write(&path, "[popups\nwidth = ").unwrap();

    waynoted_cmd()
        .arg("--check-config")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"));
}

#[test]
fn daemon_and_init_config_conflict() {
    waynoted_cmd()
        .args(["--daemon", "--init-config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}
