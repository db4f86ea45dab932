//! End-to-end tests for the portweaver binary

use std::process::Command;
use tempfile::tempdir;

fn portweaver() -> Command {
    Command::new(env!("CARGO_BIN_EXE_portweaver"))
}

#[test]
fn test_help_lists_commands() {
    let output = portweaver().arg("--help").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["run", "check", "trigger", "status", "init-config"] {
        assert!(stdout.contains(command), "missing {} in help", command);
    }
}

#[test]
fn test_init_config_writes_default_file_once() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let output = portweaver()
        .arg("init-config")
        .env("PORTWEAVER_CONFIG_DIR", temp_dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let contents = std::fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("update_interval_seconds = 180"));
    assert!(contents.contains("[qbittorrent]"));

    std::fs::write(&config_path, "# edited\n").unwrap();
    let output = portweaver()
        .arg("init-config")
        .env("PORTWEAVER_CONFIG_DIR", temp_dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(std::fs::read_to_string(&config_path).unwrap(), "# edited\n");
}

#[test]
fn test_explicit_config_path() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("custom").join("portweaver.toml");

    let output = portweaver()
        .arg("--config")
        .arg(&config_path)
        .arg("init-config")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(config_path.exists());
}

#[test]
fn test_status_without_daemon_fails() {
    let temp_dir = tempdir().unwrap();

    let output = portweaver()
        .arg("status")
        .env("XDG_RUNTIME_DIR", temp_dir.path())
        .env("PORTWEAVER_CONFIG_DIR", temp_dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No running portweaver daemon"));
}

/// A first check creates the config file and reports the skip
#[test]
fn test_check_bootstraps_config() {
    let temp_dir = tempdir().unwrap();

    let output = portweaver()
        .arg("check")
        .env("PORTWEAVER_CONFIG_DIR", temp_dir.path())
        .env("XDG_RUNTIME_DIR", temp_dir.path())
        .env_remove("JOURNAL_STREAM")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration unavailable"));
    assert!(temp_dir.path().join("config.toml").exists());
    assert!(temp_dir.path().join("portweaver.log").exists());
}

/// A foreground run refuses to start next to a live instance
#[test]
fn test_run_refuses_second_instance() {
    let temp_dir = tempdir().unwrap();
    let pid_file = temp_dir.path().join("portweaver.pid");
    std::fs::write(&pid_file, std::process::id().to_string()).unwrap();

    let output = portweaver()
        .arg("run")
        .env("XDG_RUNTIME_DIR", temp_dir.path())
        .env("PORTWEAVER_CONFIG_DIR", temp_dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("already running"));
    assert!(pid_file.exists());
}
