//! CLI E2E smoke tests.

use std::io;
use std::process::Command;

fn run_info_json() -> io::Result<String> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_svcplus"));
    command.args(["info", "--json"]).current_dir(std::env::temp_dir());
    for (key, _) in std::env::vars() {
        if key.starts_with("SVCPLUS_") {
            command.env_remove(key);
        }
    }
    let output = command.output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(io::Error::other(format!("info failed: {stderr}")));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[test]
fn info_is_deterministic() -> io::Result<()> {
    let first = run_info_json()?;
    let second = run_info_json()?;

    assert_eq!(first, second, "info output should be deterministic");

    Ok(())
}

#[test]
fn help_lists_every_command() -> io::Result<()> {
    let output = Command::new(env!("CARGO_BIN_EXE_svcplus"))
        .arg("--help")
        .output()?;
    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    for command in [
        "init",
        "start",
        "stop",
        "test-gen",
        "metric-config-gen",
        "info",
        "config",
    ] {
        assert!(help.contains(command), "missing {command} in help");
    }
    Ok(())
}
