// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Full-agent lifecycle specs and shared helpers.

use std::process::Stdio;
use std::time::{Duration, Instant};

/// Captured output of a finished process.
pub struct Finished {
    pub status: std::process::ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Command for the built lookoutd binary.
pub fn lookoutd() -> std::process::Command {
    std::process::Command::new(assert_cmd::cargo::cargo_bin("lookoutd"))
}

/// Run to completion and capture output.
pub fn run(cmd: &mut std::process::Command) -> Finished {
    let output = match cmd.output() {
        Ok(output) => output,
        Err(e) => panic!("cannot run lookoutd: {e}"),
    };
    Finished {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

#[cfg(unix)]
fn send_sigterm(pid: u32) {
    let status = std::process::Command::new("kill")
        .arg("-TERM")
        .arg(pid.to_string())
        .status();
    assert!(matches!(status, Ok(s) if s.success()), "kill -TERM {pid} failed");
}

/// The agent boots with a minimal config, runs, and exits cleanly on
/// SIGTERM (a user stop, observed as exactly one terminal message).
#[cfg(unix)]
#[test]
fn agent_starts_and_stops_cleanly_on_sigterm() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("lookout.toml");
    // Empty collector_url skips the reachability gate; no surfaces, no
    // command channel.
    std::fs::write(
        &config_path,
        format!("agent_dir = \"{}\"\n", dir.path().display()),
    )
    .unwrap();

    let mut child = lookoutd()
        .arg("--config")
        .arg(&config_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    // Give the runtime a moment to reach its steady state.
    std::thread::sleep(Duration::from_millis(1500));
    send_sigterm(child.id());

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        match child.try_wait().unwrap() {
            Some(status) => break status,
            None if Instant::now() > deadline => {
                let _ = child.kill();
                panic!("agent did not exit within 10s of SIGTERM");
            }
            None => std::thread::sleep(Duration::from_millis(50)),
        }
    };
    assert!(status.success(), "agent exited with {status:?}");
}
