// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Early-exit CLI modes: version, validation, dry run, migration.

use super::agent::{lookoutd, run};

#[test]
fn version_flag_prints_and_exits_zero() {
    let output = run(lookoutd().arg("--version"));
    assert!(output.status.success());
    assert!(output.stdout.contains("lookoutd"), "stdout: {}", output.stdout);
}

#[test]
fn validate_reports_ok_for_a_good_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lookout.toml");
    std::fs::write(&path, "collector_url = \"https://collector.example\"\n").unwrap();

    let output = run(lookoutd().arg("--config").arg(&path).arg("--validate"));
    assert!(output.status.success());
    assert!(output.stdout.contains("configuration OK"), "stdout: {}", output.stdout);
}

#[test]
fn validate_exits_zero_even_for_a_bad_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lookout.toml");
    std::fs::write(&path, "command_channel_interval_sec = 0\n").unwrap();

    let output = run(lookoutd().arg("--config").arg(&path).arg("--validate"));
    assert!(output.status.success());
    assert!(
        output.stdout.contains("configuration invalid"),
        "stdout: {}",
        output.stdout
    );
}

#[test]
fn missing_config_file_is_a_fatal_boot_error() {
    let output = run(lookoutd().arg("--config").arg("/definitely/not/here.toml"));
    assert!(!output.status.success());
    assert!(
        output.stderr.contains("cannot read config file"),
        "stderr: {}",
        output.stderr
    );
}

#[test]
fn dry_run_echoes_effective_config_without_starting() {
    let output = run(lookoutd().arg("--dry_run"));
    assert!(output.status.success());
    assert!(output.stdout.contains("collector_url="), "stdout: {}", output.stdout);
    assert!(output.stdout.contains("license_key="), "stdout: {}", output.stdout);
}

#[test]
fn dry_run_echoes_integration_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("integration.json");
    std::fs::write(&path, r#"{"integrations":[{"name":"redis"}]}"#).unwrap();

    let output = run(lookoutd()
        .arg("--dry_run")
        .arg("--integration_config_path")
        .arg(&path));
    assert!(output.status.success());
    assert!(output.stdout.contains("\"redis\""), "stdout: {}", output.stdout);
}

#[test]
fn v3tov4_converts_and_refuses_clobber() {
    let dir = tempfile::tempdir().unwrap();
    let defs = dir.path().join("defs.json");
    let src = dir.path().join("src.json");
    let out = dir.path().join("out.json");
    std::fs::write(
        &defs,
        r#"{"name":"redis","commands":{"metrics":{"command":["/bin/true"],"interval":30}}}"#,
    )
    .unwrap();
    std::fs::write(
        &src,
        r#"{"instances":[{"name":"cache","command":"metrics","arguments":{"port":6379}}]}"#,
    )
    .unwrap();

    let spec = format!("{}:{}:{}:false", src.display(), defs.display(), out.display());
    let output = run(lookoutd().arg("--v3tov4").arg(&spec));
    assert!(output.status.success(), "stderr: {}", output.stderr);

    let converted = std::fs::read_to_string(&out).unwrap();
    assert!(converted.contains("redis-cache"));
    assert!(converted.contains("PORT"));

    // Same spec again without overwrite fails.
    let output = run(lookoutd().arg("--v3tov4").arg(&spec));
    assert!(!output.status.success());
    assert!(output.stderr.contains("overwrite"), "stderr: {}", output.stderr);
}
