// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial(env)]
fn hostname_prefers_the_override() {
    let mut config = Config::default();
    config.override_hostname = Some("fleet-web-1".to_string());
    let resolver = resolve_hostname(&config);
    assert_eq!(resolver.0, "fleet-web-1");
}

#[test]
#[serial(env)]
fn hostname_falls_back_to_env_then_placeholder() {
    std::env::set_var("HOSTNAME", "env-host");
    assert_eq!(resolve_hostname(&Config::default()).0, "env-host");

    std::env::remove_var("HOSTNAME");
    assert_eq!(resolve_hostname(&Config::default()).0, "unknown-host");
}

#[test]
fn boot_errors_name_the_failed_step() {
    let config_err = BootError::Config(ConfigError::Invalid("x".to_string()));
    assert!(config_err.to_string().starts_with("cannot load configuration"));

    let probe_err = BootError::Network(ProbeError::Cancelled);
    assert!(probe_err.to_string().starts_with("collector unreachable"));
}

#[test]
fn logging_supervisor_acknowledges_lifecycle_commands() {
    let supervisor = LoggingSupervisor;
    supervisor.start("nginx", &["-v".to_string()]).unwrap();
    supervisor.stop("nginx").unwrap();
}

#[test]
fn process_init_is_idempotent() {
    process_init();
    process_init();
}
