// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the agent crate.
//!
//! Everything here is read-only; the agent never mutates its environment.

use std::path::PathBuf;

/// Root of the host's procfs, for containerized deployments that mount the
/// host's `/proc` elsewhere.
pub fn host_proc() -> PathBuf {
    path_or("HOST_PROC", "/proc")
}

/// Root of the host's `/etc`.
pub fn host_etc() -> PathBuf {
    path_or("HOST_ETC", "/etc")
}

/// Root of the host's `/var`.
pub fn host_var() -> PathBuf {
    path_or("HOST_VAR", "/var")
}

/// Proxy for plain HTTP, when the platform proxy env is set.
pub fn http_proxy() -> Option<String> {
    nonempty_var("HTTP_PROXY")
}

/// Proxy for HTTPS.
pub fn https_proxy() -> Option<String> {
    nonempty_var("HTTPS_PROXY")
}

fn path_or(var: &str, fallback: &str) -> PathBuf {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(fallback))
}

fn nonempty_var(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
