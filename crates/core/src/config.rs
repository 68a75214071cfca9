// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent configuration: loaded once at boot, read-only for the process
//! lifetime.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Placeholder written into the config inventory for secret-bearing fields.
const REDACTED: &str = "<redacted>";

/// Fields never emitted through [`Config::fields`].
const FIELDS_SKIPLIST: &[&str] = &["files_config_on", "debug_log_sec", "offline_logging_mode"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Immutable agent configuration.
///
/// Loaded from a TOML file; every field has a serde default so a minimal
/// file (or none at all) yields a runnable config.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Backend license key. Redacted in the config inventory.
    pub license_key: String,
    /// Base URL of the event/inventory collector.
    pub collector_url: String,
    /// Reachability probe timeout per attempt, seconds.
    pub startup_connection_timeout_sec: u64,
    /// Reachability probe attempts; negative means retry forever.
    pub startup_connection_retries: i64,

    /// Command-channel base URL. Empty disables the command channel.
    pub command_channel_url: String,
    /// Command-channel endpoint path.
    pub command_channel_endpoint: String,
    /// Command-channel poll interval, seconds.
    pub command_channel_interval_sec: u64,

    /// Log verbosity: 0 info, 1 debug, >=2 trace.
    pub verbose: u8,
    /// Log format: "text" or "json".
    pub log_format: String,
    /// Optional log file; when set, logs tee to stdout and the file.
    pub log_file: Option<PathBuf>,
    /// Whether the log forwarder sidecar is supervised.
    pub log_forward: bool,

    /// Agent state directory; `external.d` lives under it.
    pub agent_dir: PathBuf,
    /// Directories scanned for integration configurations.
    pub integrations_dirs: Vec<PathBuf>,
    /// Flush interval for the external-files inventory plugin, seconds.
    pub external_files_flush_sec: u64,

    /// Status HTTP surface.
    pub status_server_enabled: bool,
    pub status_server_host: String,
    pub status_server_port: u16,
    /// TCP ingest surface.
    pub tcp_server_enabled: bool,
    pub tcp_server_port: u16,
    /// Certificate settings accepted for compatibility; TLS terminates
    /// outside the process.
    pub ingest_cert_file: Option<PathBuf>,
    pub ingest_key_file: Option<PathBuf>,

    /// Shared HTTP client timeout, seconds.
    pub client_timeout_sec: u64,
    /// Worker-thread hint for the runtime; 0 = number of cores.
    pub max_procs: usize,
    /// Instrumentation selector; "apm" enables the forwarding variant.
    pub self_instrumentation: String,
    /// Optional proxy URL. Replaced by a placeholder in the inventory.
    pub proxy: Option<String>,
    /// Hostname override; when set the resolver returns it verbatim.
    pub override_hostname: Option<String>,

    /// Feature flags applied at boot; the command channel mutates a copy.
    pub features: HashMap<String, bool>,

    // Internal toggles, never inventoried.
    pub files_config_on: bool,
    pub debug_log_sec: u64,
    pub offline_logging_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            license_key: String::new(),
            collector_url: String::new(),
            startup_connection_timeout_sec: 10,
            startup_connection_retries: 6,
            command_channel_url: String::new(),
            command_channel_endpoint: "/agent_commands/v1/commands".to_string(),
            command_channel_interval_sec: 60,
            verbose: 0,
            log_format: "text".to_string(),
            log_file: None,
            log_forward: false,
            agent_dir: default_agent_dir(),
            integrations_dirs: Vec::new(),
            external_files_flush_sec: 15,
            status_server_enabled: false,
            status_server_host: "127.0.0.1".to_string(),
            status_server_port: 8003,
            tcp_server_enabled: false,
            tcp_server_port: 8004,
            ingest_cert_file: None,
            ingest_key_file: None,
            client_timeout_sec: 30,
            max_procs: 0,
            self_instrumentation: String::new(),
            proxy: None,
            override_hostname: None,
            features: HashMap::new(),
            files_config_on: false,
            debug_log_sec: 0,
            offline_logging_mode: false,
        }
    }
}

fn default_agent_dir() -> PathBuf {
    dirs_fallback().join("lookout")
}

fn dirs_fallback() -> PathBuf {
    std::env::var_os("LOOKOUT_STATE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/var/db"))
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config: Config = toml::from_str(&raw)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command_channel_interval_sec == 0 {
            return Err(ConfigError::Invalid(
                "command_channel_interval_sec must be at least 1".to_string(),
            ));
        }
        if self.external_files_flush_sec == 0 {
            return Err(ConfigError::Invalid(
                "external_files_flush_sec must be at least 1".to_string(),
            ));
        }
        if self.log_format != "text" && self.log_format != "json" {
            return Err(ConfigError::Invalid(format!(
                "log_format must be \"text\" or \"json\", got {:?}",
                self.log_format
            )));
        }
        Ok(())
    }

    /// Directory holding external-files watch declarations.
    pub fn external_files_dir(&self) -> PathBuf {
        self.agent_dir.join("external.d")
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout_sec)
    }

    pub fn startup_connection_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_connection_timeout_sec)
    }

    pub fn command_channel_interval(&self) -> Duration {
        Duration::from_secs(self.command_channel_interval_sec)
    }

    pub fn external_files_flush_interval(&self) -> Duration {
        Duration::from_secs(self.external_files_flush_sec)
    }

    /// Ordered `(name, value)` enumeration of the configuration for the
    /// config inventory plugin.
    ///
    /// Skiplisted fields are omitted; the license key and proxy are replaced
    /// by a placeholder when non-empty.
    pub fn fields(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        let mut push = |name: &str, value: String| {
            if !FIELDS_SKIPLIST.contains(&name) {
                out.push((name.to_string(), value));
            }
        };

        push("agent_dir", self.agent_dir.display().to_string());
        push("client_timeout_sec", self.client_timeout_sec.to_string());
        push("collector_url", self.collector_url.clone());
        push("command_channel_endpoint", self.command_channel_endpoint.clone());
        push("command_channel_interval_sec", self.command_channel_interval_sec.to_string());
        push("command_channel_url", self.command_channel_url.clone());
        push("debug_log_sec", self.debug_log_sec.to_string());
        push("external_files_flush_sec", self.external_files_flush_sec.to_string());
        push(
            "features",
            {
                let mut flags: Vec<String> = self
                    .features
                    .iter()
                    .map(|(name, enabled)| format!("{name}={enabled}"))
                    .collect();
                flags.sort();
                flags.join(",")
            },
        );
        push("files_config_on", self.files_config_on.to_string());
        push(
            "integrations_dirs",
            self.integrations_dirs
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(","),
        );
        push(
            "license_key",
            if self.license_key.is_empty() { String::new() } else { REDACTED.to_string() },
        );
        push("log_file", self.log_file.as_ref().map(|p| p.display().to_string()).unwrap_or_default());
        push("log_format", self.log_format.clone());
        push("log_forward", self.log_forward.to_string());
        push("max_procs", self.max_procs.to_string());
        push("offline_logging_mode", self.offline_logging_mode.to_string());
        push("override_hostname", self.override_hostname.clone().unwrap_or_default());
        push(
            "proxy",
            match &self.proxy {
                Some(p) if !p.is_empty() => REDACTED.to_string(),
                _ => String::new(),
            },
        );
        push("self_instrumentation", self.self_instrumentation.clone());
        push("startup_connection_retries", self.startup_connection_retries.to_string());
        push("startup_connection_timeout_sec", self.startup_connection_timeout_sec.to_string());
        push("status_server_enabled", self.status_server_enabled.to_string());
        push("status_server_host", self.status_server_host.clone());
        push("status_server_port", self.status_server_port.to_string());
        push("tcp_server_enabled", self.tcp_server_enabled.to_string());
        push("tcp_server_port", self.tcp_server_port.to_string());
        push("verbose", self.verbose.to_string());

        out
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
