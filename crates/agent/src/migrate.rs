// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Legacy (v3) integration configuration migration.
//!
//! v3 split an integration across a definition file (commands) and an
//! instances file (which command to run, with what arguments). v4 is one
//! document listing executable integrations. `--v3tov4` takes
//! `src:defs:out:overwrite` and writes the converted document.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("migration spec must be src:defs:out:overwrite, got {0:?}")]
    BadSpec(String),

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("output {0} exists; pass overwrite=true to replace it")]
    OutputExists(PathBuf),

    #[error("instance {instance:?} references unknown command {command:?}")]
    UnknownCommand { instance: String, command: String },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Parsed `src:defs:out:overwrite` argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrateSpec {
    pub src: PathBuf,
    pub defs: PathBuf,
    pub out: PathBuf,
    pub overwrite: bool,
}

impl FromStr for MigrateSpec {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let [src, defs, out, overwrite] = parts.as_slice() else {
            return Err(MigrateError::BadSpec(s.to_string()));
        };
        if src.is_empty() || defs.is_empty() || out.is_empty() {
            return Err(MigrateError::BadSpec(s.to_string()));
        }
        let overwrite = match *overwrite {
            "true" => true,
            "false" => false,
            _ => return Err(MigrateError::BadSpec(s.to_string())),
        };
        Ok(Self {
            src: PathBuf::from(*src),
            defs: PathBuf::from(*defs),
            out: PathBuf::from(*out),
            overwrite,
        })
    }
}

#[derive(Debug, Deserialize)]
struct V3Definition {
    name: String,
    #[serde(default)]
    commands: std::collections::HashMap<String, V3Command>,
}

#[derive(Debug, Deserialize)]
struct V3Command {
    #[serde(default)]
    command: Vec<String>,
    #[serde(default)]
    interval: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct V3Instances {
    #[serde(default)]
    instances: Vec<V3Instance>,
}

#[derive(Debug, Deserialize)]
struct V3Instance {
    name: String,
    command: String,
    #[serde(default)]
    arguments: serde_json::Map<String, Value>,
    #[serde(default)]
    labels: serde_json::Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct V4Document {
    integrations: Vec<V4Integration>,
}

#[derive(Debug, Serialize)]
struct V4Integration {
    name: String,
    exec: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interval: Option<String>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    env: serde_json::Map<String, Value>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    labels: serde_json::Map<String, Value>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, MigrateError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|source| MigrateError::Read { path: path.to_path_buf(), source })?;
    serde_json::from_str(&raw)
        .map_err(|source| MigrateError::Parse { path: path.to_path_buf(), source })
}

/// Convert one definition + instances pair into a v4 document.
pub fn migrate(spec: &MigrateSpec) -> Result<(), MigrateError> {
    if spec.out.exists() && !spec.overwrite {
        return Err(MigrateError::OutputExists(spec.out.clone()));
    }

    let definition: V3Definition = read_json(&spec.defs)?;
    let instances: V3Instances = read_json(&spec.src)?;

    let mut integrations = Vec::new();
    for instance in instances.instances {
        let command = definition.commands.get(&instance.command).ok_or_else(|| {
            MigrateError::UnknownCommand {
                instance: instance.name.clone(),
                command: instance.command.clone(),
            }
        })?;
        // v3 passed instance arguments to the integration as environment
        // variables, upper-cased.
        let env = instance
            .arguments
            .into_iter()
            .map(|(k, v)| (k.to_uppercase(), v))
            .collect();
        integrations.push(V4Integration {
            name: format!("{}-{}", definition.name, instance.name),
            exec: command.command.clone(),
            interval: command.interval.map(|secs| format!("{secs}s")),
            env,
            labels: instance.labels,
        });
    }

    let document = V4Document { integrations };
    let pretty = serde_json::to_string_pretty(&document)
        .map_err(|source| MigrateError::Parse { path: spec.out.clone(), source })?;
    std::fs::write(&spec.out, pretty)
        .map_err(|source| MigrateError::Write { path: spec.out.clone(), source })?;
    Ok(())
}

#[cfg(test)]
#[path = "migrate_tests.rs"]
mod tests;
