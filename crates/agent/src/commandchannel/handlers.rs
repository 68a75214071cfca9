// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in command handlers: feature flags, integration lifecycle, and
//! channel backoff. All handlers are idempotent for identical payloads.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{BackoffSlot, CommandHandler, HandlerError};

/// Runtime feature-flag state, seeded from configuration and mutated only
/// by the command channel.
#[derive(Default)]
pub struct FeatureManager {
    flags: RwLock<HashMap<String, bool>>,
}

impl FeatureManager {
    pub fn new(seed: HashMap<String, bool>) -> Arc<Self> {
        Arc::new(Self { flags: RwLock::new(seed) })
    }

    pub fn set(&self, flag: &str, enabled: bool) {
        self.flags.write().insert(flag.to_string(), enabled);
    }

    pub fn enabled(&self, flag: &str) -> bool {
        self.flags.read().get(flag).copied().unwrap_or(false)
    }

    pub fn snapshot(&self) -> HashMap<String, bool> {
        self.flags.read().clone()
    }
}

/// Seam to whatever runs external integrations. Process spawning itself is
/// outside this crate.
pub trait IntegrationSupervisor: Send + Sync {
    fn start(&self, name: &str, args: &[String]) -> Result<(), String>;
    fn stop(&self, name: &str) -> Result<(), String>;
}

#[derive(Debug, Deserialize)]
struct FeatureFlagArgs {
    #[serde(default)]
    category: Option<String>,
    flag: String,
    enabled: bool,
}

#[derive(Debug, Deserialize)]
struct IntegrationArgs {
    integration_name: String,
    #[serde(default)]
    integration_args: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BackoffArgs {
    seconds: u64,
}

fn decode<T: serde::de::DeserializeOwned>(payload: &Value) -> Result<T, HandlerError> {
    serde_json::from_value(payload.clone())
        .map_err(|e| HandlerError(format!("bad command payload: {e}")))
}

/// Handler for `set_feature_flag`.
pub fn set_feature_flag(features: Arc<FeatureManager>) -> CommandHandler {
    Arc::new(move |payload| {
        let args: FeatureFlagArgs = decode(payload)?;
        info!(
            flag = %args.flag,
            category = args.category.as_deref().unwrap_or(""),
            enabled = args.enabled,
            "feature flag from command channel"
        );
        features.set(&args.flag, args.enabled);
        Ok(())
    })
}

/// Handler for `run_integration`.
pub fn run_integration(supervisor: Arc<dyn IntegrationSupervisor>) -> CommandHandler {
    Arc::new(move |payload| {
        let args: IntegrationArgs = decode(payload)?;
        supervisor
            .start(&args.integration_name, &args.integration_args)
            .map_err(HandlerError)
    })
}

/// Handler for `stop_integration`.
pub fn stop_integration(supervisor: Arc<dyn IntegrationSupervisor>) -> CommandHandler {
    Arc::new(move |payload| {
        let args: IntegrationArgs = decode(payload)?;
        supervisor.stop(&args.integration_name).map_err(HandlerError)
    })
}

/// Handler for `backoff_command_channel`.
pub fn backoff_command_channel(slot: BackoffSlot) -> CommandHandler {
    Arc::new(move |payload| {
        let args: BackoffArgs = decode(payload)?;
        info!(seconds = args.seconds, "command channel backoff requested");
        slot.request(args.seconds);
        Ok(())
    })
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
