// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inventory plugin emitting the agent's own (redacted) configuration.

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use lookout_core::{AgentContext, InventoryDataset, Plugin, PluginId, PluginOutput, Sortable};

/// One configuration entry, keyed by field name.
#[derive(Clone, Debug, Serialize)]
pub struct ConfigField {
    pub name: String,
    pub value: String,
}

impl Sortable for ConfigField {
    fn sort_key(&self) -> String {
        self.name.clone()
    }
}

/// Emits the `fields()` enumeration of the loaded configuration under
/// `metadata/agent_config`. Member of the reconnect set, so a new identity
/// receives the dataset again.
#[derive(Default)]
pub struct AgentConfigPlugin;

impl AgentConfigPlugin {
    pub fn plugin_id() -> PluginId {
        PluginId::new("metadata", "agent_config")
    }
}

#[async_trait]
impl Plugin for AgentConfigPlugin {
    fn id(&self) -> PluginId {
        Self::plugin_id()
    }

    async fn run(&self, ctx: AgentContext) {
        let records = ctx
            .config
            .fields()
            .into_iter()
            .map(|(name, value)| ConfigField { name, value });
        let data = match InventoryDataset::from_records(records) {
            Ok(data) => data,
            Err(e) => {
                warn!("cannot build agent config inventory: {e}");
                return;
            }
        };
        ctx.send_data(PluginOutput { id: self.id(), entity_key: ctx.agent_key(), data });
    }
}

#[cfg(test)]
#[path = "config_attrs_tests.rs"]
mod tests;
