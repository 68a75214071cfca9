// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inventory plugin runtime: registry, deprecation, emission gating, and
//! identity-change reconnection.

pub mod config_attrs;
pub mod external_files;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{info, warn};

use lookout_core::{
    AgentContext, EntityKey, InventoryDataset, InventorySink, Plugin, PluginId, PluginOutput,
};

use crate::supervisor::{spawn_supervised, PanicPolicy};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("plugin {0} already registered")]
    Duplicate(PluginId),

    /// Deprecation is permanent for the process lifetime.
    #[error("plugin id {0} is deprecated")]
    Deprecated(PluginId),
}

#[derive(Default)]
struct RegistryState {
    plugins: HashMap<PluginId, Arc<dyn Plugin>>,
    deprecated: HashSet<PluginId>,
    reconnecting: Vec<Arc<dyn Plugin>>,
}

/// Process-wide plugin registry and emission gate.
///
/// The runtime is the context's inventory sink: emissions from plugins pass
/// through it, get gated against the registry, sorted, and handed to the
/// downstream sink. Plugins never hold a reference back to the runtime.
pub struct PluginRuntime {
    state: RwLock<RegistryState>,
    downstream: Arc<dyn InventorySink>,
}

impl PluginRuntime {
    pub fn new(downstream: Arc<dyn InventorySink>) -> Arc<Self> {
        Arc::new(Self { state: RwLock::new(RegistryState::default()), downstream })
    }

    /// Register a plugin. Duplicate ids and deprecated ids are refused.
    pub fn register(&self, plugin: Arc<dyn Plugin>) -> Result<(), RegistryError> {
        let id = plugin.id();
        let mut state = self.state.write();
        if state.deprecated.contains(&id) {
            return Err(RegistryError::Deprecated(id));
        }
        if state.plugins.contains_key(&id) {
            return Err(RegistryError::Duplicate(id));
        }
        info!(plugin = %id, name = %plugin.display_name(), "plugin registered");
        state.plugins.insert(id, plugin);
        Ok(())
    }

    /// Deprecate an id: emit one empty dataset (downstream deletion) and
    /// refuse any future registration under it.
    pub fn deprecate(&self, id: &PluginId, entity: &EntityKey) {
        {
            let mut state = self.state.write();
            if !state.deprecated.insert(id.clone()) {
                return;
            }
            state.plugins.remove(id);
        }
        info!(plugin = %id, "plugin deprecated, clearing its inventory");
        self.downstream.send(PluginOutput {
            id: id.clone(),
            entity_key: entity.clone(),
            data: InventoryDataset::empty(),
        });
    }

    /// Add a plugin to the reconnect set: it is re-run once whenever the
    /// agent identity changes, so the new identity receives full inventory.
    pub fn add_reconnecting(&self, plugin: Arc<dyn Plugin>) {
        self.state.write().reconnecting.push(plugin);
    }

    pub fn is_registered(&self, id: &PluginId) -> bool {
        self.state.read().plugins.contains_key(id)
    }

    /// Spawn every registered plugin plus the identity watcher.
    pub fn start_all(self: Arc<Self>, ctx: &AgentContext) {
        let plugins: Vec<Arc<dyn Plugin>> =
            self.state.read().plugins.values().cloned().collect();
        for plugin in plugins {
            let ctx = ctx.clone();
            let label = format!("plugin:{}", plugin.id());
            spawn_supervised(&label, PanicPolicy::LogAndContinue, async move {
                plugin.run(ctx).await;
            });
        }
        self.spawn_identity_watcher(ctx);
    }

    /// Re-run reconnect-set plugins in detached tasks on identity change.
    fn spawn_identity_watcher(self: Arc<Self>, ctx: &AgentContext) {
        let runtime = self;
        let ctx = ctx.clone();
        spawn_supervised("plugin-reconnect", PanicPolicy::LogAndContinue, async move {
            let mut rx = ctx.identity.subscribe();
            loop {
                tokio::select! {
                    _ = ctx.cancel.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let members: Vec<Arc<dyn Plugin>> =
                            runtime.state.read().reconnecting.clone();
                        info!(count = members.len(), "identity changed, re-running reconnect set");
                        for plugin in members {
                            let ctx = ctx.clone();
                            let label = format!("reconnect:{}", plugin.id());
                            spawn_supervised(&label, PanicPolicy::LogAndContinue, async move {
                                plugin.run(ctx).await;
                            });
                        }
                    }
                }
            }
        });
    }
}

impl InventorySink for PluginRuntime {
    /// Gate, order, forward.
    fn send(&self, mut output: PluginOutput) {
        {
            let state = self.state.read();
            if state.deprecated.contains(&output.id) {
                warn!(plugin = %output.id, "dropping emission from deprecated plugin");
                return;
            }
            if !state.plugins.contains_key(&output.id) {
                warn!(plugin = %output.id, "dropping emission from unregistered plugin");
                return;
            }
        }
        output.data.sort();
        self.downstream.send(output);
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
