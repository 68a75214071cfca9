// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The context bundle handed to every plugin and sampler task.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::event::Event;
use crate::identity::IdentityProvider;
use crate::inventory::PluginOutput;
use crate::EntityKey;

/// Destination for timestamped events.
///
/// Implementations forward to the backend emitter; tests capture.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event, entity: &EntityKey);
}

/// Destination for inventory emissions.
///
/// Passed to the context as a trait object so plugins never hold a
/// reference back to the runtime that owns them.
pub trait InventorySink: Send + Sync {
    fn send(&self, output: PluginOutput);
}

/// Hostname resolution seam. The concrete resolver (DNS, cloud metadata)
/// is an external collaborator.
pub trait HostnameResolver: Send + Sync {
    fn hostname(&self) -> String;
}

/// Resolver honoring the `override_hostname` setting, falling back to a
/// fixed value.
pub struct StaticHostname(pub String);

impl HostnameResolver for StaticHostname {
    fn hostname(&self) -> String {
        self.0.clone()
    }
}

/// Shared, read-only bundle passed to plugins and samplers.
///
/// Created once during boot; no field is re-assigned after start. Cloning
/// is cheap (all fields are handles).
#[derive(Clone)]
pub struct AgentContext {
    pub config: Arc<Config>,
    pub identity: Arc<dyn IdentityProvider>,
    pub hostname: Arc<dyn HostnameResolver>,
    pub cancel: CancellationToken,
    events: Arc<dyn EventSink>,
    inventory: Arc<dyn InventorySink>,
}

impl AgentContext {
    pub fn new(
        config: Arc<Config>,
        identity: Arc<dyn IdentityProvider>,
        hostname: Arc<dyn HostnameResolver>,
        cancel: CancellationToken,
        events: Arc<dyn EventSink>,
        inventory: Arc<dyn InventorySink>,
    ) -> Self {
        Self { config, identity, hostname, cancel, events, inventory }
    }

    /// Entity key for emissions from the agent itself.
    pub fn agent_key(&self) -> EntityKey {
        let identity = self.identity.identity();
        if identity.is_empty() {
            EntityKey::new(self.hostname.hostname())
        } else {
            EntityKey::new(identity.agent_id)
        }
    }

    pub fn emit_event(&self, event: Event, entity: &EntityKey) {
        self.events.emit(event, entity);
    }

    /// Hand a plugin output to the inventory sink.
    ///
    /// Ordering and registration gating happen in the sink (the plugin
    /// runtime); callers only provide the payload.
    pub fn send_data(&self, output: PluginOutput) {
        self.inventory.send(output);
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
