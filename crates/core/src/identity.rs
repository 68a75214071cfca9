// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identity: the value the backend knows this host by, plus change
//! notification for components that must re-emit state when it rotates.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Identity assigned to this agent instance.
///
/// Empty until registration completes; the command channel sends the empty
/// form on its first fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub agent_id: String,
}

impl AgentIdentity {
    pub fn is_empty(&self) -> bool {
        self.agent_id.is_empty()
    }
}

/// Read access to the current identity plus change subscription.
pub trait IdentityProvider: Send + Sync {
    fn identity(&self) -> AgentIdentity;

    /// Subscribe to identity changes. The receiver yields the new identity
    /// after every rotation.
    fn subscribe(&self) -> watch::Receiver<AgentIdentity>;
}

/// In-process identity provider.
///
/// Mints a v4 uuid on first use; the remote registration service (out of
/// scope here) replaces it through `set` when it assigns a canonical id.
pub struct LocalIdentityProvider {
    current: RwLock<AgentIdentity>,
    tx: watch::Sender<AgentIdentity>,
}

impl LocalIdentityProvider {
    pub fn new() -> Arc<Self> {
        let identity = AgentIdentity { agent_id: uuid::Uuid::new_v4().to_string() };
        let (tx, _) = watch::channel(identity.clone());
        Arc::new(Self { current: RwLock::new(identity), tx })
    }

    /// Start without an identity; the first fetch goes out empty.
    pub fn unregistered() -> Arc<Self> {
        let (tx, _) = watch::channel(AgentIdentity::default());
        Arc::new(Self { current: RwLock::new(AgentIdentity::default()), tx })
    }

    /// Replace the identity and notify subscribers.
    pub fn set(&self, identity: AgentIdentity) {
        *self.current.write() = identity.clone();
        let _ = self.tx.send(identity);
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn identity(&self) -> AgentIdentity {
        self.current.read().clone()
    }

    fn subscribe(&self) -> watch::Receiver<AgentIdentity> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
