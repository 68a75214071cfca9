// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lookout-core: domain types shared by the lookout agent runtime.
//!
//! Everything here is either a value type carried on the agent's internal
//! buses (events, inventory datasets, control messages) or a seam the
//! runtime dispatches through (samplers, plugins, sinks, the clock).

pub mod clock;
pub mod config;
pub mod context;
pub mod event;
pub mod identity;
pub mod inventory;
pub mod message;
pub mod plugin;
pub mod plugin_id;
pub mod sampler;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{Config, ConfigError};
pub use context::{AgentContext, EventSink, HostnameResolver, InventorySink};
pub use event::{Event, EventBatch};
pub use identity::{AgentIdentity, IdentityProvider, LocalIdentityProvider};
pub use inventory::{InventoryDataset, InventoryItem, PluginOutput, Sortable};
pub use message::Message;
pub use plugin::Plugin;
pub use plugin_id::{ParsePluginIdError, PluginId};
pub use sampler::{Sampler, SamplerError};

/// Opaque key identifying the emitting host or sub-entity.
///
/// Passed through every event and inventory emission unchanged.
pub type EntityKey = smol_str::SmolStr;
