// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin seam: long-running producers of inventory datasets.

use async_trait::async_trait;

use crate::context::AgentContext;
use crate::plugin_id::PluginId;

/// A long-running inventory producer keyed by a [`PluginId`].
///
/// `run` is expected to loop until the context's cancellation token fires.
/// Implementations hold their mutable state behind interior mutability so
/// the runtime can re-run reconnecting plugins on identity change.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn id(&self) -> PluginId;

    /// Display name for logs. External integrations override this with the
    /// integration's name.
    fn display_name(&self) -> String {
        self.id().to_string()
    }

    /// True when this plugin wraps an external integration program.
    fn external(&self) -> bool {
        false
    }

    async fn run(&self, ctx: AgentContext);
}
