// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The boundary to the backend clients.
//!
//! Payload encoding and delivery are external collaborators; this emitter
//! is the in-process end of that seam, logging every emission it hands
//! over.

use tracing::debug;

use lookout_core::{EntityKey, Event, EventSink, InventorySink, PluginOutput};

/// Emitter used when no backend client is wired (also the `--dry_run`
/// behavior): payloads are logged and dropped.
#[derive(Default)]
pub struct LogEmitter;

impl EventSink for LogEmitter {
    fn emit(&self, event: Event, entity: &EntityKey) {
        match serde_json::to_string(&event) {
            Ok(payload) => debug!(entity = %entity, "event: {payload}"),
            Err(e) => debug!(entity = %entity, "unencodable event: {e}"),
        }
    }
}

impl InventorySink for LogEmitter {
    fn send(&self, output: PluginOutput) {
        debug!(
            plugin = %output.id,
            entity = %output.entity_key,
            records = output.data.len(),
            "inventory emission"
        );
    }
}
