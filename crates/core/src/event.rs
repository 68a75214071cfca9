// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events produced by samplers and consumed by the scheduler's sender.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single telemetry event.
///
/// `timestamp` is zero until the scheduler consumer stamps it; it is
/// assigned exactly once, in UNIX epoch seconds.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub timestamp: u64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Event {
    /// Create an event with an `eventType` field, the minimum every
    /// downstream sink requires.
    pub fn of_type(event_type: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("eventType".to_string(), Value::String(event_type.to_string()));
        Self { timestamp: 0, fields }
    }

    /// Attach a field, builder style.
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Stamp the event. First write wins.
    pub fn stamp(&mut self, epoch_secs: u64) {
        if self.timestamp == 0 {
            self.timestamp = epoch_secs;
        }
    }

    pub fn event_type(&self) -> Option<&str> {
        self.fields.get("eventType").and_then(Value::as_str)
    }
}

/// Ordered batch of events, the unit pushed through the scheduler queue.
pub type EventBatch = Vec<Event>;

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
