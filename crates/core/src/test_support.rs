// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fakes and builders shared by this crate's tests and, via the
//! `test-support` feature, by the agent crate's tests.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::context::{AgentContext, EventSink, InventorySink, StaticHostname};
use crate::event::Event;
use crate::identity::LocalIdentityProvider;
use crate::inventory::PluginOutput;
use crate::EntityKey;

/// Event sink that records every emission.
#[derive(Default)]
pub struct FakeEventSink {
    pub emitted: Mutex<Vec<(Event, EntityKey)>>,
}

impl FakeEventSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<(Event, EntityKey)> {
        self.emitted.lock().clone()
    }
}

impl EventSink for FakeEventSink {
    fn emit(&self, event: Event, entity: &EntityKey) {
        self.emitted.lock().push((event, entity.clone()));
    }
}

/// Inventory sink that records every plugin output.
#[derive(Default)]
pub struct FakeInventorySink {
    pub sent: Mutex<Vec<PluginOutput>>,
}

impl FakeInventorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn outputs(&self) -> Vec<PluginOutput> {
        self.sent.lock().clone()
    }
}

impl InventorySink for FakeInventorySink {
    fn send(&self, output: PluginOutput) {
        self.sent.lock().push(output);
    }
}

/// Context wired to fake sinks, for plugin and scheduler tests.
pub struct TestContext {
    pub ctx: AgentContext,
    pub events: Arc<FakeEventSink>,
    pub inventory: Arc<FakeInventorySink>,
    pub identity: Arc<LocalIdentityProvider>,
    pub cancel: CancellationToken,
}

pub fn test_context() -> TestContext {
    test_context_with(Config::default())
}

pub fn test_context_with(config: Config) -> TestContext {
    let events = FakeEventSink::new();
    let inventory = FakeInventorySink::new();
    let identity = LocalIdentityProvider::new();
    let cancel = CancellationToken::new();
    let ctx = AgentContext::new(
        Arc::new(config),
        identity.clone(),
        Arc::new(StaticHostname("test-host".to_string())),
        cancel.clone(),
        events.clone(),
        inventory.clone(),
    );
    TestContext { ctx, events, inventory, identity, cancel }
}
