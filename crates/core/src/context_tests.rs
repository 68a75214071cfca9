// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::identity::AgentIdentity;
use crate::test_support::test_context;
use crate::Event;

#[test]
fn agent_key_prefers_identity_over_hostname() {
    let t = test_context();
    let key = t.ctx.agent_key();
    assert_eq!(key.as_str(), t.ctx.identity.identity().agent_id);
}

#[test]
fn agent_key_falls_back_to_hostname_when_unregistered() {
    let t = test_context();
    // Downcast is not available through the trait; build a fresh context
    // with an unregistered provider instead.
    let unregistered = crate::identity::LocalIdentityProvider::unregistered();
    let ctx = crate::AgentContext::new(
        t.ctx.config.clone(),
        unregistered,
        t.ctx.hostname.clone(),
        t.cancel.clone(),
        t.events.clone(),
        t.inventory.clone(),
    );
    assert_eq!(ctx.agent_key().as_str(), "test-host");
}

#[test]
fn emit_event_reaches_the_sink() {
    let t = test_context();
    t.ctx.emit_event(Event::of_type("AgentHeartbeat"), &"host-1".into());
    let events = t.events.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0.event_type(), Some("AgentHeartbeat"));
    assert_eq!(events[0].1.as_str(), "host-1");
}

#[test]
fn identity_change_is_observable_through_context() {
    let t = test_context();
    let rx = t.ctx.identity.subscribe();
    t.identity.set(AgentIdentity { agent_id: "rotated".into() });
    assert!(rx.has_changed().unwrap());
    assert_eq!(t.ctx.agent_key().as_str(), "rotated");
}
