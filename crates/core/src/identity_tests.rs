// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn local_provider_mints_nonempty_identity() {
    let provider = LocalIdentityProvider::new();
    assert!(!provider.identity().is_empty());
}

#[test]
fn unregistered_provider_starts_empty() {
    let provider = LocalIdentityProvider::unregistered();
    assert!(provider.identity().is_empty());
}

#[tokio::test]
async fn set_notifies_subscribers() {
    let provider = LocalIdentityProvider::unregistered();
    let mut rx = provider.subscribe();

    provider.set(AgentIdentity { agent_id: "assigned-1".to_string() });

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().agent_id, "assigned-1");
    assert_eq!(provider.identity().agent_id, "assigned-1");
}
