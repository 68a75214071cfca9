// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn stamp_assigns_once() {
    let mut event = Event::of_type("AgentHeartbeat");
    event.stamp(1_700_000_000);
    event.stamp(1_700_000_999);
    assert_eq!(event.timestamp, 1_700_000_000);
}

#[test]
fn fields_flatten_into_payload() {
    let event = Event::of_type("StorageSample").with_field("device", "sda1");
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["eventType"], "StorageSample");
    assert_eq!(json["device"], "sda1");
    assert_eq!(json["timestamp"], 0);
}

#[test]
fn event_type_accessor() {
    assert_eq!(Event::of_type("NetworkSample").event_type(), Some("NetworkSample"));
    assert_eq!(Event::default().event_type(), None);
}
