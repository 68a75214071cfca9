// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lookout_core::test_support::test_context;
use serde_json::json;

#[tokio::test]
async fn status_and_ingest_round_trip() {
    let t = test_context();
    let (addr, listener) = bind("127.0.0.1", 0).await.unwrap();
    let server = tokio::spawn(serve(listener, t.ctx.clone()));

    let client = reqwest::Client::new();

    let status: serde_json::Value = client
        .get(format!("http://{addr}/v1/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(status["checks_healthy"], true);

    let ready = client
        .get(format!("http://{addr}/v1/status/ready"))
        .send()
        .await
        .unwrap();
    assert_eq!(ready.text().await.unwrap(), "ok");

    let response = client
        .post(format!("http://{addr}/v1/data"))
        .json(&json!([{"eventType": "CustomSample", "value": 7}]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let events = t.events.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0.event_type(), Some("CustomSample"));
    assert_ne!(events[0].0.timestamp, 0);

    t.cancel.cancel();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn bad_listen_address_is_reported() {
    let err = bind("not-an-ip", 0).await.unwrap_err();
    assert!(matches!(err, SurfaceError::Address(..)));
}
