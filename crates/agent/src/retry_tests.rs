// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn secs(d: Duration) -> f64 {
    d.as_secs_f64()
}

#[test]
fn schedule_doubles_with_bounded_jitter() {
    let mut backoff = Backoff::new();
    let d1 = secs(backoff.next_delay());
    let d2 = secs(backoff.next_delay());
    let d3 = secs(backoff.next_delay());
    assert!((0.9..=1.1).contains(&d1), "first delay {d1}");
    assert!((1.8..=2.2).contains(&d2), "second delay {d2}");
    assert!((3.6..=4.4).contains(&d3), "third delay {d3}");
}

#[test]
fn schedule_caps_at_max() {
    let mut backoff = Backoff::with_schedule(Duration::from_secs(1), Duration::from_secs(4));
    for _ in 0..10 {
        backoff.next_delay();
    }
    let capped = secs(backoff.next_delay());
    assert!(capped <= 4.4, "capped delay {capped}");
    assert!(capped >= 3.6, "capped delay {capped}");
}

#[test]
fn reset_returns_to_base() {
    let mut backoff = Backoff::new();
    for _ in 0..5 {
        backoff.next_delay();
    }
    backoff.reset();
    let d = secs(backoff.next_delay());
    assert!((0.9..=1.1).contains(&d), "delay after reset {d}");
}

#[tokio::test]
async fn empty_url_is_immediately_reachable() {
    let client = reqwest::Client::new();
    let mut backoff = Backoff::new();
    let cancel = CancellationToken::new();
    wait_for_network(&client, "", Duration::from_secs(1), 0, &mut backoff, &cancel)
        .await
        .unwrap();
}

#[tokio::test]
async fn unparseable_url_is_fatal() {
    let client = reqwest::Client::new();
    let mut backoff = Backoff::new();
    let cancel = CancellationToken::new();
    let err = wait_for_network(
        &client,
        "http://",
        Duration::from_secs(1),
        3,
        &mut backoff,
        &cancel,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ProbeError::Fatal { .. }), "got {err:?}");
}

#[tokio::test]
async fn refused_connection_exhausts_retries() {
    let client = reqwest::Client::new();
    // Tight schedule so the test does not sleep for real.
    let mut backoff =
        Backoff::with_schedule(Duration::from_millis(1), Duration::from_millis(2));
    let cancel = CancellationToken::new();
    // Port 9 (discard) is unbound in the test environment.
    let err = wait_for_network(
        &client,
        "http://127.0.0.1:9/",
        Duration::from_millis(200),
        2,
        &mut backoff,
        &cancel,
    )
    .await
    .unwrap_err();
    match err {
        ProbeError::Exhausted { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("expected exhaustion, got {other:?}"),
    }
}

#[tokio::test]
async fn cancellation_interrupts_the_wait() {
    let client = reqwest::Client::new();
    let mut backoff = Backoff::with_schedule(Duration::from_secs(60), Duration::from_secs(60));
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = wait_for_network(
        &client,
        "http://127.0.0.1:9/",
        Duration::from_millis(200),
        -1,
        &mut backoff,
        &cancel,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ProbeError::Cancelled), "got {err:?}");
}
