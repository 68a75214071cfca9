// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::handlers::backoff_command_channel;
use super::*;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::VecDeque;
use tokio::time::Instant;

use lookout_core::identity::LocalIdentityProvider;

/// Scripted API: pops one response per fetch, then keeps returning empty
/// batches. Records the virtual time of every fetch.
struct FakeApi {
    responses: Mutex<VecDeque<Result<Vec<Command>, FetchError>>>,
    times: Mutex<Vec<Instant>>,
}

impl FakeApi {
    fn with_responses(responses: Vec<Result<Vec<Command>, FetchError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            times: Mutex::new(Vec::new()),
        })
    }

    fn fetch_count(&self) -> usize {
        self.times.lock().len()
    }

    fn times(&self) -> Vec<Instant> {
        self.times.lock().clone()
    }
}

#[async_trait]
impl CommandApi for FakeApi {
    async fn fetch(&self, _identity: &AgentIdentity) -> Result<Vec<Command>, FetchError> {
        self.times.lock().push(Instant::now());
        self.responses.lock().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

fn command(name: &str, arguments: Value) -> Command {
    Command { id: 0, name: name.to_string(), arguments }
}

fn recording_handler(log: Arc<Mutex<Vec<String>>>, tag: &str) -> CommandHandler {
    let tag = tag.to_string();
    Arc::new(move |payload| {
        log.lock().push(format!("{tag}:{payload}"));
        Ok(())
    })
}

#[test]
fn response_decodes_envelope_and_bare_forms() {
    let enveloped: CommandResponse = serde_json::from_str(
        r#"{"return_value":[{"name":"backoff_command_channel","arguments":{"seconds":30}}]}"#,
    )
    .unwrap();
    assert_eq!(enveloped.into_commands().len(), 1);

    let bare: CommandResponse =
        serde_json::from_str(r#"[{"name":"set_feature_flag","arguments":{}}]"#).unwrap();
    assert_eq!(bare.into_commands().len(), 1);
}

#[tokio::test]
async fn commands_apply_in_server_order() {
    let api = FakeApi::with_responses(vec![Ok(vec![
        command("first", json!(1)),
        command("second", json!(2)),
        command("first", json!(3)),
    ])]);
    let mut service = CommandChannelService::new(
        api,
        LocalIdentityProvider::new(),
        Duration::from_secs(10),
    );
    let log = Arc::new(Mutex::new(Vec::new()));
    service.register_handler("first", recording_handler(log.clone(), "first"));
    service.register_handler("second", recording_handler(log.clone(), "second"));

    service.initial_fetch().await;

    assert_eq!(log.lock().clone(), vec!["first:1", "second:2", "first:3"]);
}

#[tokio::test]
async fn handler_error_does_not_abort_the_batch() {
    let api = FakeApi::with_responses(vec![Ok(vec![
        command("broken", json!({})),
        command("fine", json!({})),
    ])]);
    let mut service = CommandChannelService::new(
        api,
        LocalIdentityProvider::new(),
        Duration::from_secs(10),
    );
    let log = Arc::new(Mutex::new(Vec::new()));
    service.register_handler(
        "broken",
        Arc::new(|_| Err(HandlerError("nope".to_string()))),
    );
    service.register_handler("fine", recording_handler(log.clone(), "fine"));

    service.initial_fetch().await;

    assert_eq!(log.lock().len(), 1);
}

#[tokio::test]
async fn unknown_commands_are_ignored() {
    let api = FakeApi::with_responses(vec![Ok(vec![command("mystery", json!({}))])]);
    let mut service = CommandChannelService::new(
        api,
        LocalIdentityProvider::new(),
        Duration::from_secs(10),
    );
    // No handlers registered at all; the batch must not error out.
    service.initial_fetch().await;
}

#[tokio::test(start_paused = true)]
async fn backoff_from_initial_fetch_governs_first_tick() {
    // Initial fetch delivers a 30s backoff against a 10s interval: the
    // second fetch lands at t ≈ 30s, the third 10s later.
    let api = FakeApi::with_responses(vec![Ok(vec![command(
        "backoff_command_channel",
        json!({"seconds": 30}),
    )])]);
    let mut service = CommandChannelService::new(
        api.clone(),
        LocalIdentityProvider::new(),
        Duration::from_secs(10),
    );
    service.register_handler(
        "backoff_command_channel",
        backoff_command_channel(service.backoff_slot()),
    );

    let start = Instant::now();
    service.initial_fetch().await;

    let cancel = CancellationToken::new();
    let task = tokio::spawn(service.run(cancel.clone()));
    while api.fetch_count() < 3 {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    cancel.cancel();
    task.await.unwrap();

    let times = api.times();
    let second = (times[1] - start).as_secs_f64();
    let third = (times[2] - times[1]).as_secs_f64();
    assert!((29.0..=31.0).contains(&second), "second fetch at {second}s");
    assert!((9.0..=11.0).contains(&third), "third fetch after {third}s");
}

#[tokio::test(start_paused = true)]
async fn short_backoff_never_shrinks_the_interval() {
    let api = FakeApi::with_responses(vec![Ok(vec![command(
        "backoff_command_channel",
        json!({"seconds": 2}),
    )])]);
    let mut service = CommandChannelService::new(
        api.clone(),
        LocalIdentityProvider::new(),
        Duration::from_secs(10),
    );
    service.register_handler(
        "backoff_command_channel",
        backoff_command_channel(service.backoff_slot()),
    );

    let start = Instant::now();
    service.initial_fetch().await;

    let cancel = CancellationToken::new();
    let task = tokio::spawn(service.run(cancel.clone()));
    while api.fetch_count() < 2 {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    cancel.cancel();
    task.await.unwrap();

    let second = (api.times()[1] - start).as_secs_f64();
    assert!((9.0..=11.0).contains(&second), "second fetch at {second}s");
}

#[tokio::test(start_paused = true)]
async fn fetch_errors_are_retried_next_tick() {
    let api = FakeApi::with_responses(vec![
        Err(FetchError::Network("down".to_string())),
        Err(FetchError::Status(403)),
        Err(FetchError::Decode("garbage".to_string())),
        Ok(Vec::new()),
    ]);
    let mut service = CommandChannelService::new(
        api.clone(),
        LocalIdentityProvider::new(),
        Duration::from_secs(1),
    );
    service.initial_fetch().await;

    let cancel = CancellationToken::new();
    let task = tokio::spawn(service.run(cancel.clone()));
    while api.fetch_count() < 4 {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    cancel.cancel();
    task.await.unwrap();
    // Four fetches happened despite three consecutive failures.
    assert!(api.fetch_count() >= 4);
}
