// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[tokio::test]
async fn panicking_task_is_recovered() {
    let handle = spawn_supervised("doomed", PanicPolicy::LogAndContinue, async {
        panic!("intentional test panic");
    });
    // The recovery boundary swallows the panic; the join succeeds.
    handle.await.unwrap();
}

#[tokio::test]
async fn clean_task_completes() {
    let done = Arc::new(AtomicBool::new(false));
    let flag = done.clone();
    spawn_supervised("fine", PanicPolicy::LogAndContinue, async move {
        flag.store(true, Ordering::SeqCst);
    })
    .await
    .unwrap();
    assert!(done.load(Ordering::SeqCst));
}

#[tokio::test]
async fn string_panic_payloads_are_extracted() {
    // Both &str and String payloads flow through the same boundary.
    spawn_supervised("str-payload", PanicPolicy::LogAndContinue, async {
        std::panic::panic_any("literal".to_string());
    })
    .await
    .unwrap();
}
