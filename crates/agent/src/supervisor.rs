// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Panic recovery boundaries for long-running tasks.

use futures_util::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::task::JoinHandle;
use tracing::error;

/// What a recovery boundary does with a panic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanicPolicy {
    /// Fatal log, then process exit with code 1. For load-bearing units.
    LogAndFail,
    /// Log the panic and return. For helpers whose loss is survivable.
    LogAndContinue,
}

/// Run a future inside a panic recovery boundary.
pub async fn supervised(
    name: &str,
    policy: PanicPolicy,
    fut: impl Future<Output = ()> + Send,
) {
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(()) => {}
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            match policy {
                PanicPolicy::LogAndFail => {
                    error!(unit = %name, "fatal panic: {message}");
                    std::process::exit(1);
                }
                PanicPolicy::LogAndContinue => {
                    error!(unit = %name, "panic recovered: {message}");
                }
            }
        }
    }
}

/// Spawn a task wrapped in a recovery boundary.
pub fn spawn_supervised(
    name: &str,
    policy: PanicPolicy,
    fut: impl Future<Output = ()> + Send + 'static,
) -> JoinHandle<()> {
    let name = name.to_string();
    tokio::spawn(async move { supervised(&name, policy, fut).await })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
