// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Self-instrumentation facade.
//!
//! Two variants satisfy the same capability triple: a noop and a forwarding
//! implementation backed by an APM collaborator. The active variant is
//! published exactly once during boot into a process-wide cell; everything
//! after boot only reads it. Transactions travel through a task-local slot;
//! tasks that never opened one observe the noop.

use std::sync::{Arc, OnceLock};

use tracing::debug;

/// Top-level instrumentation capability.
pub trait Instrumentation: Send + Sync {
    fn start_transaction(&self, name: &str) -> Arc<dyn Transaction>;
    fn record_metric(&self, name: &str, value: f64);
}

/// A unit of instrumented work.
pub trait Transaction: Send + Sync {
    fn start_segment(&self, name: &str) -> Arc<dyn Segment>;
    fn start_external_segment(&self, url: &str) -> Arc<dyn Segment>;
    fn add_attribute(&self, key: &str, value: &str);
    fn notice_error(&self, error: &str);
    fn end(&self);
}

/// A timed slice of a transaction.
pub trait Segment: Send + Sync {
    fn add_attribute(&self, key: &str, value: &str);
    fn end(&self);
}

/// Collaborator seam for the forwarding variant. The concrete APM client
/// lives outside this crate.
pub trait ApmAgent: Send + Sync {
    fn transaction_started(&self, name: &str);
    fn segment_started(&self, transaction: &str, name: &str);
    fn attribute(&self, scope: &str, key: &str, value: &str);
    fn error_noticed(&self, transaction: &str, error: &str);
    fn metric(&self, name: &str, value: f64);
    fn ended(&self, scope: &str);
}

// -- noop variant ----------------------------------------------------------

struct NoopInstrumentation;
struct NoopTransaction;
struct NoopSegment;

impl Instrumentation for NoopInstrumentation {
    fn start_transaction(&self, _name: &str) -> Arc<dyn Transaction> {
        Arc::new(NoopTransaction)
    }

    fn record_metric(&self, _name: &str, _value: f64) {}
}

impl Transaction for NoopTransaction {
    fn start_segment(&self, _name: &str) -> Arc<dyn Segment> {
        Arc::new(NoopSegment)
    }

    fn start_external_segment(&self, _url: &str) -> Arc<dyn Segment> {
        Arc::new(NoopSegment)
    }

    fn add_attribute(&self, _key: &str, _value: &str) {}

    fn notice_error(&self, _error: &str) {}

    fn end(&self) {}
}

impl Segment for NoopSegment {
    fn add_attribute(&self, _key: &str, _value: &str) {}

    fn end(&self) {}
}

// -- forwarding variant ----------------------------------------------------

/// Forwards every call to the APM collaborator.
pub struct ApmInstrumentation {
    agent: Arc<dyn ApmAgent>,
}

impl ApmInstrumentation {
    pub fn new(agent: Arc<dyn ApmAgent>) -> Self {
        Self { agent }
    }
}

struct ApmTransaction {
    name: String,
    agent: Arc<dyn ApmAgent>,
}

struct ApmSegment {
    name: String,
    agent: Arc<dyn ApmAgent>,
}

impl Instrumentation for ApmInstrumentation {
    fn start_transaction(&self, name: &str) -> Arc<dyn Transaction> {
        self.agent.transaction_started(name);
        Arc::new(ApmTransaction { name: name.to_string(), agent: self.agent.clone() })
    }

    fn record_metric(&self, name: &str, value: f64) {
        self.agent.metric(name, value);
    }
}

impl Transaction for ApmTransaction {
    fn start_segment(&self, name: &str) -> Arc<dyn Segment> {
        self.agent.segment_started(&self.name, name);
        Arc::new(ApmSegment { name: name.to_string(), agent: self.agent.clone() })
    }

    fn start_external_segment(&self, url: &str) -> Arc<dyn Segment> {
        self.agent.segment_started(&self.name, url);
        Arc::new(ApmSegment { name: url.to_string(), agent: self.agent.clone() })
    }

    fn add_attribute(&self, key: &str, value: &str) {
        self.agent.attribute(&self.name, key, value);
    }

    fn notice_error(&self, error: &str) {
        self.agent.error_noticed(&self.name, error);
    }

    fn end(&self) {
        self.agent.ended(&self.name);
    }
}

impl Segment for ApmSegment {
    fn add_attribute(&self, key: &str, value: &str) {
        self.agent.attribute(&self.name, key, value);
    }

    fn end(&self) {
        self.agent.ended(&self.name);
    }
}

// -- process-wide selection ------------------------------------------------

static ACTIVE: OnceLock<Arc<dyn Instrumentation>> = OnceLock::new();

/// Error from a second attempt to publish the instrumentation variant.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("instrumentation already selected")]
pub struct AlreadySelected;

/// Publish the active variant. Must happen before any sampler starts;
/// a second write is rejected.
pub fn select(instrumentation: Arc<dyn Instrumentation>) -> Result<(), AlreadySelected> {
    ACTIVE.set(instrumentation).map_err(|_| AlreadySelected)
}

/// Select from the config token: `"apm"` enables forwarding, anything else
/// is noop.
pub fn select_from_token(
    token: &str,
    agent: Option<Arc<dyn ApmAgent>>,
) -> Result<(), AlreadySelected> {
    match (token, agent) {
        ("apm", Some(agent)) => select(Arc::new(ApmInstrumentation::new(agent))),
        ("apm", None) => {
            debug!("apm instrumentation requested but no collaborator wired, using noop");
            select(noop())
        }
        _ => select(noop()),
    }
}

/// The active instrumentation; noop until published.
pub fn active() -> Arc<dyn Instrumentation> {
    ACTIVE.get().cloned().unwrap_or_else(noop)
}

pub fn noop() -> Arc<dyn Instrumentation> {
    Arc::new(NoopInstrumentation)
}

// -- context-carried transactions ------------------------------------------

tokio::task_local! {
    /// Private slot carrying the current transaction through a task.
    static CURRENT: Arc<dyn Transaction>;
}

/// Run `fut` with `txn` as the task's current transaction.
pub async fn with_transaction<F>(txn: Arc<dyn Transaction>, fut: F) -> F::Output
where
    F: std::future::Future,
{
    CURRENT.scope(txn, fut).await
}

/// The task's current transaction; a fresh noop when none was opened.
pub fn current_transaction() -> Arc<dyn Transaction> {
    CURRENT
        .try_with(|txn| txn.clone())
        .unwrap_or_else(|_| Arc::new(NoopTransaction))
}

#[cfg(test)]
#[path = "instrument_tests.rs"]
mod tests;
