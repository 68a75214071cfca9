// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sampler scheduler: one producer task per sampler, one bounded queue,
//! one consumer that timestamps and forwards events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use lookout_core::{AgentContext, Clock, EventBatch, Sampler};

/// Queue capacity, sized as 2·high-frequency + 1·low-frequency samplers.
const QUEUE_CAPACITY: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("sampler scheduler already running")]
    AlreadyRunning,

    #[error("sampler scheduler not running")]
    NotRunning,
}

struct Running {
    cancel: CancellationToken,
    // Tasks exit on cancellation within one tick; never aborted.
    #[allow(dead_code)]
    tasks: Vec<JoinHandle<()>>,
}

/// Runs registered samplers on their intervals and forwards their batches.
///
/// The queue is the sole backpressure point: a producer never blocks past
/// its tick; on a full queue the freshly produced batch is dropped and
/// counted.
pub struct SamplerScheduler<C: Clock> {
    samplers: Vec<Arc<tokio::sync::Mutex<Box<dyn Sampler>>>>,
    clock: C,
    drops: Arc<AtomicU64>,
    running: Option<Running>,
}

impl<C: Clock> SamplerScheduler<C> {
    pub fn new(clock: C) -> Self {
        Self { samplers: Vec::new(), clock, drops: Arc::new(AtomicU64::new(0)), running: None }
    }

    /// Register a sampler. Disabled samplers are kept but never scheduled.
    pub fn add_sampler(&mut self, sampler: Box<dyn Sampler>) {
        self.samplers.push(Arc::new(tokio::sync::Mutex::new(sampler)));
    }

    /// Total batches dropped on queue overflow since construction.
    pub fn drop_count(&self) -> u64 {
        self.drops.load(Ordering::Relaxed)
    }

    /// Spawn producers and the consumer. Errors if already running.
    pub fn start(&mut self, ctx: &AgentContext) -> Result<(), SchedulerError> {
        if self.running.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let cancel = ctx.cancel.child_token();
        let (tx, rx) = mpsc::channel::<EventBatch>(QUEUE_CAPACITY);
        let mut tasks = Vec::new();

        tasks.push(tokio::spawn(consume(rx, ctx.clone(), self.clock.clone(), cancel.clone())));

        for sampler in &self.samplers {
            tasks.push(tokio::spawn(produce(
                sampler.clone(),
                tx.clone(),
                self.drops.clone(),
                cancel.clone(),
            )));
        }

        self.running = Some(Running { cancel, tasks });
        Ok(())
    }

    /// Cancel all tasks. Errors if not running. The same instance may be
    /// started again afterwards.
    pub fn stop(&mut self) -> Result<(), SchedulerError> {
        let Some(running) = self.running.take() else {
            return Err(SchedulerError::NotRunning);
        };
        running.cancel.cancel();
        Ok(())
    }
}

/// Producer loop for one sampler: `on_startup`, then sample every interval
/// and enqueue without blocking.
async fn produce(
    sampler: Arc<tokio::sync::Mutex<Box<dyn Sampler>>>,
    tx: mpsc::Sender<EventBatch>,
    drops: Arc<AtomicU64>,
    cancel: CancellationToken,
) {
    let (name, interval) = {
        let mut s = sampler.lock().await;
        if s.disabled() {
            debug!(sampler = s.name(), "sampler disabled, not scheduling");
            return;
        }
        s.on_startup().await;
        (s.name().to_string(), s.interval())
    };

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let batch = match sampler.lock().await.sample().await {
            Ok(batch) => batch,
            Err(e) => {
                warn!(sampler = %name, "sample failed: {e}");
                continue;
            }
        };
        if batch.is_empty() {
            continue;
        }
        match tx.try_send(batch) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                drops.fetch_add(1, Ordering::Relaxed);
                warn!(sampler = %name, "event queue full, dropping batch");
            }
            Err(TrySendError::Closed(_)) => break,
        }
    }
}

/// Consumer loop: stamp every event once, then forward through the
/// context's event sink under the agent entity key.
async fn consume<C: Clock>(
    mut rx: mpsc::Receiver<EventBatch>,
    ctx: AgentContext,
    clock: C,
    cancel: CancellationToken,
) {
    loop {
        let batch = tokio::select! {
            _ = cancel.cancelled() => break,
            batch = rx.recv() => match batch {
                Some(batch) => batch,
                None => break,
            },
        };
        let key = ctx.agent_key();
        let now = clock.epoch_secs();
        for mut event in batch {
            event.stamp(now);
            ctx.emit_event(event, &key);
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
