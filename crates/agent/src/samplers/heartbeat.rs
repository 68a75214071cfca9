// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Liveness heartbeat: one event per interval, counting up.

use std::time::Duration;

use async_trait::async_trait;

use lookout_core::sampler::SamplerError;
use lookout_core::{Event, EventBatch, Sampler};

pub struct HeartbeatSampler {
    interval: Duration,
    beats: u64,
}

impl HeartbeatSampler {
    pub fn new(interval: Duration) -> Self {
        Self { interval, beats: 0 }
    }
}

#[async_trait]
impl Sampler for HeartbeatSampler {
    fn name(&self) -> &str {
        "heartbeat"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn sample(&mut self) -> Result<EventBatch, SamplerError> {
        self.beats += 1;
        Ok(vec![Event::of_type("AgentHeartbeat").with_field("heartbeatCounter", self.beats)])
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
