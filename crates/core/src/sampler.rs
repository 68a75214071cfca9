// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sampler seam: periodic producers of event batches.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::event::EventBatch;

/// Error returned by a failed sample. The scheduler logs it and keeps
/// ticking.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SamplerError(pub String);

impl From<std::io::Error> for SamplerError {
    fn from(e: std::io::Error) -> Self {
        SamplerError(e.to_string())
    }
}

/// A periodic producer of event batches.
///
/// `on_startup` runs exactly once, before the first `sample`. A sampler
/// whose `disabled` returns true is never scheduled.
#[async_trait]
pub trait Sampler: Send {
    fn name(&self) -> &str;

    fn interval(&self) -> Duration;

    fn disabled(&self) -> bool {
        false
    }

    async fn on_startup(&mut self) {}

    async fn sample(&mut self) -> Result<EventBatch, SamplerError>;
}
