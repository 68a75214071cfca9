// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optional local surfaces: status/ingest HTTP server and TCP ingest
//! socket. Both bind loopback by default; TLS terminates outside the
//! process.

pub mod status;
pub mod tcp;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("invalid listen address {0}: {1}")]
    Address(String, String),

    #[error("cannot bind {0}: {1}")]
    Bind(String, std::io::Error),

    #[error("surface failed: {0}")]
    Serve(String),
}
