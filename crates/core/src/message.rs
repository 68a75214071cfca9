// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-plane messages exchanged between the notification listeners and
//! their registered handlers.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The closed set of control messages.
///
/// Producers are the OS signal listener (unix) and the named-pipe listener
/// (windows); consumers are handlers registered on the notification handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Message {
    /// Raise the log level to verbose at runtime.
    EnableVerboseLogging,
    /// User-initiated stop.
    Stop,
    /// Planned host shutdown in progress.
    Shutdown,
}

/// Error for pipe text that does not name a known message.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown control message {0:?}")]
pub struct UnknownMessage(pub String);

impl Message {
    /// Textual form used on the named pipe (newline-terminated ASCII).
    pub fn as_pipe_str(&self) -> &'static str {
        match self {
            Message::EnableVerboseLogging => "notification",
            Message::Stop => "stop",
            Message::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_pipe_str())
    }
}

impl FromStr for Message {
    type Err = UnknownMessage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "notification" => Ok(Message::EnableVerboseLogging),
            "stop" => Ok(Message::Stop),
            "shutdown" => Ok(Message::Shutdown),
            other => Err(UnknownMessage(other.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
