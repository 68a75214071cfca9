// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    notification = { "notification", Message::EnableVerboseLogging },
    stop = { "stop", Message::Stop },
    shutdown = { "shutdown", Message::Shutdown },
)]
fn parses_pipe_forms(text: &str, expected: Message) {
    assert_eq!(text.parse::<Message>().unwrap(), expected);
}

#[test]
fn pipe_form_round_trips() {
    for msg in [Message::EnableVerboseLogging, Message::Stop, Message::Shutdown] {
        assert_eq!(msg.as_pipe_str().parse::<Message>().unwrap(), msg);
    }
}

#[test]
fn trims_newline_terminated_input() {
    assert_eq!("stop\n".parse::<Message>().unwrap(), Message::Stop);
    assert_eq!("  shutdown \r\n".parse::<Message>().unwrap(), Message::Shutdown);
}

#[test]
fn unknown_text_is_rejected() {
    let err = "restart".parse::<Message>().unwrap_err();
    assert_eq!(err, UnknownMessage("restart".to_string()));
}
