// Copyright (c) The testdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::TerminateError;
use tokio::process::Child;

pub(super) fn set_process_group(_cmd: &mut std::process::Command) {}

/// Windows has no SIGTERM equivalent that a console subprocess can trap
/// without console-event plumbing, so the graceful step is already
/// `TerminateProcess`. The grace period then only covers pipe drain.
pub(super) fn terminate_child(child: &mut Child, child_pid: u32) -> Result<(), TerminateError> {
    child.start_kill().map_err(|error| TerminateError {
        pid: child_pid,
        signal: "TerminateProcess",
        error,
    })
}

pub(super) fn kill_child(child: &mut Child, _child_pid: u32) {
    let _ = child.start_kill();
}
