// Copyright (c) The testdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::TerminateError;
use std::os::unix::process::CommandExt;
use tokio::process::Child;

/// Pre-spawn configuration: put the runner in its own process group so
/// signals reach any grandchildren it forks.
pub(super) fn set_process_group(cmd: &mut std::process::Command) {
    cmd.process_group(0);
}

// Negative pid addresses the whole process group.
fn process_group(pid: u32) -> libc::pid_t {
    -(pid as libc::pid_t)
}

/// Delivers the graceful stop signal (SIGTERM) to the run's process group.
pub(super) fn terminate_child(child: &mut Child, child_pid: u32) -> Result<(), TerminateError> {
    if child.id().is_none() {
        // The child exited already -- don't send a signal.
        return Ok(());
    }
    let ret = unsafe { libc::kill(process_group(child_pid), libc::SIGTERM) };
    if ret == -1 {
        return Err(TerminateError {
            pid: child_pid,
            signal: "SIGTERM",
            error: std::io::Error::last_os_error(),
        });
    }
    Ok(())
}

/// Hard-kills the run's process group with SIGKILL.
pub(super) fn kill_child(child: &mut Child, child_pid: u32) {
    if child.id().is_none() {
        return;
    }
    // There is a race between killing a process and its own exit; errors
    // here carry no information we can act on.
    unsafe {
        libc::kill(process_group(child_pid), libc::SIGKILL);
    }
}
