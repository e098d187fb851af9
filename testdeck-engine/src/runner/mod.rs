// Copyright (c) The testdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spawning and supervising the test-runner subprocess.
//!
//! One pump task per run owns the child process and both of its output
//! pipes. Events decoded from the error stream flow to the registry and the
//! broadcast hub in stream order; termination requests arrive over a per-run
//! channel and are handled inline so the grace timer dies with the process.

mod buffer;
mod imp;

pub use imp::{ExitNotifier, NoopNotifier, ProcessSupervisor, RunExitOutcome};

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        #[path = "unix.rs"]
        mod os;
    } else if #[cfg(windows)] {
        #[path = "windows.rs"]
        mod os;
    } else {
        compile_error!("unsupported target platform");
    }
}
