// Copyright (c) The testdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stopping in-flight runs.
//!
//! A stop is signal-then-escalate, never instantaneous: the controller sends
//! a terminate request to the run's pump task and broadcasts `stopped` right
//! away so viewers update optimistically. The pump task delivers the
//! graceful signal, arms the grace timer, and emits the second
//! `stopped {forced: true}` notice only if it has to hard-kill. The `exit`
//! message remains the authoritative end of the run either way.

use crate::{hub::BroadcastHub, runner::ProcessSupervisor, errors::StopError};
use std::sync::Arc;
use testdeck_protocol::{ClientMessage, RunUuid};
use tracing::info;

/// Stops one run or all of them.
#[derive(Clone)]
pub struct CancellationController {
    supervisor: Arc<ProcessSupervisor>,
    hub: Arc<BroadcastHub>,
}

impl CancellationController {
    /// Creates a controller over the given supervisor and hub.
    pub fn new(supervisor: Arc<ProcessSupervisor>, hub: Arc<BroadcastHub>) -> Self {
        Self { supervisor, hub }
    }

    /// Stops every running process.
    ///
    /// Returns the targeted run ids, or [`StopError::NoRunInProgress`] when
    /// nothing is running, in which case nothing is broadcast.
    pub fn stop_all(&self) -> Result<Vec<RunUuid>, StopError> {
        let targets = self.supervisor.running_runs();
        if targets.is_empty() {
            return Err(StopError::NoRunInProgress);
        }
        for run_id in &targets {
            self.stop_run(*run_id);
        }
        Ok(targets)
    }

    /// Stops a single run.
    ///
    /// Returns [`StopError::RunNotFound`] for unknown or already-completed
    /// ids; other runs are unaffected.
    pub fn stop_one(&self, run_id: RunUuid) -> Result<(), StopError> {
        if !self.supervisor.is_running(run_id) {
            return Err(StopError::RunNotFound { run_id });
        }
        self.stop_run(run_id);
        Ok(())
    }

    fn stop_run(&self, run_id: RunUuid) {
        // A run that completes between the check above and this request is
        // fine: the request lands in a closed channel and the exit handling
        // that already ran reconciled all state.
        if let Err(error) = self.supervisor.request_terminate(run_id) {
            info!(%run_id, %error, "stop raced with run completion");
            return;
        }
        self.hub.broadcast(&ClientMessage::Stopped {
            run_id,
            forced: false,
        });
        info!(%run_id, "stop requested");
    }
}
