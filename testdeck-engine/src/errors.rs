// Copyright (c) The testdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the testdeck engine.

use testdeck_protocol::RunUuid;
use thiserror::Error;

/// An error that occurred while starting a run's subprocess.
///
/// Spawn errors are fatal to the run request that caused them and are
/// returned synchronously to the router's caller. They never affect other
/// runs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SpawnError {
    /// The command builder rejected the run context.
    #[error("failed to construct the runner command: {message}")]
    CommandBuild {
        /// Why the command could not be built.
        message: String,
    },

    /// The subprocess could not be started.
    #[error("failed to spawn test runner `{program}`")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },
}

/// An error that occurred while handling a stop request.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum StopError {
    /// A stop-all request arrived while nothing was running.
    #[error("no run in progress")]
    NoRunInProgress,

    /// A stop-one request named a run that is not currently running.
    #[error("run `{run_id}` not found")]
    RunNotFound {
        /// The unknown run id.
        run_id: RunUuid,
    },
}

/// An error that occurred while delivering a termination signal.
///
/// Terminate errors are logged and swallowed: the run's exit handling
/// reconciles state whether or not the signal arrived, and the forced-kill
/// escalation still fires if the process lingers.
#[derive(Debug, Error)]
#[error("failed to deliver {signal} to process group {pid}")]
pub struct TerminateError {
    /// The process id the signal was addressed to.
    pub pid: u32,
    /// The signal name, e.g. `SIGTERM`.
    pub signal: &'static str,
    /// The underlying IO error.
    #[source]
    pub error: std::io::Error,
}

/// A request-level error returned to the router's caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// The run's subprocess could not be started.
    #[error("failed to start the test runner")]
    Spawn(#[from] SpawnError),

    /// A stop request could not be satisfied.
    #[error("failed to stop")]
    Stop(#[from] StopError),

    /// A rerun-failed request arrived with no known failed tests.
    #[error("nothing to run: no tests are currently failing")]
    NothingToRun,
}
