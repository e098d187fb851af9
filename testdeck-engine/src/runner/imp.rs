// Copyright (c) The testdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::buffer::LineBuffer;
use crate::{
    command::BuildCommand,
    config::EngineConfig,
    context::RunContext,
    errors::{SpawnError, StopError},
    hub::BroadcastHub,
    registry::RunRegistry,
};
use std::{
    collections::BTreeMap,
    io,
    process::Stdio,
    sync::{Arc, Mutex},
    time::Duration,
};
use testdeck_protocol::{decode_line, ClientMessage, RunUuid};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::{Child, ChildStderr, ChildStdout},
    sync::{
        mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
        watch,
    },
};
use tracing::{debug, warn};

/// Side-notification hook, invoked exactly once per run after exit handling
/// has completed.
///
/// Runs on the pump task; implementations should hand anything slow off to
/// their own task.
pub trait ExitNotifier: Send + Sync {
    /// Called after the run's record reached its terminal status and the
    /// `exit` message was broadcast.
    fn run_exited(&self, outcome: &RunExitOutcome);
}

/// What an [`ExitNotifier`] learns about a completed run.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct RunExitOutcome {
    /// The run that completed.
    pub run_id: RunUuid,
    /// The run's correlation tag.
    pub context_id: Option<String>,
    /// The subprocess exit code; `None` when it died to a signal.
    pub exit_code: Option<i32>,
    /// True when the run was stopped on request rather than exiting on its
    /// own.
    pub stopped: bool,
}

/// An [`ExitNotifier`] that does nothing.
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl ExitNotifier for NoopNotifier {
    fn run_exited(&self, _outcome: &RunExitOutcome) {}
}

/// A request sent from the engine to a run's pump task.
#[derive(Clone, Copy, Debug)]
pub(crate) enum RunRequest {
    /// Deliver the graceful stop signal; escalate to a forced kill if the
    /// process outlives the grace period.
    Terminate,
}

struct RunHandle {
    req_tx: UnboundedSender<RunRequest>,
}

/// Spawns and supervises one subprocess per run request.
///
/// The process table and the run registry are the only shared mutable state
/// in the engine; both live behind mutexes with short critical sections.
pub struct ProcessSupervisor {
    grace_period: Duration,
    command_builder: Box<dyn BuildCommand>,
    registry: Arc<RunRegistry>,
    hub: Arc<BroadcastHub>,
    notifier: Box<dyn ExitNotifier>,
    processes: Mutex<BTreeMap<RunUuid, RunHandle>>,
    // Bumped once per completed run; lets `wait` sleep without polling.
    exit_seq: watch::Sender<u64>,
}

impl ProcessSupervisor {
    /// Creates a supervisor with no running processes.
    pub fn new(
        config: &EngineConfig,
        command_builder: Box<dyn BuildCommand>,
        registry: Arc<RunRegistry>,
        hub: Arc<BroadcastHub>,
        notifier: Box<dyn ExitNotifier>,
    ) -> Self {
        let (exit_seq, _) = watch::channel(0);
        Self {
            grace_period: config.grace_period,
            command_builder,
            registry,
            hub,
            notifier,
            processes: Mutex::new(BTreeMap::new()),
            exit_seq,
        }
    }

    /// Spawns the subprocess for a run and starts its pump task.
    ///
    /// Returns once the process is running; the stream is consumed
    /// asynchronously. On error nothing is registered and no message is
    /// broadcast: a spawn failure is fatal to this request only.
    pub fn spawn(self: &Arc<Self>, context: RunContext) -> Result<RunUuid, SpawnError> {
        let run_id = context.run_id;
        let mut command = self.command_builder.build_command(&context)?;
        let program = command.get_program().to_string_lossy().into_owned();

        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        super::os::set_process_group(&mut command);

        let mut command: tokio::process::Command = command.into();
        let mut child = command
            .spawn()
            .map_err(|error| SpawnError::Spawn { program, error })?;
        let child_pid = child
            .id()
            .expect("child has never been polled so must return a PID");
        let stdout = child.stdout.take().expect("stdout was piped");
        let stderr = child.stderr.take().expect("stderr was piped");

        let (req_tx, req_rx) = unbounded_channel();
        self.registry.insert(run_id);
        self.processes
            .lock()
            .expect("process table mutex poisoned")
            .insert(run_id, RunHandle { req_tx });
        self.hub.broadcast(&ClientMessage::Start {
            run_id,
            context_id: context.context_id.clone(),
        });
        debug!(%run_id, pid = child_pid, "test runner spawned");

        let supervisor = Arc::clone(self);
        tokio::spawn(async move {
            supervisor
                .run_to_completion(context, child, child_pid, stdout, stderr, req_rx)
                .await;
        });

        Ok(run_id)
    }

    /// Whether the run's subprocess is still being supervised.
    pub fn is_running(&self, run_id: RunUuid) -> bool {
        self.processes
            .lock()
            .expect("process table mutex poisoned")
            .contains_key(&run_id)
    }

    /// The ids of all currently-supervised runs.
    pub fn running_runs(&self) -> Vec<RunUuid> {
        self.processes
            .lock()
            .expect("process table mutex poisoned")
            .keys()
            .copied()
            .collect()
    }

    /// Asks the run's pump task to terminate its process.
    pub(crate) fn request_terminate(&self, run_id: RunUuid) -> Result<(), StopError> {
        let processes = self.processes.lock().expect("process table mutex poisoned");
        let handle = processes
            .get(&run_id)
            .ok_or(StopError::RunNotFound { run_id })?;
        if handle.req_tx.send(RunRequest::Terminate).is_err() {
            // The pump task is already in exit handling; the exit broadcast
            // supersedes this request.
            debug!(%run_id, "terminate request raced with run exit");
        }
        Ok(())
    }

    /// Waits until the run is no longer supervised.
    ///
    /// Returns immediately for ids that were never spawned.
    pub async fn wait(&self, run_id: RunUuid) {
        let mut exits = self.exit_seq.subscribe();
        loop {
            if !self.is_running(run_id) {
                return;
            }
            if exits.changed().await.is_err() {
                return;
            }
        }
    }

    async fn run_to_completion(
        self: Arc<Self>,
        context: RunContext,
        mut child: Child,
        child_pid: u32,
        stdout: ChildStdout,
        stderr: ChildStderr,
        mut req_rx: UnboundedReceiver<RunRequest>,
    ) {
        let run_id = context.run_id;
        let mut streams = RunStreams::new(run_id, stdout, stderr);
        let mut stop_requested = false;
        let mut requests_done = false;

        let exit_status = loop {
            tokio::select! {
                () = streams.fill_buf(&self.registry, &self.hub), if !streams.is_done() => {}
                res = child.wait() => break res,
                recv = req_rx.recv(), if !requests_done => {
                    match recv {
                        Some(RunRequest::Terminate) => {
                            if !stop_requested {
                                stop_requested = true;
                                let result = terminate_child(
                                    &mut child,
                                    child_pid,
                                    &mut streams,
                                    &self.registry,
                                    &self.hub,
                                    self.grace_period,
                                )
                                .await;
                                if result == TerminateResult::Killed {
                                    self.hub.broadcast(&ClientMessage::Stopped {
                                        run_id,
                                        forced: true,
                                    });
                                }
                            }
                        }
                        None => requests_done = true,
                    }
                }
            }
        };

        // The child is gone, but the pipes may still hold buffered events.
        // Drain them to EOF, then flush the final (possibly newline-less)
        // segment through the same decode path so no trailing event is lost.
        while !streams.is_done() {
            streams.fill_buf(&self.registry, &self.hub).await;
        }
        streams.flush(&self.registry, &self.hub);

        let exit_code = match exit_status {
            Ok(status) => status.code(),
            Err(error) => {
                warn!(%run_id, %error, "failed to wait on test runner");
                None
            }
        };

        self.registry.mark_exited(run_id, stop_requested);
        // Release the handle before announcing the exit so is_running() is
        // never true for a run viewers already saw finish.
        self.processes
            .lock()
            .expect("process table mutex poisoned")
            .remove(&run_id);
        self.hub.broadcast(&ClientMessage::Exit {
            run_id,
            exit_code,
            context_id: context.context_id.clone(),
        });
        self.notifier.run_exited(&RunExitOutcome {
            run_id,
            context_id: context.context_id,
            exit_code,
            stopped: stop_requested,
        });
        self.exit_seq.send_modify(|seq| *seq += 1);
        debug!(%run_id, ?exit_code, stopped = stop_requested, "run complete");
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum TerminateResult {
    /// The process exited within the grace period (or was already gone).
    Exited,
    /// The grace period elapsed and SIGKILL was sent.
    Killed,
}

/// Graceful-then-forced termination.
///
/// Keeps pumping the output streams while waiting so no event emitted during
/// shutdown is lost. Natural exit wins the select and cancels the escalation
/// structurally; there is no detached timer to fire against a reused pid.
async fn terminate_child(
    child: &mut Child,
    child_pid: u32,
    streams: &mut RunStreams,
    registry: &RunRegistry,
    hub: &BroadcastHub,
    grace_period: Duration,
) -> TerminateResult {
    if child.id().is_none() {
        return TerminateResult::Exited;
    }

    if let Err(error) = super::os::terminate_child(child, child_pid) {
        // The process may win the race and exit before the signal lands;
        // exit handling reconciles state either way, and the escalation
        // below still applies if it lingers.
        warn!(%error, "failed to deliver graceful stop signal");
    }

    if grace_period.is_zero() {
        super::os::kill_child(child, child_pid);
        return TerminateResult::Killed;
    }

    let mut sleep = std::pin::pin!(tokio::time::sleep(grace_period));
    loop {
        tokio::select! {
            () = streams.fill_buf(registry, hub), if !streams.is_done() => {}
            _ = child.wait() => break TerminateResult::Exited,
            _ = &mut sleep => {
                // The process ignored the graceful signal.
                super::os::kill_child(child, child_pid);
                break TerminateResult::Killed;
            }
        }
    }
}

/// The size of each buffered reader's buffer: the (normal) page size on most
/// systems.
const CHUNK_SIZE: usize = 4 * 1024;

/// A buffered reader over one child pipe that remembers EOF.
struct FusedLineReader<R> {
    reader: BufReader<R>,
    buffer: LineBuffer,
    done: bool,
}

impl<R: AsyncRead + Unpin> FusedLineReader<R> {
    fn new(reader: R) -> Self {
        Self {
            reader: BufReader::with_capacity(CHUNK_SIZE, reader),
            buffer: LineBuffer::new(),
            done: false,
        }
    }

    async fn fill_buf(&mut self) -> io::Result<()> {
        if self.done {
            return Ok(());
        }
        match self.reader.fill_buf().await {
            Ok(chunk) => {
                if chunk.is_empty() {
                    self.done = true;
                } else {
                    self.buffer.extend(chunk);
                    let len = chunk.len();
                    self.reader.consume(len);
                }
                Ok(())
            }
            Err(error) => {
                self.done = true;
                Err(error)
            }
        }
    }
}

/// Both output pipes of one run, with their line buffers.
///
/// The error stream carries the event log; stdout is diagnostics only and is
/// forwarded to the engine's own log.
struct RunStreams {
    run_id: RunUuid,
    stderr: FusedLineReader<ChildStderr>,
    stdout: FusedLineReader<ChildStdout>,
}

impl RunStreams {
    fn new(run_id: RunUuid, stdout: ChildStdout, stderr: ChildStderr) -> Self {
        Self {
            run_id,
            stderr: FusedLineReader::new(stderr),
            stdout: FusedLineReader::new(stdout),
        }
    }

    fn is_done(&self) -> bool {
        self.stderr.done && self.stdout.done
    }

    /// Reads one chunk from whichever pipe is ready and handles every
    /// complete line it produced.
    async fn fill_buf(&mut self, registry: &RunRegistry, hub: &BroadcastHub) {
        tokio::select! {
            res = self.stderr.fill_buf(), if !self.stderr.done => {
                if let Err(error) = res {
                    warn!(run_id = %self.run_id, %error, "error reading runner event stream");
                }
                while let Some(line) = self.stderr.buffer.pop_line() {
                    process_event_line(self.run_id, &line, registry, hub);
                }
            }
            res = self.stdout.fill_buf(), if !self.stdout.done => {
                if let Err(error) = res {
                    warn!(run_id = %self.run_id, %error, "error reading runner output");
                }
                while let Some(line) = self.stdout.buffer.pop_line() {
                    debug!(run_id = %self.run_id, %line, "runner output");
                }
            }
        }
    }

    /// Pushes any trailing newline-less segments through the decode path.
    fn flush(&mut self, registry: &RunRegistry, hub: &BroadcastHub) {
        while let Some(line) = self.stderr.buffer.pop_line() {
            process_event_line(self.run_id, &line, registry, hub);
        }
        if let Some(line) = self.stderr.buffer.flush() {
            process_event_line(self.run_id, &line, registry, hub);
        }
        while let Some(line) = self.stdout.buffer.pop_line() {
            debug!(run_id = %self.run_id, %line, "runner output");
        }
        if let Some(line) = self.stdout.buffer.flush() {
            debug!(run_id = %self.run_id, %line, "runner output");
        }
    }
}

// Apply-then-broadcast keeps the registry authoritative: by the time a
// viewer sees an event, querying the registry reflects it.
fn process_event_line(run_id: RunUuid, line: &str, registry: &RunRegistry, hub: &BroadcastHub) {
    match decode_line(line) {
        Ok(Some(decoded)) => {
            registry.apply(run_id, &decoded.event);
            hub.broadcast(&ClientMessage::Realtime {
                run_id,
                data: decoded.raw,
            });
        }
        Ok(None) => {}
        Err(error) => {
            warn!(%run_id, %error, "undecodable event line, skipping");
        }
    }
}
