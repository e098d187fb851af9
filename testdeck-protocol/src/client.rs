// Copyright (c) The testdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The viewer protocol: messages pushed to connected dashboard clients.

use crate::RunUuid;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message broadcast to every connected viewer.
///
/// Serialized as a tagged JSON object, e.g.
/// `{"type":"start","runId":"...","contextId":"global"}`. Viewers receive
/// messages for a single run in emission order; no ordering is guaranteed
/// across runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// A run began. Emitted exactly once per run, before any `realtime`
    /// message for it.
    #[serde(rename_all = "camelCase")]
    Start {
        /// The run this message belongs to.
        run_id: RunUuid,
        /// The caller-supplied correlation tag, if any.
        context_id: Option<String>,
    },

    /// One event from the run's subprocess stream, forwarded verbatim.
    #[serde(rename_all = "camelCase")]
    Realtime {
        /// The run this message belongs to.
        run_id: RunUuid,
        /// The raw decoded event line.
        data: Value,
    },

    /// The run's subprocess has fully exited and its trailing buffer has
    /// been drained. Emitted exactly once per run; this is the authoritative
    /// end of the run.
    #[serde(rename_all = "camelCase")]
    Exit {
        /// The run this message belongs to.
        run_id: RunUuid,
        /// The subprocess exit code. `None` when the process was terminated
        /// by a signal.
        exit_code: Option<i32>,
        /// The caller-supplied correlation tag, if any.
        context_id: Option<String>,
    },

    /// A stop request was accepted for the run. Emitted once per escalation
    /// step: first without `forced`, then with `forced: true` if the grace
    /// period elapsed and the process had to be killed.
    #[serde(rename_all = "camelCase")]
    Stopped {
        /// The run this message belongs to.
        run_id: RunUuid,
        /// True when this notice corresponds to the forced-kill escalation.
        #[serde(default, skip_serializing_if = "is_false")]
        forced: bool,
    },
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ClientMessage {
    /// The run this message refers to.
    pub fn run_id(&self) -> RunUuid {
        match self {
            ClientMessage::Start { run_id, .. }
            | ClientMessage::Realtime { run_id, .. }
            | ClientMessage::Exit { run_id, .. }
            | ClientMessage::Stopped { run_id, .. } => *run_id,
        }
    }

    /// Encodes this message as one compact JSON line, without a trailing
    /// newline.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("client message encoding is infallible")
    }
}
