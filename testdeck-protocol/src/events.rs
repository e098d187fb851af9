// Copyright (c) The testdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The runner protocol: events emitted by the test-execution subprocess.

use crate::errors::EventDecodeError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One line of the runner protocol, decoded.
///
/// Carries both the raw JSON object (forwarded verbatim to viewers in
/// `realtime` messages) and the typed [`RunnerEvent`] (consumed by the state
/// reducer), produced from a single parse of the line.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedLine {
    /// The JSON object exactly as parsed from the line.
    pub raw: Value,

    /// The typed event.
    pub event: RunnerEvent,
}

/// A lifecycle event reported by the test-execution subprocess.
///
/// Event names the runner protocol does not define decode to
/// [`RunnerEvent::Unrecognized`] rather than an error, so that newer runners
/// can emit events older engines simply pass through.
#[derive(Clone, Debug, PartialEq)]
pub enum RunnerEvent {
    /// A test suite began execution (`suite.started`).
    SuiteStarted {
        /// The suite name.
        name: String,
        /// The number of tests the suite declares. Zero when the runner
        /// doesn't know up front.
        count: u64,
    },

    /// A test is about to run (`test.prepared`).
    TestPrepared {
        /// The test identifier, typically `Class::method`.
        test: String,
        /// Human-readable test name, if distinct from the identifier.
        name: Option<String>,
        /// The class the test belongs to.
        class: Option<String>,
        /// Explicit owning suite, overriding the one derived from the
        /// identifier.
        suite: Option<String>,
    },

    /// A non-fatal issue was reported for a test (`test.warning`,
    /// `test.deprecation`, `test.notice`).
    TestIssue {
        /// Which issue stream this came from.
        kind: IssueKind,
        /// The test identifier.
        test: String,
        /// The issue message.
        message: String,
    },

    /// A test reached its outcome (`test.passed`, `test.failed`,
    /// `test.errored`, `test.skipped`, `test.incomplete`, `test.risky`).
    TestCompleted {
        /// The outcome reported by the runner.
        outcome: TestOutcome,
        /// The test identifier.
        test: String,
        /// Failure or status message, when the runner provides one.
        message: Option<String>,
        /// Stack trace for failures and errors.
        trace: Option<String>,
    },

    /// Timing and assertion data for a test (`test.finished`).
    ///
    /// Always emitted after the completion event for the same test.
    TestFinished {
        /// The test identifier.
        test: String,
        /// Wall-clock duration in nanoseconds.
        duration: u64,
        /// The number of assertions performed.
        assertions: u64,
    },

    /// The runner finished executing everything (`execution.ended`).
    ExecutionEnded {
        /// The summary payload, stored verbatim.
        summary: Value,
    },

    /// An event name this protocol version does not know about.
    Unrecognized {
        /// The event name as emitted.
        event: String,
        /// The data payload as emitted.
        data: Value,
    },
}

/// The kind of non-fatal issue attached to a test.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    /// A warning (`test.warning`).
    Warning,
    /// A deprecation notice (`test.deprecation`).
    Deprecation,
    /// A general notice (`test.notice`).
    Notice,
}

/// The terminal outcome of one test within a run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
    /// The test passed.
    Passed,
    /// The test failed an assertion.
    Failed,
    /// The test aborted with an unexpected error.
    Errored,
    /// The test was skipped.
    Skipped,
    /// The test was marked incomplete.
    Incomplete,
    /// The test was risky (e.g. performed no assertions).
    Risky,
}

impl TestOutcome {
    /// Returns true for outcomes that count as failures for rerun purposes.
    pub fn is_failure(self) -> bool {
        matches!(self, TestOutcome::Failed | TestOutcome::Errored)
    }
}

#[derive(Deserialize)]
struct SuiteStartedData {
    name: String,
    #[serde(default)]
    count: u64,
}

#[derive(Deserialize)]
struct TestPreparedData {
    test: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    class: Option<String>,
    #[serde(default)]
    suite: Option<String>,
}

#[derive(Deserialize)]
struct TestIssueData {
    test: String,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct TestCompletedData {
    test: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    trace: Option<String>,
}

#[derive(Deserialize)]
struct TestFinishedData {
    test: String,
    #[serde(default)]
    duration: u64,
    #[serde(default)]
    assertions: u64,
}

/// Decodes one line of the runner protocol.
///
/// Returns `Ok(None)` for lines that carry no event: empty (or
/// whitespace-only) lines, and the literal `0` some runners emit as a
/// chunked-output artifact. Syntactically invalid lines yield an
/// [`EventDecodeError`]; callers are expected to log and skip them, never to
/// abort the stream.
pub fn decode_line(line: &str) -> Result<Option<DecodedLine>, EventDecodeError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed == "0" {
        return Ok(None);
    }

    let raw: Value =
        serde_json::from_str(trimmed).map_err(|error| EventDecodeError::InvalidJson {
            line: display_line(trimmed),
            error,
        })?;

    let object = raw.as_object().ok_or_else(|| EventDecodeError::NotAnObject {
        line: display_line(trimmed),
    })?;

    let event_name = object
        .get("event")
        .and_then(Value::as_str)
        .ok_or_else(|| EventDecodeError::MissingEventName {
            line: display_line(trimmed),
        })?
        .to_owned();

    // An absent data field is treated as an empty payload rather than an
    // error; several events carry no mandatory fields.
    let data = object.get("data").cloned().unwrap_or_else(|| json!({}));

    let event = decode_event(&event_name, data)?;
    Ok(Some(DecodedLine { raw, event }))
}

fn decode_event(event_name: &str, data: Value) -> Result<RunnerEvent, EventDecodeError> {
    fn payload<T: serde::de::DeserializeOwned>(
        event: &str,
        data: Value,
    ) -> Result<T, EventDecodeError> {
        serde_json::from_value(data).map_err(|error| EventDecodeError::MalformedPayload {
            event: event.to_owned(),
            error,
        })
    }

    let event = match event_name {
        "suite.started" => {
            let SuiteStartedData { name, count } = payload(event_name, data)?;
            RunnerEvent::SuiteStarted { name, count }
        }
        "test.prepared" => {
            let TestPreparedData {
                test,
                name,
                class,
                suite,
            } = payload(event_name, data)?;
            RunnerEvent::TestPrepared {
                test,
                name,
                class,
                suite,
            }
        }
        "test.warning" | "test.deprecation" | "test.notice" => {
            let kind = match event_name {
                "test.warning" => IssueKind::Warning,
                "test.deprecation" => IssueKind::Deprecation,
                _ => IssueKind::Notice,
            };
            let TestIssueData { test, message } = payload(event_name, data)?;
            RunnerEvent::TestIssue {
                kind,
                test,
                message,
            }
        }
        "test.passed" | "test.failed" | "test.errored" | "test.skipped" | "test.incomplete"
        | "test.risky" => {
            let outcome = match event_name {
                "test.passed" => TestOutcome::Passed,
                "test.failed" => TestOutcome::Failed,
                "test.errored" => TestOutcome::Errored,
                "test.skipped" => TestOutcome::Skipped,
                "test.incomplete" => TestOutcome::Incomplete,
                _ => TestOutcome::Risky,
            };
            let TestCompletedData {
                test,
                message,
                trace,
            } = payload(event_name, data)?;
            RunnerEvent::TestCompleted {
                outcome,
                test,
                message,
                trace,
            }
        }
        "test.finished" => {
            let TestFinishedData {
                test,
                duration,
                assertions,
            } = payload(event_name, data)?;
            RunnerEvent::TestFinished {
                test,
                duration,
                assertions,
            }
        }
        "execution.ended" => RunnerEvent::ExecutionEnded { summary: data },
        _ => RunnerEvent::Unrecognized {
            event: event_name.to_owned(),
            data,
        },
    };
    Ok(event)
}

impl RunnerEvent {
    /// The protocol name of this event, e.g. `test.passed`.
    pub fn event_name(&self) -> &str {
        match self {
            RunnerEvent::SuiteStarted { .. } => "suite.started",
            RunnerEvent::TestPrepared { .. } => "test.prepared",
            RunnerEvent::TestIssue { kind, .. } => match kind {
                IssueKind::Warning => "test.warning",
                IssueKind::Deprecation => "test.deprecation",
                IssueKind::Notice => "test.notice",
            },
            RunnerEvent::TestCompleted { outcome, .. } => match outcome {
                TestOutcome::Passed => "test.passed",
                TestOutcome::Failed => "test.failed",
                TestOutcome::Errored => "test.errored",
                TestOutcome::Skipped => "test.skipped",
                TestOutcome::Incomplete => "test.incomplete",
                TestOutcome::Risky => "test.risky",
            },
            RunnerEvent::TestFinished { .. } => "test.finished",
            RunnerEvent::ExecutionEnded { .. } => "execution.ended",
            RunnerEvent::Unrecognized { event, .. } => event,
        }
    }

    /// Encodes this event as one compact `{"event": ..., "data": ...}` JSON
    /// line, without a trailing newline.
    pub fn encode(&self) -> String {
        let data = match self {
            RunnerEvent::SuiteStarted { name, count } => json!({
                "name": name,
                "count": count,
            }),
            RunnerEvent::TestPrepared {
                test,
                name,
                class,
                suite,
            } => {
                let mut data = json!({ "test": test });
                let object = data.as_object_mut().expect("data is an object");
                if let Some(name) = name {
                    object.insert("name".to_owned(), json!(name));
                }
                if let Some(class) = class {
                    object.insert("class".to_owned(), json!(class));
                }
                if let Some(suite) = suite {
                    object.insert("suite".to_owned(), json!(suite));
                }
                data
            }
            RunnerEvent::TestIssue { test, message, .. } => json!({
                "test": test,
                "message": message,
            }),
            RunnerEvent::TestCompleted {
                test,
                message,
                trace,
                ..
            } => {
                let mut data = json!({ "test": test });
                let object = data.as_object_mut().expect("data is an object");
                if let Some(message) = message {
                    object.insert("message".to_owned(), json!(message));
                }
                if let Some(trace) = trace {
                    object.insert("trace".to_owned(), json!(trace));
                }
                data
            }
            RunnerEvent::TestFinished {
                test,
                duration,
                assertions,
            } => json!({
                "test": test,
                "duration": duration,
                "assertions": assertions,
            }),
            RunnerEvent::ExecutionEnded { summary } => summary.clone(),
            RunnerEvent::Unrecognized { data, .. } => data.clone(),
        };

        serde_json::to_string(&json!({
            "event": self.event_name(),
            "data": data,
        }))
        .expect("event encoding is infallible")
    }
}

// Long lines are truncated when carried inside errors so a single corrupt
// chunk can't blow up log output.
const MAX_DISPLAY_LINE: usize = 256;

fn display_line(line: &str) -> String {
    if line.len() <= MAX_DISPLAY_LINE {
        return line.to_owned();
    }
    let mut end = MAX_DISPLAY_LINE;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &line[..end])
}
