// Copyright (c) The testdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced while decoding the runner protocol.

use thiserror::Error;

/// An error that occurred while decoding one line of the runner protocol.
///
/// Decode errors are always local to a single line: the engine logs them and
/// keeps consuming the stream.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EventDecodeError {
    /// The line is not syntactically valid JSON.
    #[error("event line is not valid JSON: `{line}`")]
    InvalidJson {
        /// The offending line, truncated for display.
        line: String,
        /// The underlying parse error.
        #[source]
        error: serde_json::Error,
    },

    /// The line parsed, but to something other than a JSON object.
    #[error("event line is not a JSON object: `{line}`")]
    NotAnObject {
        /// The offending line, truncated for display.
        line: String,
    },

    /// The object has no string `event` field.
    #[error("event line is missing a string `event` field: `{line}`")]
    MissingEventName {
        /// The offending line, truncated for display.
        line: String,
    },

    /// The event name is known but its data payload doesn't match the
    /// expected shape.
    #[error("malformed payload for `{event}` event")]
    MalformedPayload {
        /// The event name.
        event: String,
        /// The underlying deserialization error.
        #[source]
        error: serde_json::Error,
    },
}
