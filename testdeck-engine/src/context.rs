// Copyright (c) The testdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The immutable description of one run request.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use testdeck_protocol::RunUuid;

/// Everything the engine knows about a run at the moment it is requested.
///
/// Created by the router from an inbound request and never mutated
/// afterwards; exactly one context exists per [`RunUuid`].
#[derive(Clone, Debug)]
pub struct RunContext {
    /// The run's unique id, minted by the router.
    pub run_id: RunUuid,

    /// Test identifiers to restrict the run to, in request order.
    pub filters: Vec<String>,

    /// Suite names to restrict the run to.
    pub suites: Vec<String>,

    /// Group names to restrict the run to.
    pub groups: Vec<String>,

    /// Free-form runner options, mapped onto command-line flags by the
    /// command builder.
    pub options: BTreeMap<String, OptionValue>,

    /// Caller-supplied correlation tag, echoed back in `start` and `exit`
    /// viewer messages so the UI can associate the run with the element that
    /// triggered it.
    pub context_id: Option<String>,
}

/// The value of one runner option: a boolean switch or a string argument.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// A boolean switch. `true` emits the flag, `false` omits it.
    Bool(bool),
    /// A string-valued option, emitted as `--key value`.
    String(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_values_deserialize_untagged() {
        let options: BTreeMap<String, OptionValue> =
            serde_json::from_str(r#"{"stop-on-failure": true, "order-by": "defects"}"#).unwrap();
        assert_eq!(options["stop-on-failure"], OptionValue::Bool(true));
        assert_eq!(
            options["order-by"],
            OptionValue::String("defects".to_owned())
        );
    }
}
