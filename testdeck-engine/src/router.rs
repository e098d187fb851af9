// Copyright (c) The testdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Translating inbound run/stop requests into engine operations.

use crate::{
    cancel::CancellationController,
    context::{OptionValue, RunContext},
    errors::EngineError,
    registry::RunRegistry,
    runner::ProcessSupervisor,
};
use serde::Deserialize;
use std::{collections::BTreeMap, sync::Arc};
use testdeck_protocol::RunUuid;
use tracing::info;

/// An inbound run request, as posted by the dashboard transport.
///
/// Every field is optional; an empty request means "run everything".
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunRequest {
    /// Test identifiers to restrict the run to.
    pub filters: Vec<String>,
    /// Suite names to restrict the run to.
    pub suites: Vec<String>,
    /// Group names to restrict the run to.
    pub groups: Vec<String>,
    /// Free-form runner options.
    pub options: BTreeMap<String, OptionValue>,
    /// Correlation tag echoed back in `start` and `exit` messages.
    pub context_id: Option<String>,
}

/// The target of a stop request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StopTarget {
    /// Stop every running process.
    All,
    /// Stop one run.
    One(RunUuid),
}

/// The engine's request entry point.
///
/// Pure orchestration: mints run ids, assembles the immutable
/// [`RunContext`], and delegates to the supervisor and cancellation
/// controller. `start_run` returns as soon as the subprocess is spawned, not
/// when it completes.
pub struct RunRouter {
    supervisor: Arc<ProcessSupervisor>,
    registry: Arc<RunRegistry>,
    controller: CancellationController,
}

impl RunRouter {
    pub(crate) fn new(
        supervisor: Arc<ProcessSupervisor>,
        registry: Arc<RunRegistry>,
        controller: CancellationController,
    ) -> Self {
        Self {
            supervisor,
            registry,
            controller,
        }
    }

    /// Starts a run and returns its id.
    pub fn start_run(&self, request: RunRequest) -> Result<RunUuid, EngineError> {
        let context = RunContext {
            run_id: RunUuid::new_v4(),
            filters: sanitize(request.filters),
            suites: sanitize(request.suites),
            groups: sanitize(request.groups),
            options: request.options,
            context_id: request.context_id,
        };
        info!(
            run_id = %context.run_id,
            filters = context.filters.len(),
            context_id = context.context_id.as_deref().unwrap_or("-"),
            "run requested"
        );
        let run_id = self.supervisor.spawn(context)?;
        Ok(run_id)
    }

    /// Starts a run restricted to the tests currently known to be failing.
    ///
    /// The request's own filters are replaced with the registry's live
    /// failure set; returns [`EngineError::NothingToRun`] when that set is
    /// empty.
    pub fn rerun_failed(&self, request: RunRequest) -> Result<RunUuid, EngineError> {
        let failed = self.registry.last_failed();
        if failed.is_empty() {
            return Err(EngineError::NothingToRun);
        }
        self.start_run(RunRequest {
            filters: failed.into_iter().collect(),
            ..request
        })
    }

    /// Stops one run or all of them, returning the targeted ids.
    pub fn stop(&self, target: StopTarget) -> Result<Vec<RunUuid>, EngineError> {
        match target {
            StopTarget::All => Ok(self.controller.stop_all()?),
            StopTarget::One(run_id) => {
                self.controller.stop_one(run_id)?;
                Ok(vec![run_id])
            }
        }
    }
}

// Drops entries that are empty after trimming; the transport layer is not
// trusted to pre-clean its payloads.
fn sanitize(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .filter(|value| !value.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_request_deserializes_camel_case() {
        let request: RunRequest = serde_json::from_str(
            r#"{
                "filters": ["S::T1"],
                "suites": ["unit"],
                "groups": [],
                "options": {"stop-on-failure": true},
                "contextId": "failed"
            }"#,
        )
        .unwrap();
        assert_eq!(request.filters, ["S::T1"]);
        assert_eq!(request.context_id.as_deref(), Some("failed"));
        assert_eq!(
            request.options["stop-on-failure"],
            OptionValue::Bool(true)
        );
    }

    #[test]
    fn missing_fields_default() {
        let request: RunRequest = serde_json::from_str("{}").unwrap();
        assert!(request.filters.is_empty());
        assert!(request.context_id.is_none());
    }

    #[test]
    fn sanitize_drops_blank_entries() {
        assert_eq!(
            sanitize(vec!["a".to_owned(), "  ".to_owned(), String::new()]),
            ["a"]
        );
    }
}
