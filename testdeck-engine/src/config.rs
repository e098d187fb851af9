// Copyright (c) The testdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engine configuration.

use camino::Utf8PathBuf;
use serde::Deserialize;
use std::time::Duration;

/// Configuration for the testdeck engine.
///
/// Deserializable from the dashboard's config file; every field has a
/// default so an empty table is a valid configuration.
///
/// ```toml
/// program = "vendor/bin/runner"
/// args = ["--emit-events"]
/// grace-period = "2s"
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EngineConfig {
    /// The test-runner program to execute for each run.
    pub program: String,

    /// Arguments always passed to the runner, before any per-run arguments.
    pub args: Vec<String>,

    /// The working directory runs execute in. Defaults to the engine
    /// process's own working directory.
    pub working_dir: Option<Utf8PathBuf>,

    /// How long to wait after the graceful terminate signal before
    /// escalating to a forced kill.
    #[serde(with = "humantime_serde")]
    pub grace_period: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "testrunner".to_owned(),
            args: Vec::new(),
            working_dir: None,
            grace_period: Duration::from_secs(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_uses_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.program, "testrunner");
        assert_eq!(config.grace_period, Duration::from_secs(2));
        assert!(config.working_dir.is_none());
    }

    #[test]
    fn grace_period_parses_humantime() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"grace-period": "250ms", "program": "r"}"#).unwrap();
        assert_eq!(config.grace_period, Duration::from_millis(250));
        assert_eq!(config.program, "r");
    }
}
