// Copyright (c) The testdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Building the external runner command line.
//!
//! The supervisor doesn't know how filters, suites, groups and options map
//! onto the runner's CLI; that mapping lives behind [`BuildCommand`] so
//! embedders can swap in a builder for their test framework of choice.

use crate::{config::EngineConfig, context::{OptionValue, RunContext}, errors::SpawnError};
use camino::Utf8PathBuf;
use std::process::Command;

/// Builds the runner command line for one run.
///
/// Implementations must be cheap and side-effect free: the command is built
/// synchronously on the request path.
pub trait BuildCommand: Send + Sync {
    /// Turns a run context into a ready-to-spawn command.
    ///
    /// Stdio setup and process-group placement are the supervisor's concern;
    /// builders only set the program, arguments, environment and working
    /// directory.
    fn build_command(&self, context: &RunContext) -> Result<Command, SpawnError>;
}

/// The default command builder.
///
/// Maps the run context onto a conventional CLI: `--filter` per test id,
/// `--suite` and `--group` per name, `--<key> [value]` per option.
#[derive(Clone, Debug)]
pub struct RunnerCommandBuilder {
    program: String,
    base_args: Vec<String>,
    working_dir: Option<Utf8PathBuf>,
}

impl RunnerCommandBuilder {
    /// Creates a builder from the engine configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            program: config.program.clone(),
            base_args: config.args.clone(),
            working_dir: config.working_dir.clone(),
        }
    }
}

impl BuildCommand for RunnerCommandBuilder {
    fn build_command(&self, context: &RunContext) -> Result<Command, SpawnError> {
        if self.program.is_empty() {
            return Err(SpawnError::CommandBuild {
                message: "no runner program configured".to_owned(),
            });
        }

        let mut command = Command::new(&self.program);
        command.args(&self.base_args);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        for suite in &context.suites {
            command.arg("--suite").arg(suite);
        }
        for group in &context.groups {
            command.arg("--group").arg(group);
        }
        for (key, value) in &context.options {
            match value {
                OptionValue::Bool(true) => {
                    command.arg(format!("--{key}"));
                }
                OptionValue::Bool(false) => {}
                OptionValue::String(value) => {
                    command.arg(format!("--{key}")).arg(value);
                }
            }
        }
        for filter in &context.filters {
            command.arg("--filter").arg(filter);
        }

        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use testdeck_protocol::RunUuid;

    fn context() -> RunContext {
        RunContext {
            run_id: RunUuid::new_v4(),
            filters: vec!["Suite::t1".to_owned()],
            suites: vec!["unit".to_owned()],
            groups: vec!["fast".to_owned()],
            options: BTreeMap::from([
                ("order-by".to_owned(), OptionValue::String("defects".to_owned())),
                ("stop-on-failure".to_owned(), OptionValue::Bool(true)),
                ("verbose".to_owned(), OptionValue::Bool(false)),
            ]),
            context_id: None,
        }
    }

    #[test]
    fn maps_context_onto_cli() {
        let config = EngineConfig {
            program: "runner".to_owned(),
            args: vec!["--log-events".to_owned()],
            ..EngineConfig::default()
        };
        let command = RunnerCommandBuilder::new(&config)
            .build_command(&context())
            .unwrap();

        let args: Vec<_> = command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            [
                "--log-events",
                "--suite",
                "unit",
                "--group",
                "fast",
                "--order-by",
                "defects",
                "--stop-on-failure",
                "--filter",
                "Suite::t1",
            ]
        );
    }

    #[test]
    fn empty_program_is_a_build_error() {
        let config = EngineConfig {
            program: String::new(),
            ..EngineConfig::default()
        };
        let err = RunnerCommandBuilder::new(&config)
            .build_command(&context())
            .unwrap_err();
        assert!(matches!(err, SpawnError::CommandBuild { .. }));
    }
}
