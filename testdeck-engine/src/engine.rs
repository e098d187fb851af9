// Copyright (c) The testdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring the engine together.

use crate::{
    cancel::CancellationController,
    command::{BuildCommand, RunnerCommandBuilder},
    config::EngineConfig,
    hub::{BroadcastHub, ViewerSubscription},
    registry::RunRegistry,
    router::RunRouter,
    runner::{ExitNotifier, NoopNotifier, ProcessSupervisor},
};
use std::sync::Arc;
use testdeck_protocol::RunUuid;

/// Engine options.
#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    command_builder: Option<Box<dyn BuildCommand>>,
    notifier: Option<Box<dyn ExitNotifier>>,
}

impl EngineBuilder {
    /// Creates a builder from the engine configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            command_builder: None,
            notifier: None,
        }
    }

    /// Overrides the command builder. Defaults to
    /// [`RunnerCommandBuilder`] over the configured program.
    pub fn set_command_builder(&mut self, command_builder: Box<dyn BuildCommand>) -> &mut Self {
        self.command_builder = Some(command_builder);
        self
    }

    /// Sets the side-notification hook invoked after each run exits.
    pub fn set_notifier(&mut self, notifier: Box<dyn ExitNotifier>) -> &mut Self {
        self.notifier = Some(notifier);
        self
    }

    /// Creates the engine.
    pub fn build(self) -> DashboardEngine {
        let command_builder = self
            .command_builder
            .unwrap_or_else(|| Box::new(RunnerCommandBuilder::new(&self.config)));
        let notifier = self.notifier.unwrap_or_else(|| Box::new(NoopNotifier));

        let registry = Arc::new(RunRegistry::new());
        let hub = Arc::new(BroadcastHub::new());
        let supervisor = Arc::new(ProcessSupervisor::new(
            &self.config,
            command_builder,
            Arc::clone(&registry),
            Arc::clone(&hub),
            notifier,
        ));
        let controller =
            CancellationController::new(Arc::clone(&supervisor), Arc::clone(&hub));
        let router = RunRouter::new(
            Arc::clone(&supervisor),
            Arc::clone(&registry),
            controller,
        );

        DashboardEngine {
            registry,
            hub,
            supervisor,
            router,
        }
    }
}

/// The assembled engine: one registry, one hub, one supervisor, one router.
///
/// Created using [`EngineBuilder::build`]. The embedding application feeds
/// transport requests into [`DashboardEngine::router`] and drains each
/// viewer subscription into its push channel.
pub struct DashboardEngine {
    registry: Arc<RunRegistry>,
    hub: Arc<BroadcastHub>,
    supervisor: Arc<ProcessSupervisor>,
    router: RunRouter,
}

impl DashboardEngine {
    /// The request entry point.
    pub fn router(&self) -> &RunRouter {
        &self.router
    }

    /// The run state registry.
    pub fn registry(&self) -> &RunRegistry {
        &self.registry
    }

    /// The viewer hub.
    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    /// Registers a viewer. Convenience for `engine.hub().register()`.
    pub fn register_viewer(&self) -> ViewerSubscription {
        self.hub.register()
    }

    /// Waits until the run's subprocess has exited and its stream has been
    /// fully drained.
    pub async fn wait(&self, run_id: RunUuid) {
        self.supervisor.wait(run_id).await;
    }
}
