// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, error, info};
use tokio::task::JoinHandle;

use super::reconnect::ReconnectLoop;
use crate::client::OpcConnector;
use crate::config::Config;
use crate::error::LoggerError;
use crate::shutdown::{shutdown_channel, ShutdownTrigger};

/// Represents the logger task that can be started and managed
pub struct Daemon {
    task: Option<JoinHandle<Result<(), LoggerError>>>,
    trigger: ShutdownTrigger,
}

impl Default for Daemon {
    fn default() -> Self {
        Self::new()
    }
}

impl Daemon {
    /// Create a new daemon instance
    pub fn new() -> Self {
        let (trigger, _) = shutdown_channel();
        Daemon {
            task: None,
            trigger,
        }
    }

    /// Start the reconnect loop on the current runtime
    pub fn launch(&mut self, connector: Arc<dyn OpcConnector>, config: &Config) -> Result<()> {
        if self.task.is_some() {
            anyhow::bail!("Logger task is already running");
        }

        info!(
            "Starting OPC UA logger: {} tags from {} on {}",
            config.server.tag_count, config.server.folder, config.server.endpoint
        );
        debug!(
            "Writing {}_*.csv files to {}",
            config.output.file_prefix,
            config.output.directory.display()
        );

        let mut reconnect = ReconnectLoop::new(connector, config, self.trigger.subscribe());
        self.task = Some(tokio::spawn(async move { reconnect.run().await }));
        Ok(())
    }

    /// Ask the logger task to stop after its current step
    pub fn shutdown(&self) {
        info!("Shutting down logger task");
        self.trigger.trigger();
    }

    /// Wait for the logger task to complete
    ///
    /// Safe to call again after being cancelled, e.g. from a `tokio::select!`
    /// branch that lost the race.
    pub async fn wait(&mut self) -> Result<()> {
        let Some(task) = self.task.as_mut() else {
            return Ok(());
        };

        let outcome = task.await;
        self.task = None;
        match outcome {
            Ok(result) => result.context("Logger task failed"),
            Err(e) => {
                error!("Task panicked: {}", e);
                Err(e).context("Logger task did not complete")
            }
        }
    }
}
