// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Outer session loop
//!
//! Each iteration opens a session, discovers the tags and samples until a
//! failure. The session is always released afterwards, release errors are
//! ignored. After a failure the loop waits according to its [`RetryPolicy`]
//! and starts over from the connection step.

use std::sync::Arc;

use log::{debug, error, info};

use super::retry::RetryPolicy;
use crate::client::{OpcConnector, OpcSession};
use crate::config::{Config, ServerConfig};
use crate::discovery::discover_nodes;
use crate::error::LoggerError;
use crate::recorder::HourlyCsvWriter;
use crate::sampler::Sampler;
use crate::shutdown::ShutdownSignal;

/// Connect, discover and sample, reconnecting after every failure.
pub struct ReconnectLoop {
    connector: Arc<dyn OpcConnector>,
    server: ServerConfig,
    writer: HourlyCsvWriter,
    policy: RetryPolicy,
    shutdown: ShutdownSignal,
    failures: u32,
}

impl ReconnectLoop {
    /// Build the loop from the loaded configuration.
    pub fn new(connector: Arc<dyn OpcConnector>, config: &Config, shutdown: ShutdownSignal) -> Self {
        Self {
            connector,
            server: config.server.clone(),
            writer: HourlyCsvWriter::new(&config.output.directory, &config.output.file_prefix),
            policy: RetryPolicy::from(&config.retry),
            shutdown,
            failures: 0,
        }
    }

    /// Replace the policy derived from the configuration.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Consecutive failures since the last successful discovery.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Run until shutdown is requested.
    ///
    /// Only returns an error when a bounded policy runs out of attempts.
    pub async fn run(&mut self) -> Result<(), LoggerError> {
        while self.shutdown.is_running() {
            let err = match self.run_session().await {
                Ok(()) => continue,
                Err(err) => err,
            };

            self.failures = self.failures.saturating_add(1);
            error!("Error: {}", err);

            let Some(delay) = self.policy.delay_for(self.failures) else {
                error!("Giving up after {} consecutive failures", self.failures);
                return Err(LoggerError::RetriesExhausted {
                    attempts: self.failures,
                });
            };

            info!("Reconnecting in {:.1}s", delay.as_secs_f64());
            if !self.shutdown.sleep(delay).await {
                break;
            }
        }
        info!("Logger stopped");
        Ok(())
    }

    /// One connection attempt, from connect to release.
    async fn run_session(&mut self) -> Result<(), LoggerError> {
        info!("Connecting to {}", self.server.endpoint);
        let mut session = self.connector.connect(&self.server.endpoint).await?;
        info!("Connected.");

        let result = self.sample_session(session.as_mut()).await;

        if let Err(err) = session.disconnect().await {
            debug!("Ignoring disconnect error: {}", err);
        }
        result
    }

    async fn sample_session(&mut self, session: &mut dyn OpcSession) -> Result<(), LoggerError> {
        let schema = discover_nodes(session, &self.server.folder, self.server.tag_count).await?;
        self.failures = 0;

        Sampler::new(session, &schema, &self.writer)
            .run(&mut self.shutdown)
            .await
    }
}
