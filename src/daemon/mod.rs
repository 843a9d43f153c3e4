//! # Daemon Module
//!
//! The daemon module runs the logger in the background: an outer reconnect
//! loop owns the OPC UA session, discovers the tags once per session and
//! hands over to the minute sampler until a failure.
//!
//! ## Components
//!
//! * **Launch Daemon**: starting, stopping and awaiting the logger task
//! * **Reconnect**: the session lifecycle and retry loop
//! * **Retry**: delay policy between attempts
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use rust_opcua_logger::{client::SimulationConnector, config::Config, daemon::Daemon};
//!
//! async fn run() -> anyhow::Result<()> {
//!     let config = Config::from_file("config.yaml")?;
//!
//!     // Create and launch daemon
//!     let mut daemon = Daemon::new();
//!     daemon.launch(Arc::new(SimulationConnector::new()), &config)?;
//!
//!     // Wait for shutdown signal (e.g., Ctrl+C)
//!     tokio::signal::ctrl_c().await?;
//!
//!     // Clean shutdown
//!     daemon.shutdown();
//!     daemon.wait().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod launch_daemon;
pub mod reconnect;
pub mod retry;

pub use launch_daemon::Daemon;
pub use reconnect::ReconnectLoop;
pub use retry::RetryPolicy;
