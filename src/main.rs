// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the OPC UA minute logger
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use log::{error, info};
use rust_opcua_logger::client::{OpcConnector, SimulationConnector, UaTcpConnector};
use rust_opcua_logger::config::{self, Config};
use rust_opcua_logger::daemon::Daemon;
use tokio::signal;

/// Log OPC UA folder variables once per minute into hourly CSV files
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (YAML format)
    #[arg(long)]
    config: Option<PathBuf>,

    /// OPC UA endpoint URL (opc.tcp://host:port/path)
    #[arg(long)]
    endpoint: Option<String>,

    /// Number of tags logged per row
    #[arg(long)]
    tag_count: Option<usize>,

    /// Display name of the folder under Objects to log
    #[arg(long)]
    folder: Option<String>,

    /// Directory receiving the hourly CSV files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Log the built-in simulated address space instead of a real server
    #[arg(long)]
    simulate: bool,

    /// Path to a configuration to validate and exit
    #[arg(long)]
    validate_config: Option<PathBuf>,

    /// Output the configuration schema as JSON and exit
    #[arg(long)]
    show_config_schema: bool,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Disable all logging output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger with appropriate level based on verbose and quiet flags
    let log_level = if args.quiet {
        log::LevelFilter::Off
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    // Check if --show-config-schema flag is set
    if args.show_config_schema {
        return config::output_config_schema();
    }

    // Validate configuration file if --validate-config is set
    if let Some(validate_path) = args.validate_config {
        if !validate_path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file does not exist: {}",
                validate_path.display()
            ));
        }

        Config::from_file(&validate_path)
            .map_err(|err| anyhow::anyhow!("Configuration validation failed: {:#}", err))?;
        println!("Configuration file is valid: {}", validate_path.display());
        return Ok(());
    }

    // Load configuration
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("config.yaml"));
    let mut config = Config::from_file(&config_path)?;

    // Apply command line overrides
    config.apply_args(args.endpoint, args.tag_count, args.folder, args.output_dir);
    config::validate_specific_rules(&config)?;

    let connector: Arc<dyn OpcConnector> = if args.simulate {
        info!("Using the simulated address space");
        Arc::new(SimulationConnector::new())
    } else {
        Arc::new(UaTcpConnector::new())
    };

    info!("Starting in daemon mode");
    let mut daemon = Daemon::new();
    daemon.launch(connector, &config)?;

    // Wait for termination signal or for a bounded retry policy to give up
    tokio::select! {
        result = daemon.wait() => return result,
        signal = signal::ctrl_c() => {
            if let Err(err) = signal {
                error!("Error waiting for shutdown signal: {}", err);
            } else {
                info!("Received shutdown signal, terminating logger");
            }
        }
    }

    daemon.shutdown();
    daemon.wait().await
}
