// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::{Context, Result};
use clap::Parser;
use rust_opcua_logger::client::{OpcConnector, SimulationConnector, UaTcpConnector};
use rust_opcua_logger::config::server::{DEFAULT_ENDPOINT, DEFAULT_FOLDER, DEFAULT_TAG_COUNT};
use rust_opcua_logger::discovery::discover_nodes;

/// Connect once, print the tags the logger would record and the CSV header
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// OPC UA endpoint URL
    #[clap(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Folder under Objects to discover
    #[clap(long, default_value = DEFAULT_FOLDER)]
    folder: String,

    /// Number of tags
    #[clap(long, default_value_t = DEFAULT_TAG_COUNT)]
    tag_count: usize,

    /// Also read and print the current value of every tag
    #[clap(long)]
    read: bool,

    /// Browse the built-in simulated address space instead of a real server
    #[clap(long)]
    simulate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let args = Args::parse();

    println!("Connecting to OPC UA server at {}", args.endpoint);
    let connector: Box<dyn OpcConnector> = if args.simulate {
        Box::new(SimulationConnector::new())
    } else {
        Box::new(UaTcpConnector::new())
    };
    let mut session = connector
        .connect(&args.endpoint)
        .await
        .with_context(|| format!("Failed to connect to {}", args.endpoint))?;

    let discovered = discover_nodes(session.as_mut(), &args.folder, args.tag_count).await;
    let schema = match discovered {
        Ok(schema) => schema,
        Err(err) => {
            let _ = session.disconnect().await;
            return Err(err).context("Tag discovery failed");
        }
    };

    println!("CSV header:");
    println!("{}", schema.header().join(","));

    if args.read {
        for (index, tag) in schema.tags().iter().enumerate() {
            match session.read_value(&tag.node).await {
                Ok(value) => println!("Tag{} {} = {}", index + 1, tag.name, value),
                Err(err) => println!("Tag{} {} unreadable: {}", index + 1, tag.name, err),
            }
        }
    }

    session.disconnect().await?;
    Ok(())
}
