// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use common::{bad_status, FakeServer, ENDPOINT, FOLDER};
use rust_opcua_logger::client::{SimulationConnector, Variant};
use rust_opcua_logger::config::Config;
use rust_opcua_logger::daemon::{Daemon, ReconnectLoop};
use rust_opcua_logger::shutdown::shutdown_channel;
use tempfile::tempdir;

fn config_for(dir: &Path, tag_count: usize) -> Config {
    let mut config = Config::default();
    config.server.endpoint = ENDPOINT.to_string();
    config.server.folder = FOLDER.to_string();
    config.server.tag_count = tag_count;
    config.output.directory = dir.to_path_buf();
    config
}

fn csv_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    files.sort();
    files
}

#[tokio::test(start_paused = true)]
async fn test_discovered_tags_cycle_and_failed_reads_stay_empty() {
    let dir = tempdir().unwrap();
    let server = FakeServer::new();
    let (trigger, signal) = shutdown_channel();
    {
        let mut state = server.state();
        state.read_script = vec![
            Ok(Variant::Int(1)),
            Err(bad_status(2)),
            Ok(Variant::Int(3)),
            Ok(Variant::Int(4)),
            Err(bad_status(2)),
        ]
        .into();
        state.stop_after_reads = Some(5);
        state.trigger = Some(Arc::new(trigger));
    }

    let config = config_for(dir.path(), 5);
    let mut logger = ReconnectLoop::new(Arc::new(server.clone()), &config, signal);
    logger.run().await.unwrap();

    let files = csv_files(dir.path());
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("OPC_Log_") && name.ends_with(".csv"), "{name}");

    let content = fs::read_to_string(&files[0]).unwrap();
    let lines: Vec<&str> = content.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert_eq!(
        lines[0],
        "Timestamp,Timestamp_UTC_Epoch,Tag1_A,Tag2_B,Tag3_C,Tag4_A,Tag5_B"
    );
    assert_eq!(lines.len(), 2);

    let fields: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(fields.len(), 7);
    assert!(fields[1].parse::<i64>().is_ok());
    assert_eq!(&fields[2..], ["1", "", "3", "4", ""]);

    let state = server.state();
    assert_eq!(state.connects.len(), 1);
    assert_eq!(state.disconnects, 1);
}

#[tokio::test(start_paused = true)]
async fn test_daemon_logs_simulation_folder() {
    let dir = tempdir().unwrap();
    let mut config = Config::default();
    config.server.tag_count = 8;
    config.output.directory = dir.path().join("logs");
    config.output.file_prefix = "Sim".to_string();

    let mut daemon = Daemon::new();
    daemon
        .launch(Arc::new(SimulationConnector::new()), &config)
        .unwrap();
    assert!(daemon
        .launch(Arc::new(SimulationConnector::new()), &config)
        .is_err());

    // Let the task take its first sample, it then waits for the next minute
    tokio::time::sleep(Duration::from_millis(10)).await;
    daemon.shutdown();
    daemon.wait().await.unwrap();

    let files = csv_files(&config.output.directory);
    assert!(!files.is_empty());
    let content = fs::read_to_string(&files[0]).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Timestamp,Timestamp_UTC_Epoch,Tag1_Counter,Tag2_Random,Tag3_Sawtooth,\
         Tag4_Sinusoid,Tag5_Square,Tag6_Triangle,Tag7_Counter,Tag8_Random"
    );
    let row: Vec<&str> = lines.next().unwrap().split(',').collect();
    assert_eq!(row.len(), 10);
    assert!(row[2..].iter().all(|field| !field.is_empty()));
}
