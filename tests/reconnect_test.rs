// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

mod common;

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use common::{FakeServer, ENDPOINT, FOLDER};
use rust_opcua_logger::client::{ClientError, Variant};
use rust_opcua_logger::config::Config;
use rust_opcua_logger::daemon::{ReconnectLoop, RetryPolicy};
use rust_opcua_logger::shutdown::{shutdown_channel, ShutdownSignal};
use rust_opcua_logger::LoggerError;
use tempfile::tempdir;

fn config_for(dir: &Path) -> Config {
    let mut config = Config::default();
    config.server.endpoint = ENDPOINT.to_string();
    config.server.folder = FOLDER.to_string();
    config.server.tag_count = 3;
    config.output.directory = dir.to_path_buf();
    config
}

fn data_rows(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| fs::read_to_string(entry.unwrap().path()).unwrap())
        .map(|content| content.lines().count().saturating_sub(1))
        .sum()
}

/// Server whose trigger fires after `reads` values have been served.
fn stopping_server(reads: usize) -> (FakeServer, ShutdownSignal) {
    let server = FakeServer::new();
    let (trigger, signal) = shutdown_channel();
    {
        let mut state = server.state();
        state.stop_after_reads = Some(reads);
        state.trigger = Some(Arc::new(trigger));
    }
    (server, signal)
}

#[tokio::test(start_paused = true)]
async fn test_refused_connection_retries_after_five_seconds() {
    let dir = tempdir().unwrap();
    let (server, signal) = stopping_server(3);
    server.state().connect_script = vec![false].into();

    let mut logger = ReconnectLoop::new(Arc::new(server.clone()), &config_for(dir.path()), signal);
    logger.run().await.unwrap();

    let state = server.state();
    assert_eq!(state.connects.len(), 2);
    let gap = state.connects[1] - state.connects[0];
    assert!(gap >= Duration::from_secs(5) && gap < Duration::from_secs(6));
    assert_eq!(data_rows(dir.path()), 1);
}

#[tokio::test(start_paused = true)]
async fn test_session_fault_mid_loop_reconnects() {
    let dir = tempdir().unwrap();
    let (server, signal) = stopping_server(6);
    server.state().read_script = vec![
        Ok(Variant::Int(7)),
        Err(ClientError::SessionClosed),
        Ok(Variant::Int(9)),
    ]
    .into();

    let mut logger = ReconnectLoop::new(Arc::new(server.clone()), &config_for(dir.path()), signal);
    logger.run().await.unwrap();

    let state = server.state();
    assert_eq!(state.connects.len(), 2);
    assert_eq!(state.disconnects, 2);
    assert!(state.connects[1] - state.connects[0] >= Duration::from_secs(5));
    // The row of the failing pass is kept with an empty field
    assert_eq!(data_rows(dir.path()), 2);
    let first_row = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| fs::read_to_string(entry.unwrap().path()).unwrap())
        .filter_map(|content| content.lines().nth(1).map(str::to_string))
        .min()
        .unwrap();
    assert!(first_row.ends_with(",7,,9"), "{first_row}");
}

#[tokio::test(start_paused = true)]
async fn test_bounded_policy_gives_up() {
    let dir = tempdir().unwrap();
    let server = FakeServer::new();
    server.state().connect_script = vec![false; 3].into();
    let (_trigger, signal) = shutdown_channel();

    let mut config = config_for(dir.path());
    config.retry.max_attempts = Some(3);
    let mut logger = ReconnectLoop::new(Arc::new(server.clone()), &config, signal);

    let err = logger.run().await.unwrap_err();
    assert!(matches!(err, LoggerError::RetriesExhausted { attempts: 3 }));
    assert_eq!(server.state().connects.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_missing_folder_is_retried_and_session_released() {
    let dir = tempdir().unwrap();
    let server = FakeServer::new();
    let (_trigger, signal) = shutdown_channel();

    let mut config = config_for(dir.path());
    config.server.folder = "Missing".to_string();
    let mut logger = ReconnectLoop::new(Arc::new(server.clone()), &config, signal)
        .with_policy(RetryPolicy::fixed(Duration::from_secs(5)).with_max_attempts(2));

    let err = logger.run().await.unwrap_err();
    assert!(matches!(err, LoggerError::RetriesExhausted { attempts: 2 }));

    let state = server.state();
    assert_eq!(state.connects.len(), 2);
    assert_eq!(state.disconnects, 2);
    assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_successful_discovery_resets_failure_count() {
    let dir = tempdir().unwrap();
    let (server, signal) = stopping_server(6);
    {
        let mut state = server.state();
        state.connect_script = vec![false, true, false].into();
        state.read_script = vec![Err(ClientError::SessionClosed)].into();
    }

    let mut config = config_for(dir.path());
    config.retry.max_attempts = Some(3);
    let mut logger = ReconnectLoop::new(Arc::new(server.clone()), &config, signal);

    logger.run().await.unwrap();
    assert_eq!(logger.failures(), 0);
    assert_eq!(server.state().connects.len(), 4);
    assert_eq!(data_rows(dir.path()), 2);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_backoff() {
    let dir = tempdir().unwrap();
    let server = FakeServer::new();
    server.state().connect_script = vec![false].into();
    let (trigger, signal) = shutdown_channel();

    let mut logger = ReconnectLoop::new(Arc::new(server.clone()), &config_for(dir.path()), signal);
    let stopper = async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.trigger();
    };

    let (result, ()) = tokio::join!(logger.run(), stopper);
    result.unwrap();
    assert_eq!(server.state().connects.len(), 1);
}
