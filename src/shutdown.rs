// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Shutdown signalling for the logger loops

use std::time::Duration;

use tokio::sync::watch;

/// Create a linked trigger/signal pair.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, ShutdownSignal { rx })
}

/// Requests shutdown of every linked [`ShutdownSignal`].
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// Observed by the loops to know when to stop.
///
/// If the trigger is dropped without firing, the signal stays in the running
/// state forever.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn is_running(&self) -> bool {
        !*self.rx.borrow()
    }

    /// Sleep for `duration`, waking early on shutdown.
    ///
    /// Returns `true` if the logger should keep running.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if !self.is_running() {
            return false;
        }

        let stopped = tokio::select! {
            _ = tokio::time::sleep(duration) => false,
            _ = Self::stopped(&mut self.rx) => true,
        };
        !stopped && self.is_running()
    }

    async fn stopped(rx: &mut watch::Receiver<bool>) {
        let sender_dropped = rx.wait_for(|stop| *stop).await.is_err();
        if sender_dropped {
            std::future::pending::<()>().await;
        }
    }
}
