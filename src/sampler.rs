// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Minute-aligned sampling loop
//!
//! Within a session the sampler takes one row per calendar minute:
//!
//! 1. capture the local time and the UTC epoch of the same instant
//! 2. read every tag, an unreadable tag becomes an empty field
//! 3. append the row to the hourly file, header first if the file is new
//! 4. sleep until second 0 of the next minute
//!
//! A session fault still lets the current row be written, then ends the loop.
//! Output errors end it at once. Both are returned to the reconnect loop.

use std::time::Duration;

use chrono::{DateTime, Local, Timelike};
use log::{debug, info, warn};

use crate::client::{ClientError, OpcSession, Variant};
use crate::discovery::TagSchema;
use crate::error::LoggerError;
use crate::recorder::{format_record, HourlyCsvWriter, Row};
use crate::shutdown::ShutdownSignal;

const MINUTE: Duration = Duration::from_secs(60);

/// Time left until second 0 of the minute following `now`.
///
/// The result is in `(0, 60]` seconds; it only reaches 60 s when `now` sits
/// exactly on a minute boundary.
pub fn duration_until_next_minute<T: Timelike>(now: &T) -> Duration {
    // Leap seconds report nanosecond() >= 1e9, fold them into the last second.
    let nanos = now.nanosecond().min(999_999_999);
    let into_minute =
        Duration::from_secs(u64::from(now.second())) + Duration::from_nanos(u64::from(nanos));
    MINUTE.saturating_sub(into_minute)
}

/// Samples the tags of one session into hourly CSV files.
pub struct Sampler<'a> {
    session: &'a mut dyn OpcSession,
    schema: &'a TagSchema,
    writer: &'a HourlyCsvWriter,
}

impl<'a> Sampler<'a> {
    pub fn new(
        session: &'a mut dyn OpcSession,
        schema: &'a TagSchema,
        writer: &'a HourlyCsvWriter,
    ) -> Self {
        Self {
            session,
            schema,
            writer,
        }
    }

    /// Read every tag of the schema in order.
    ///
    /// A failing node yields `None` for that position only. The first
    /// session fault met during the pass is returned alongside the values.
    pub async fn read_values(&mut self) -> (Vec<Option<Variant>>, Option<ClientError>) {
        let mut values = Vec::with_capacity(self.schema.len());
        let mut fault = None;
        for tag in self.schema.tags() {
            match self.session.read_value(&tag.node).await {
                Ok(value) => values.push(Some(value)),
                Err(err) => {
                    warn!("Failed to read {} ({}): {}", tag.name, tag.node, err);
                    values.push(None);
                    if fault.is_none() && err.is_session_fault() {
                        fault = Some(err);
                    }
                }
            }
        }
        (values, fault)
    }

    /// Take one sample stamped with `now` and append it to the file of the
    /// current hour.
    ///
    /// The row is written even when the session failed during the reads; the
    /// session fault is returned afterwards.
    pub async fn sample_at(&mut self, now: DateTime<Local>) -> Result<Row, LoggerError> {
        let (values, fault) = self.read_values().await;
        let row = Row {
            local: now.naive_local(),
            epoch: now.timestamp(),
            values,
        };
        self.writer.write(self.schema, &row)?;
        info!("Wrote: {}", format_record(&row.fields()).trim_end());

        match fault {
            Some(err) => Err(err.into()),
            None => Ok(row),
        }
    }

    /// Sample once per minute until an error occurs or shutdown is requested.
    pub async fn run(&mut self, shutdown: &mut ShutdownSignal) -> Result<(), LoggerError> {
        while shutdown.is_running() {
            self.sample_at(Local::now()).await?;

            let wait = duration_until_next_minute(&Local::now());
            debug!("Next sample in {:.3}s", wait.as_secs_f64());
            if !shutdown.sleep(wait).await {
                break;
            }
        }
        debug!("Sampling stopped on shutdown request");
        Ok(())
    }
}
