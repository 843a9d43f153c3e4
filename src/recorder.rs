// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Hourly CSV output
//!
//! One file per local calendar hour, named `<prefix>_<YYYY>-<MM>-<DD>_<HH>.csv`.
//! A file is created on the first write of its hour with the header of the
//! schema active at that moment. Later sessions append to it as-is, even if
//! their tag names differ.
//!
//! Every write opens the file in append mode and closes it again, so a crash
//! loses at most the row being written.

use std::borrow::Cow;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::{debug, info, warn};

use crate::client::Variant;
use crate::discovery::TagSchema;
use crate::error::LoggerError;

/// Default file name prefix.
pub const DEFAULT_FILE_PREFIX: &str = "OPC_Log";

const LINE_TERMINATOR: &str = "\r\n";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One sample of every tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Local wall clock time of the sample.
    pub local: NaiveDateTime,
    /// UTC epoch seconds of the same instant.
    pub epoch: i64,
    /// One entry per tag, `None` when the read failed.
    pub values: Vec<Option<Variant>>,
}

impl Row {
    pub fn fields(&self) -> Vec<String> {
        let mut fields = Vec::with_capacity(self.values.len() + 2);
        fields.push(self.local.format(TIMESTAMP_FORMAT).to_string());
        fields.push(self.epoch.to_string());
        fields.extend(
            self.values
                .iter()
                .map(|value| value.as_ref().map(Variant::to_string).unwrap_or_default()),
        );
        fields
    }
}

/// Writes rows into hourly rotating CSV files.
#[derive(Debug, Clone)]
pub struct HourlyCsvWriter {
    directory: PathBuf,
    prefix: String,
}

impl HourlyCsvWriter {
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
        }
    }

    /// File name for the hour containing `local`.
    pub fn file_name(&self, local: &NaiveDateTime) -> String {
        format!("{}_{}.csv", self.prefix, local.format("%Y-%m-%d_%H"))
    }

    pub fn path_for(&self, local: &NaiveDateTime) -> PathBuf {
        self.directory.join(self.file_name(local))
    }

    /// Create `path` with the schema header unless it already exists.
    ///
    /// Returns `true` when the file was created. A file whose header could not
    /// be written is removed again, so the next attempt starts over.
    fn ensure_header(&self, path: &Path, schema: &TagSchema) -> Result<bool, LoggerError> {
        if !self.directory.as_os_str().is_empty() && !self.directory.exists() {
            debug!("Creating output directory {:?}", self.directory);
            fs::create_dir_all(&self.directory)
                .map_err(|err| LoggerError::output(&self.directory, err))?;
        }

        let file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
            Err(err) => return Err(LoggerError::output(path, err)),
        };

        write_header(path, file, &schema.header())?;
        info!("Created {}", path.display());
        Ok(true)
    }

    /// Append `row` to `path`.
    fn append_row(&self, path: &Path, row: &Row) -> Result<(), LoggerError> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(|err| LoggerError::output(path, err))?;
        write_record(&mut file, &row.fields()).map_err(|err| LoggerError::output(path, err))
    }

    /// Write `row` into the file of its hour, creating it with the schema
    /// header first if needed. Returns the file path.
    pub fn write(&self, schema: &TagSchema, row: &Row) -> Result<PathBuf, LoggerError> {
        let path = self.path_for(&row.local);
        self.ensure_header(&path, schema)?;
        self.append_row(&path, row)?;
        Ok(path)
    }
}

/// Write the header into a freshly created `file`, removing `path` on failure.
fn write_header<W: Write>(path: &Path, mut file: W, header: &[String]) -> Result<(), LoggerError> {
    if let Err(err) = write_record(&mut file, header) {
        drop(file);
        if let Err(remove_err) = fs::remove_file(path) {
            warn!("Failed to remove headerless {}: {}", path.display(), remove_err);
        }
        return Err(LoggerError::output(path, err));
    }
    Ok(())
}

fn write_record<W: Write>(file: &mut W, fields: &[String]) -> io::Result<()> {
    let line = format_record(fields);
    file.write_all(line.as_bytes())?;
    file.flush()
}

/// Join fields into one CSV line, quoting where needed.
pub fn format_record<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = fields
        .iter()
        .map(|field| escape_field(field.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push_str(LINE_TERMINATOR);
    line
}

/// Quote a field containing a separator, a quote or a line break.
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
