//! Per-program log file.
//!
//! Every line received from a program is appended as
//! `<timestamp> - <program> - <LEVEL> - <line>`. The file handle is owned by
//! [`LineLog`] and closed when it is dropped, whichever way the run ends.

use crate::supervisor::sink::StreamKind;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Append-only log of one program's output.
#[derive(Debug)]
pub struct LineLog {
    program: String,
    path: PathBuf,
    file: File,
}

impl LineLog {
    /// Open (or create) `path` in append mode.
    pub fn open(path: &Path, program: &str) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            program: program.to_string(),
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry. Each entry is written with a single call so lines
    /// from concurrent writers never interleave mid-entry.
    pub fn write(&mut self, stream: StreamKind, line: &str) -> io::Result<()> {
        let entry = format!(
            "{} - {} - {} - {}\n",
            chrono::Local::now().format(TIMESTAMP_FORMAT),
            self.program,
            stream.level(),
            line
        );
        self.file.write_all(entry.as_bytes())
    }

    /// Flush and close.
    pub fn finish(mut self) -> io::Result<()> {
        self.file.flush()
    }
}
