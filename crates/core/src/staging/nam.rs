//! NAM 218 GRIB2 dataset discovery.
//!
//! Files are named `nam_218_YYYYMMDD_HHMM_FFF.grb2`. A dataset is a folder
//! holding one file for every 6-hour slot between its first and last date.

use chrono::{Duration, NaiveDateTime};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Hours between consecutive NAM analyses.
pub const NAM_TIME_STEP_HOURS: i64 = 6;

/// Grid spacing of the NAM 218 grid, in kilometres.
pub const NAM_GRID_SPACING_KM: u32 = 12;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to scan dataset folder {path}: {source}")]
    Scan { path: PathBuf, source: walkdir::Error },

    #[error("No NAM files found in {path}")]
    Empty { path: PathBuf },

    #[error("Dataset not complete: {date} is missing")]
    MissingDate { date: NaiveDateTime },
}

/// A complete NAM dataset on disk.
#[derive(Debug, Clone)]
pub struct NamDataset {
    folder: PathBuf,
    files: BTreeMap<NaiveDateTime, PathBuf>,
}

impl NamDataset {
    /// Scan `folder` (not recursively) and check the dataset is complete.
    ///
    /// When several files share a date, the first in name order is kept.
    pub fn open(folder: &Path) -> Result<Self, DatasetError> {
        let mut files = BTreeMap::new();

        for entry in WalkDir::new(folder)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|source| DatasetError::Scan {
                path: folder.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_file() && !entry.path_is_symlink() {
                continue;
            }

            let Some(date) = entry.file_name().to_str().and_then(file_date) else {
                continue;
            };
            files.entry(date).or_insert_with(|| entry.path().to_path_buf());
        }

        let dataset = Self {
            folder: folder.to_path_buf(),
            files,
        };
        dataset.check_complete()?;

        info!(
            folder = %folder.display(),
            files = dataset.files.len(),
            "NAM dataset opened"
        );
        Ok(dataset)
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn time_step(&self) -> Duration {
        Duration::hours(NAM_TIME_STEP_HOURS)
    }

    /// First date in the dataset.
    pub fn start(&self) -> Option<NaiveDateTime> {
        self.files.keys().next().copied()
    }

    /// Last date in the dataset.
    pub fn end(&self) -> Option<NaiveDateTime> {
        self.files.keys().next_back().copied()
    }

    /// Data files in date order.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.values().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn check_complete(&self) -> Result<(), DatasetError> {
        let (Some(start), Some(end)) = (self.start(), self.end()) else {
            return Err(DatasetError::Empty {
                path: self.folder.clone(),
            });
        };

        let mut date = start;
        while date <= end {
            if !self.files.contains_key(&date) {
                return Err(DatasetError::MissingDate { date });
            }
            debug!(%date, "NAM slot present");
            date += self.time_step();
        }
        Ok(())
    }
}

fn nam_file_regex() -> Option<&'static Regex> {
    static NAM_FILE_RE: OnceLock<Option<Regex>> = OnceLock::new();
    NAM_FILE_RE
        .get_or_init(|| Regex::new(r"^nam_218_(\d{8}_\d{4})_\d+\.grb2$").ok())
        .as_ref()
}

/// Analysis date encoded in a NAM file name.
pub fn file_date(name: &str) -> Option<NaiveDateTime> {
    let captures = nam_file_regex()?.captures(name)?;
    NaiveDateTime::parse_from_str(captures.get(1)?.as_str(), "%Y%m%d_%H%M").ok()
}
