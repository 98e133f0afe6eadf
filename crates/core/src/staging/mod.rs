//! Input staging for ungrib and real.exe.
//!
//! ungrib reads its GRIB input through links named `GRIBFILE.AAA`,
//! `GRIBFILE.AAB`, ... in the WPS directory. [`link_grib`] replaces the
//! current set of links with a new one. [`link_metgrid_outputs`] does the
//! same for the metgrid output real.exe reads.

pub mod met_em;
pub mod nam;

pub use met_em::link_metgrid_outputs;
pub use nam::{DatasetError, NamDataset};

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Prefix of the links ungrib reads.
pub const GRIB_LINK_PREFIX: &str = "GRIBFILE.";

/// Number of distinct link extensions, `AAA` through `ZZZ`.
pub const MAX_GRIB_FILES: usize = 26 * 26 * 26;

/// Errors from staging program input.
#[derive(Error, Debug)]
pub enum StagingError {
    #[error("Cannot link {count} files: at most {MAX_GRIB_FILES} GRIB files are supported")]
    TooManyFiles { count: usize },

    #[error("Failed to list {path}: {source}")]
    ReadDir { path: PathBuf, source: io::Error },

    #[error("No metgrid output (met_em.*.nc) in {path}")]
    NoMetgridOutput { path: PathBuf },

    #[error("Failed to remove link {path}: {source}")]
    RemoveLink { path: PathBuf, source: io::Error },

    #[error("Failed to link {target} as {link}: {source}")]
    CreateLink {
        target: PathBuf,
        link: PathBuf,
        source: io::Error,
    },
}

/// Link file extensions in order: `AAA`, `AAB`, ..., `AAZ`, `ABA`, ...,
/// `ZZZ`.
#[derive(Debug, Clone, Default)]
pub struct GribExtensions {
    next: usize,
}

impl GribExtensions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Iterator for GribExtensions {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= MAX_GRIB_FILES {
            return None;
        }
        let index = self.next;
        self.next += 1;

        let letter = |place: usize| char::from(b'A' + ((index / place) % 26) as u8);
        Some([letter(26 * 26), letter(26), letter(1)].iter().collect())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = MAX_GRIB_FILES - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GribExtensions {}

/// Replace the `GRIBFILE.???` links in `wps_dir` with links to `files`.
///
/// Existing links are removed first. The inputs are sorted by path and linked
/// in that order, so the first file becomes `GRIBFILE.AAA`.
///
/// # Errors
///
/// Returns `StagingError::TooManyFiles` before touching the directory if
/// there are more inputs than extensions. Filesystem failures are reported
/// with the path involved.
///
/// # Returns
///
/// The created links, in extension order.
pub fn link_grib<P: AsRef<Path>>(
    wps_dir: &Path,
    files: &[P],
) -> Result<Vec<PathBuf>, StagingError> {
    if files.len() > MAX_GRIB_FILES {
        return Err(StagingError::TooManyFiles { count: files.len() });
    }

    let removed = remove_grib_links(wps_dir)?;
    debug!(dir = %wps_dir.display(), removed, "removed old GRIB links");

    let mut sorted: Vec<&Path> = files.iter().map(AsRef::as_ref).collect();
    sorted.sort();

    let mut links = Vec::with_capacity(sorted.len());
    for (extension, target) in GribExtensions::new().zip(sorted) {
        let link = wps_dir.join(format!("{GRIB_LINK_PREFIX}{extension}"));
        debug!(target = %target.display(), link = %link.display(), "linking GRIB file");
        symlink(target, &link).map_err(|source| StagingError::CreateLink {
            target: target.to_path_buf(),
            link: link.clone(),
            source,
        })?;
        links.push(link);
    }

    info!(dir = %wps_dir.display(), count = links.len(), "GRIB files linked");
    Ok(links)
}

fn is_grib_link(name: &str) -> bool {
    name.strip_prefix(GRIB_LINK_PREFIX)
        .is_some_and(|extension| extension.chars().count() == 3)
}

fn remove_grib_links(wps_dir: &Path) -> Result<usize, StagingError> {
    let entries = std::fs::read_dir(wps_dir).map_err(|source| StagingError::ReadDir {
        path: wps_dir.to_path_buf(),
        source,
    })?;

    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|source| StagingError::ReadDir {
            path: wps_dir.to_path_buf(),
            source,
        })?;
        let name = entry.file_name();
        if !name.to_str().is_some_and(is_grib_link) {
            continue;
        }

        let path = entry.path();
        std::fs::remove_file(&path).map_err(|source| StagingError::RemoveLink { path, source })?;
        removed += 1;
    }
    Ok(removed)
}

#[cfg(unix)]
pub(crate) fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
pub(crate) fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
