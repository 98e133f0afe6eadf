//! Hand-off of metgrid output to real.exe.
//!
//! metgrid writes `met_em.d<NN>.<date>.nc` into the WPS directory; real.exe
//! expects them in its own directory. [`link_metgrid_outputs`] replaces the
//! links there with links to the current output.

use super::{symlink, StagingError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Whether `name` is a metgrid output file.
pub fn is_met_em(name: &str) -> bool {
    name.starts_with("met_em.") && name.ends_with(".nc")
}

/// Link every `met_em.*.nc` of `wps_dir` into `wrf_dir`.
///
/// Existing `met_em.*.nc` entries in `wrf_dir` are removed first. Links
/// point at absolute paths.
///
/// # Errors
///
/// Returns `StagingError::NoMetgridOutput` without touching `wrf_dir` when
/// `wps_dir` holds no metgrid output.
///
/// # Returns
///
/// The created links, sorted by name.
pub fn link_metgrid_outputs(
    wps_dir: &Path,
    wrf_dir: &Path,
) -> Result<Vec<PathBuf>, StagingError> {
    let source_dir = std::path::absolute(wps_dir).map_err(|source| StagingError::ReadDir {
        path: wps_dir.to_path_buf(),
        source,
    })?;
    let outputs = met_em_entries(&source_dir)?;
    if outputs.is_empty() {
        return Err(StagingError::NoMetgridOutput { path: source_dir });
    }
    info!(dir = %source_dir.display(), count = outputs.len(), "metgrid output found");

    let stale = met_em_entries(wrf_dir)?;
    for path in &stale {
        std::fs::remove_file(path).map_err(|source| StagingError::RemoveLink {
            path: path.clone(),
            source,
        })?;
    }
    if !stale.is_empty() {
        info!(dir = %wrf_dir.display(), removed = stale.len(), "removed old met_em links");
    }

    let mut links = Vec::with_capacity(outputs.len());
    for target in outputs {
        let Some(name) = target.file_name() else {
            continue;
        };
        let link = wrf_dir.join(name);
        debug!(target = %target.display(), link = %link.display(), "linking metgrid output");
        symlink(&target, &link).map_err(|source| StagingError::CreateLink {
            target: target.clone(),
            link: link.clone(),
            source,
        })?;
        links.push(link);
    }

    info!(dir = %wrf_dir.display(), count = links.len(), "metgrid output linked");
    Ok(links)
}

fn met_em_entries(dir: &Path) -> Result<Vec<PathBuf>, StagingError> {
    let entries = std::fs::read_dir(dir).map_err(|source| StagingError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| StagingError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_name().to_str().is_some_and(is_met_em) {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}
