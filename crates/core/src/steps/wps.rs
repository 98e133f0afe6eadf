//! Factories for the three WPS programs.
//!
//! Each step renders the full `namelist.wps` from the shared validated
//! configuration and runs `<program>.exe` inside the WPS directory.

use crate::config::ValidatedWpsConfig;
use crate::monitor::classifiers::{contains_error, inventory_date};
use crate::monitor::ClassifierSet;
use crate::namelist::wps_namelist;
use crate::steps::{ConfigRenderer, ProgramStep};
use std::path::Path;
use std::sync::Arc;
use wr_protocol::Progress;

fn namelist_renderer(config: &Arc<ValidatedWpsConfig>) -> ConfigRenderer {
    let config = Arc::clone(config);
    Box::new(move || Ok(wps_namelist(&config).render()))
}

/// geogrid: static fields, one unit per domain.
pub fn geogrid(config: &Arc<ValidatedWpsConfig>, wps_path: &Path) -> ProgramStep {
    ProgramStep::new(
        "geogrid",
        "geogrid.exe",
        wps_path,
        namelist_renderer(config),
        config.domain_count(),
        ClassifierSet::wps("geogrid"),
    )
}

/// ungrib: one unit per input time between the start and end dates.
///
/// Progress comes from the `Inventory for date = ...` lines ungrib prints for
/// every input time it processes.
pub fn ungrib(config: &Arc<ValidatedWpsConfig>, wps_path: &Path) -> ProgramStep {
    let dates = Arc::clone(config);
    let progress = move |line: &str| {
        let date = inventory_date(line)?;
        let index = dates.interval_index(date)?;
        Some(Progress::new(index + 1, dates.interval_count()))
    };

    ProgramStep::new(
        "ungrib",
        "ungrib.exe",
        wps_path,
        namelist_renderer(config),
        config.interval_count(),
        ClassifierSet::new(
            progress,
            |line: &str| line.contains("Successful completion of ungrib"),
            contains_error,
        ),
    )
}

/// metgrid: horizontal interpolation, one unit per domain.
pub fn metgrid(config: &Arc<ValidatedWpsConfig>, wps_path: &Path) -> ProgramStep {
    ProgramStep::new(
        "metgrid",
        "metgrid.exe",
        wps_path,
        namelist_renderer(config),
        config.domain_count(),
        ClassifierSet::wps("metgrid"),
    )
}

/// geogrid, ungrib and metgrid in run order.
pub fn wps_steps(config: &Arc<ValidatedWpsConfig>, wps_path: &Path) -> Vec<ProgramStep> {
    vec![
        geogrid(config, wps_path),
        ungrib(config, wps_path),
        metgrid(config, wps_path),
    ]
}
