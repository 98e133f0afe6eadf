//! Factories for real.exe and wrf.exe, plus the step handing metgrid output
//! over to them.
//!
//! Both programs read `namelist.input` from the WRF run directory and are
//! normally started under MPI. Built with MPI they write their messages to
//! `rsl.error.0000` rather than stdout; the step reads that file once the
//! program has exited.

use crate::config::ValidatedWpsConfig;
use crate::monitor::classifiers::{real_progress, wrf_fatal, wrf_model_time, wrf_success};
use crate::monitor::ClassifierSet;
use crate::namelist::wrf::{wrf_namelist, WRF_NAMELIST_FILE};
use crate::pipeline::Step;
use crate::staging::{link_metgrid_outputs, StagingError};
use crate::steps::{ConfigRenderer, ProgramStep};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::error;
use wr_protocol::{Progress, SystemConfig};

/// Messages of MPI rank 0.
pub const RSL_ERROR_FILE: &str = "rsl.error.0000";

fn namelist_renderer(config: &Arc<ValidatedWpsConfig>) -> ConfigRenderer {
    let config = Arc::clone(config);
    Box::new(move || Ok(wrf_namelist(&config).render()))
}

/// Command prefix starting a program on `processes` MPI ranks: the
/// configured `wrf_launcher`, or `mpirun -n <processes>`.
pub fn mpi_launcher(system: &SystemConfig, processes: u32) -> Vec<String> {
    if !system.wrf_launcher.is_empty() {
        return system.wrf_launcher.clone();
    }
    vec![
        "mpirun".to_string(),
        "-n".to_string(),
        processes.max(1).to_string(),
    ]
}

/// real.exe: initial and boundary conditions, one unit per input time.
pub fn real(config: &Arc<ValidatedWpsConfig>, wrf_path: &Path) -> ProgramStep {
    ProgramStep::new(
        "real",
        "real.exe",
        wrf_path,
        namelist_renderer(config),
        config.interval_count(),
        ClassifierSet::new(real_progress, wrf_success, wrf_fatal),
    )
    .with_config_file(WRF_NAMELIST_FILE)
    .with_output_file(RSL_ERROR_FILE)
}

/// wrf.exe: the forecast, one unit per simulated minute of the outer
/// domain.
pub fn wrf(config: &Arc<ValidatedWpsConfig>, wrf_path: &Path) -> ProgramStep {
    let window = Arc::clone(config);
    let progress = move |line: &str| {
        let time = wrf_model_time(line)?;
        let elapsed = u32::try_from((time - window.start()).num_minutes()).ok()?;
        let total = window.simulation_minutes();
        Some(Progress::new(elapsed.min(total), total))
    };

    ProgramStep::new(
        "wrf",
        "wrf.exe",
        wrf_path,
        namelist_renderer(config),
        config.simulation_minutes(),
        ClassifierSet::new(progress, wrf_success, wrf_fatal),
    )
    .with_config_file(WRF_NAMELIST_FILE)
    .with_output_file(RSL_ERROR_FILE)
}

/// Links the metgrid output of the WPS directory into the WRF directory.
#[derive(Debug)]
pub struct LinkMetgridStep {
    wps_path: PathBuf,
    wrf_path: PathBuf,
    linked: usize,
    last_error: Option<StagingError>,
}

impl LinkMetgridStep {
    pub fn new(wps_path: impl Into<PathBuf>, wrf_path: impl Into<PathBuf>) -> Self {
        Self {
            wps_path: wps_path.into(),
            wrf_path: wrf_path.into(),
            linked: 0,
            last_error: None,
        }
    }

    /// Files linked by the last run.
    pub fn linked(&self) -> usize {
        self.linked
    }

    pub fn last_error(&self) -> Option<&StagingError> {
        self.last_error.as_ref()
    }
}

#[async_trait]
impl Step for LinkMetgridStep {
    async fn run(&mut self) -> bool {
        match link_metgrid_outputs(&self.wps_path, &self.wrf_path) {
            Ok(links) => {
                self.linked = links.len();
                self.last_error = None;
                true
            }
            Err(e) => {
                error!(error = %e, "linking metgrid output failed");
                self.linked = 0;
                self.last_error = Some(e);
                false
            }
        }
    }

    fn description(&self) -> &str {
        "link met_em"
    }

    fn failure(&self) -> Option<String> {
        self.last_error.as_ref().map(ToString::to_string)
    }
}
