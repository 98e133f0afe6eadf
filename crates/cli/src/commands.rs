//! Subcommand implementations.
//!
//! Each command returns `Ok(true)` on success and `Ok(false)` on a failure
//! already reported to the user; `main` turns `false` into exit code 1.

use crate::progress::StepBars;
use crate::Program;
use crate::RunArgs;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use colored::Colorize;
use std::error::Error as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use wr_core::config::loader::{
    load_system_config, load_wps_config, resolve_wps_path, resolve_wrf_path,
};
use wr_core::config::ValidatedWpsConfig;
use wr_core::namelist::wps_namelist;
use wr_core::pipeline::{Pipeline, Step};
use wr_core::staging::nam::NAM_GRID_SPACING_KM;
use wr_core::staging::{link_grib, NamDataset};
use wr_core::steps::wps::{geogrid, metgrid, ungrib, wps_steps};
use wr_core::steps::wrf::{mpi_launcher, real, wrf as wrf_step, LinkMetgridStep};
use wr_core::steps::ProgramStep;
use wr_protocol::SystemConfig;

/// Print the `namelist.wps` generated from `config`.
pub async fn generate_wps_namelist(config: &Path, debug: bool) -> Result<bool> {
    match load_wps_config(config).await {
        Ok(validated) => {
            print!("{}", wps_namelist(&validated).render());
            Ok(true)
        }
        Err(e) => {
            eprintln!("{}", e.to_string().on_red());
            if debug {
                let mut source = e.source();
                while let Some(cause) = source {
                    eprintln!("  caused by: {cause}");
                    source = cause.source();
                }
                eprintln!("{e:#?}");
            }
            Ok(false)
        }
    }
}

/// A step of the requested run, before front end settings are applied.
enum PlannedStep {
    Program {
        step: ProgramStep,
        launcher: Vec<String>,
    },
    LinkMetgrid(LinkMetgridStep),
}

impl PlannedStep {
    fn description(&self) -> &str {
        match self {
            PlannedStep::Program { step, .. } => step.description(),
            PlannedStep::LinkMetgrid(step) => step.description(),
        }
    }
}

fn plan_steps(
    program: Program,
    config: &Arc<ValidatedWpsConfig>,
    system: &SystemConfig,
    wps_path: Option<&Path>,
    wrf_path: Option<&Path>,
) -> Result<Vec<PlannedStep>> {
    let wps_program = |step: ProgramStep| PlannedStep::Program {
        step,
        launcher: system.launcher.clone(),
    };
    let wrf_program = |step: ProgramStep, processes: u32| PlannedStep::Program {
        step,
        launcher: mpi_launcher(system, processes),
    };
    let wps = || wps_path.ok_or_else(|| eyre!("WPS directory is required for {program:?}"));
    let wrf = || wrf_path.ok_or_else(|| eyre!("WRF directory is required for {program:?}"));
    let wrf_processes = system.wrf_processes.unwrap_or(1);

    let planned = match program {
        Program::Geogrid => vec![wps_program(geogrid(config, wps()?))],
        Program::Ungrib => vec![wps_program(ungrib(config, wps()?))],
        Program::Metgrid => vec![wps_program(metgrid(config, wps()?))],
        Program::Wps => wps_steps(config, wps()?)
            .into_iter()
            .map(wps_program)
            .collect::<Vec<_>>(),
        Program::Real => vec![wrf_program(real(config, wrf()?), 1)],
        Program::Wrf => vec![wrf_program(wrf_step(config, wrf()?), wrf_processes)],
        Program::All => {
            let (wps_dir, wrf_dir) = (wps()?, wrf()?);
            let mut planned: Vec<PlannedStep> = wps_steps(config, wps_dir)
                .into_iter()
                .map(wps_program)
                .collect();
            planned.push(PlannedStep::LinkMetgrid(LinkMetgridStep::new(wps_dir, wrf_dir)));
            planned.push(wrf_program(real(config, wrf_dir), 1));
            planned.push(wrf_program(wrf_step(config, wrf_dir), wrf_processes));
            planned
        }
    };
    Ok(planned)
}

/// Run one program, a whole stage, or the full chain in order.
pub async fn run(args: RunArgs, cancel: CancellationToken) -> Result<bool> {
    let config = Arc::new(
        load_wps_config(&args.config)
            .await
            .wrap_err("Failed to load the WPS configuration")?,
    );
    let system = load_system_config(args.system_config.as_deref())
        .await
        .wrap_err("Failed to load the system configuration")?;

    let wps_path = args
        .program
        .uses_wps()
        .then(|| resolve_wps_path(&system, args.wps_path.as_deref()))
        .transpose()?;
    let wrf_path = args
        .program
        .uses_wrf()
        .then(|| resolve_wrf_path(&system, args.wrf_path.as_deref()))
        .transpose()?;
    info!(
        wps_path = ?wps_path,
        wrf_path = ?wrf_path,
        program = ?args.program,
        "starting run"
    );

    let planned = plan_steps(
        args.program,
        &config,
        &system,
        wps_path.as_deref(),
        wrf_path.as_deref(),
    )?;

    let bars = (!args.no_progress)
        .then(|| StepBars::new(planned.iter().map(PlannedStep::description)));

    let log_dir = system.log_dir.clone();
    if let Some(dir) = &log_dir {
        std::fs::create_dir_all(dir)
            .wrap_err_with(|| format!("Failed to create log directory {}", dir.display()))?;
    }

    let mut steps: Vec<Box<dyn Step>> = planned
        .into_iter()
        .enumerate()
        .map(|(index, planned)| -> Box<dyn Step> {
            match planned {
                PlannedStep::Program { step, launcher } => {
                    let mut step = step
                        .with_launcher(launcher)
                        .with_cancellation(cancel.clone());
                    let log_path = step_log_path(&step, args.log.as_deref(), log_dir.as_deref());
                    if let Some(path) = log_path {
                        step = step.with_log_file(path);
                    }
                    if let Some(notifier) = bars.as_ref().and_then(|bars| bars.notifier(index)) {
                        step = step.with_notifier(notifier);
                    }
                    Box::new(step)
                }
                PlannedStep::LinkMetgrid(step) => Box::new(step),
            }
        })
        .collect();

    let (events_tx, mut events_rx) = mpsc::channel(64);
    let bars = bars.map(Arc::new);
    let bar_updates = bars.clone();
    let events_task = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            if let Some(bars) = &bar_updates {
                bars.apply(&event);
            }
        }
    });

    let (success, failure) = {
        let mut pipeline = Pipeline::new().with_events(events_tx);
        for step in steps.iter_mut() {
            pipeline.add_step(step.as_mut());
        }
        let success = pipeline.run_all().await;
        let failure = pipeline
            .current_description()
            .map(|name| (name.to_string(), pipeline.failure()));
        (success, failure)
    };

    events_task
        .await
        .map_err(|e| eyre!("Progress display task failed: {e}"))?;
    if let Some(bars) = &bars {
        bars.abandon_unfinished();
    }

    if success {
        println!("{}", "Success.".green());
    } else {
        println!("{}", "Failure.".red());
        if let Some((name, reason)) = failure {
            let reason = reason.unwrap_or_else(|| "no details reported".to_string());
            eprintln!("{} failed: {reason}", name.bold());
        }
    }

    Ok(success)
}

fn step_log_path(
    step: &ProgramStep,
    log: Option<&Path>,
    log_dir: Option<&Path>,
) -> Option<PathBuf> {
    log.map(Path::to_path_buf)
        .or_else(|| log_dir.map(|dir| dir.join(format!("{}.log", step.description()))))
}

/// Link GRIB files into the WPS directory.
pub async fn link_grib_files(wps_path: Option<&Path>, files: &[PathBuf]) -> Result<bool> {
    let system = load_system_config(None).await?;
    let wps_path = resolve_wps_path(&system, wps_path)?;

    let links = link_grib(&wps_path, files)?;
    println!("Linked {} files into {}", links.len(), wps_path.display());
    Ok(true)
}

/// Open a NAM dataset and describe it.
pub fn describe_nam_dataset(folder: &Path) -> Result<bool> {
    let dataset = NamDataset::open(folder)?;

    println!("Dataset opened");
    println!("Dataset folder:   {}", dataset.folder().display());
    println!("Dataset timestep: {} h", dataset.time_step().num_hours());
    println!("Dataset grid:     {NAM_GRID_SPACING_KM} km");
    if let (Some(start), Some(end)) = (dataset.start(), dataset.end()) {
        println!("Dataset start:    {start}");
        println!("Dataset end:      {end}");
    }
    println!("Dataset files:    {}", dataset.len());
    Ok(true)
}
