//! wrf-runner
//!
//! Usage:
//!     wrf-runner generate wps-namelist wps.json
//!     wrf-runner run wps wps.json --system-config system.toml
//!     wrf-runner run all wps.json --system-config system.toml

mod commands;
mod logging;
mod progress;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "wrf-runner", version, about = "Run the WPS programs and the WRF model")]
struct Cli {
    /// Log debug output, including every program output line
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate configuration files
    Generate {
        #[command(subcommand)]
        target: GenerateTarget,
    },

    /// Run WPS or WRF programs
    Run(RunArgs),

    /// Link GRIB files as GRIBFILE.AAA, GRIBFILE.AAB, ... in the WPS directory
    LinkGrib {
        /// WPS directory (defaults to the WPS_PATH environment variable)
        #[arg(long)]
        wps_path: Option<PathBuf>,

        /// GRIB files to link
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Inspect input datasets
    Dataset {
        #[command(subcommand)]
        kind: DatasetKind,
    },
}

#[derive(Subcommand, Debug)]
enum GenerateTarget {
    /// Print the namelist.wps generated from a configuration file
    WpsNamelist {
        /// WPS configuration (.json, .yaml or .yml)
        config: PathBuf,

        /// Print the full error chain on failure
        #[arg(long)]
        debug: bool,
    },
}

#[derive(Subcommand, Debug)]
enum DatasetKind {
    /// NAM 218 GRIB2 files
    Nam {
        /// Folder holding nam_218_*.grb2 files
        folder: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Program {
    Geogrid,
    Ungrib,
    Metgrid,
    /// geogrid, ungrib and metgrid in order
    Wps,
    Real,
    Wrf,
    /// The WPS programs, then real and wrf on the metgrid output
    All,
}

impl Program {
    pub fn uses_wps(self) -> bool {
        !matches!(self, Program::Real | Program::Wrf)
    }

    pub fn uses_wrf(self) -> bool {
        matches!(self, Program::Real | Program::Wrf | Program::All)
    }
}

#[derive(Args, Debug)]
pub(crate) struct RunArgs {
    /// Program to run
    #[arg(value_enum)]
    pub program: Program,

    /// WPS configuration (.json, .yaml or .yml)
    pub config: PathBuf,

    /// System configuration (TOML) locating the WPS and WRF installs
    #[arg(long)]
    pub system_config: Option<PathBuf>,

    /// WPS directory, overriding the system configuration
    #[arg(long)]
    pub wps_path: Option<PathBuf>,

    /// WRF run directory, overriding the system configuration
    #[arg(long)]
    pub wrf_path: Option<PathBuf>,

    /// Append the output of every program to this file
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Hide the progress bars
    #[arg(long)]
    pub no_progress: bool,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let success = match cli.command {
        Command::Generate {
            target: GenerateTarget::WpsNamelist { config, debug },
        } => commands::generate_wps_namelist(&config, debug).await?,
        Command::Run(args) => {
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupted, stopping the running program");
                    on_interrupt.cancel();
                }
            });
            commands::run(args, cancel).await?
        }
        Command::LinkGrib { wps_path, files } => {
            commands::link_grib_files(wps_path.as_deref(), &files).await?
        }
        Command::Dataset {
            kind: DatasetKind::Nam { folder },
        } => commands::describe_nam_dataset(&folder)?,
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}
