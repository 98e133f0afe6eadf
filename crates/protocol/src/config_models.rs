//! Configuration models.
//!
//! This module defines the structured run configuration (read from JSON or
//! YAML) and the system settings that locate the WPS and WRF installations
//! (read from TOML).

use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;

/// One nest of the simulation grid.
///
/// # Example
///
/// ```json
/// {
///   "parent_id": 1,
///   "parent_ratio": 1,
///   "parent_start": [1, 1],
///   "size": [74, 61],
///   "step_size": [30000, 30000]
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Domain {
    /// 1-based index of the parent nest. The outermost domain is its own
    /// parent (`1`).
    pub parent_id: u32,

    /// Grid refinement ratio relative to the parent.
    pub parent_ratio: u32,

    /// Lower-left corner of the nest in parent grid coordinates (i, j).
    pub parent_start: [u32; 2],

    /// Grid size (west-east, south-north).
    pub size: [u32; 2],

    /// Grid spacing in metres (dx, dy). Only the first domain carries it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_size: Option<[f64; 2]>,
}

/// Map projection of the outermost domain.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Projection {
    /// Projection name as understood by geogrid (e.g. `lambert`).
    #[serde(rename = "type")]
    pub kind: String,

    /// Reference point (latitude, longitude).
    pub ref_location: [f64; 2],

    /// True latitudes.
    pub truelat: [f64; 2],

    /// Standard longitude.
    #[serde(alias = "stand_lot")]
    pub stand_lon: f64,
}

/// WRF model settings not covered by the WPS part of the configuration.
///
/// # Example
///
/// ```yaml
/// wrf:
///   vertical_levels: 35
///   metgrid_levels: 40
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WrfSettings {
    /// Number of vertical levels (`e_vert`).
    #[serde(default = "default_vertical_levels")]
    pub vertical_levels: u32,

    /// Vertical levels in the metgrid output (`num_metgrid_levels`). Left
    /// to WRF when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metgrid_levels: Option<u32>,

    /// Model time step in seconds. Defaults to six times the outer grid
    /// spacing in kilometres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_step: Option<u32>,

    /// Output interval in minutes.
    #[serde(default = "default_history_interval")]
    pub history_interval: u32,
}

fn default_vertical_levels() -> u32 {
    35
}

fn default_history_interval() -> u32 {
    60
}

impl Default for WrfSettings {
    fn default() -> Self {
        Self {
            vertical_levels: default_vertical_levels(),
            metgrid_levels: None,
            time_step: None,
            history_interval: default_history_interval(),
        }
    }
}

/// Structured configuration for one run: WPS preprocessing followed by
/// real and wrf.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WpsConfig {
    /// Nests, outermost first.
    pub domains: Vec<Domain>,

    pub projection: Projection,

    /// Path to the static geographical data.
    pub data_path: String,

    /// Simulation start, e.g. `2016-01-01 00:00:00`.
    pub start_date: String,

    /// Simulation end.
    pub end_date: String,

    /// Interval between input files, in seconds.
    pub interval: u32,

    /// File prefix for ungrib intermediate output.
    pub prefix: String,

    #[serde(default)]
    pub wrf: WrfSettings,
}

/// Settings describing where the WPS and WRF installs live and how to
/// launch their programs.
///
/// # Example
///
/// ```toml
/// wps_path = "/opt/WPS"
/// wrf_path = "/opt/WRF/run"
/// log_dir = "/var/log/wrf-runner"
/// wrf_processes = 8
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemConfig {
    /// Working directory of the WPS programs. The executables and the
    /// namelist live here.
    #[serde(default)]
    pub wps_path: Option<PathBuf>,

    /// Directory that receives one log file per program.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Command prefix used to start each WPS executable.
    #[serde(default)]
    pub launcher: Vec<String>,

    /// Working directory of real.exe and wrf.exe.
    #[serde(default)]
    pub wrf_path: Option<PathBuf>,

    /// Command prefix for real.exe and wrf.exe. Defaults to
    /// `mpirun -n <processes>`.
    #[serde(default)]
    pub wrf_launcher: Vec<String>,

    /// MPI processes for wrf.exe. real.exe always runs on one.
    #[serde(default)]
    pub wrf_processes: Option<u32>,
}
