//! `namelist.input` generation for real.exe and wrf.exe.
//!
//! The grid entries mirror the `geogrid` section of `namelist.wps`; the run
//! window is applied last as a `time_control` patch.

use crate::config::ValidatedWpsConfig;
use crate::namelist::Namelist;
use chrono::{Datelike, NaiveDateTime, Timelike};

/// File name real.exe and wrf.exe read their configuration from.
pub const WRF_NAMELIST_FILE: &str = "namelist.input";

const BOUNDARY_WIDTH: u32 = 5;

/// `time_control` entries for a run from `start` to `end`, one value per
/// domain.
pub fn wrf_time_patch(start: NaiveDateTime, end: NaiveDateTime, domains: usize) -> Namelist {
    let mut patch = Namelist::new();
    let section = patch.section_mut("time_control");

    for (prefix, date) in [("start", start), ("end", end)] {
        let fields = [
            ("year", i64::from(date.year())),
            ("month", i64::from(date.month())),
            ("day", i64::from(date.day())),
            ("hour", i64::from(date.hour())),
            ("minute", i64::from(date.minute())),
            ("second", i64::from(date.second())),
        ];
        for (field, value) in fields {
            section.set(format!("{prefix}_{field}"), vec![value; domains]);
        }
    }

    patch
}

/// Build `time_control`, `domains` and `bdy_control` for the configured run.
pub fn wrf_namelist(validated: &ValidatedWpsConfig) -> Namelist {
    let config = validated.config();
    let domains = &config.domains;
    let count = domains.len();
    let settings = &config.wrf;
    let spacings = validated.grid_spacings();

    let mut namelist = Namelist::new();

    namelist
        .section_mut("time_control")
        .set("interval_seconds", config.interval)
        .set("input_from_file", vec![true; count])
        .set("history_interval", vec![settings.history_interval; count])
        .set("restart", false)
        .set("io_form_history", 2u32)
        .set("io_form_restart", 2u32)
        .set("io_form_input", 2u32)
        .set("io_form_boundary", 2u32);

    let grid = namelist.section_mut("domains");
    grid.set("time_step", validated.wrf_time_step())
        .set("max_dom", validated.domain_count())
        .set("e_we", domains.iter().map(|d| d.size[0]).collect::<Vec<_>>())
        .set("e_sn", domains.iter().map(|d| d.size[1]).collect::<Vec<_>>())
        .set("e_vert", vec![settings.vertical_levels; count]);
    if let Some(levels) = settings.metgrid_levels {
        grid.set("num_metgrid_levels", levels);
    }
    grid.set("dx", spacings.clone())
        .set("dy", spacings)
        .set("grid_id", (1..=validated.domain_count()).collect::<Vec<_>>())
        .set("parent_id", domains.iter().map(|d| d.parent_id).collect::<Vec<_>>())
        .set("i_parent_start", domains.iter().map(|d| d.parent_start[0]).collect::<Vec<_>>())
        .set("j_parent_start", domains.iter().map(|d| d.parent_start[1]).collect::<Vec<_>>())
        .set("parent_grid_ratio", domains.iter().map(|d| d.parent_ratio).collect::<Vec<_>>())
        .set(
            "parent_time_step_ratio",
            domains.iter().map(|d| d.parent_ratio).collect::<Vec<_>>(),
        );

    namelist
        .section_mut("bdy_control")
        .set("spec_bdy_width", BOUNDARY_WIDTH)
        .set("specified", (0..count).map(|i| i == 0).collect::<Vec<_>>())
        .set("nested", (0..count).map(|i| i > 0).collect::<Vec<_>>());

    namelist.merge(&wrf_time_patch(validated.start(), validated.end(), count));
    namelist
}
